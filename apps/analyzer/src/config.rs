use std::time::Duration;

use anyhow::{Context, Result};

use crate::retry::RetryPolicy;

/// Scoring weights. Defaults match the agreed hybrid model:
/// 60% deterministic / 40% semantic, with skill vs experience split
/// 0.667/0.333 inside the deterministic bucket and semantic vs soft
/// skills split 0.625/0.375 inside the semantic bucket.
///
/// Subject to future tuning — callers may override, but the defaults
/// are the contract.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub deterministic: f64,
    pub semantic: f64,
    pub skill_match: f64,
    pub experience_alignment: f64,
    pub semantic_match: f64,
    pub soft_skills: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            deterministic: 0.60,
            semantic: 0.40,
            skill_match: 0.667,
            experience_alignment: 0.333,
            semantic_match: 0.625,
            soft_skills: 0.375,
        }
    }
}

/// Pipeline configuration, passed explicitly into [`crate::Pipeline`]
/// at construction time. No ambient global state.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub anthropic_api_key: String,
    /// Deadline for a single completion call attempt.
    pub call_timeout: Duration,
    /// End-to-end deadline for one `run()` invocation.
    pub pipeline_deadline: Duration,
    pub retry: RetryPolicy,
    pub weights: ScoreWeights,
}

impl AnalyzerConfig {
    pub fn new(anthropic_api_key: String) -> Self {
        Self {
            anthropic_api_key,
            call_timeout: Duration::from_secs(20),
            pipeline_deadline: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            weights: ScoreWeights::default(),
        }
    }

    /// Loads configuration from environment variables (reading `.env`
    /// if present). Errors on a missing API key; timeouts fall back
    /// to the defaults above.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::new(require_env("ANTHROPIC_API_KEY")?);

        if let Ok(secs) = std::env::var("ANALYZER_CALL_TIMEOUT_SECS") {
            config.call_timeout = Duration::from_secs(
                secs.parse::<u64>()
                    .context("ANALYZER_CALL_TIMEOUT_SECS must be a number of seconds")?,
            );
        }
        if let Ok(secs) = std::env::var("ANALYZER_PIPELINE_DEADLINE_SECS") {
            config.pipeline_deadline = Duration::from_secs(
                secs.parse::<u64>()
                    .context("ANALYZER_PIPELINE_DEADLINE_SECS must be a number of seconds")?,
            );
        }

        Ok(config)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
