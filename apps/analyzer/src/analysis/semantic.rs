//! Semantic validator — completion-backed judgment of skill
//! transferability and soft-skill fit, grounded in the deterministic
//! baseline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::deterministic::{round2, DeterministicScore};
use crate::analysis::prompts::{SEMANTIC_PROMPT_TEMPLATE, SEMANTIC_SYSTEM};
use crate::analysis::timed_completion;
use crate::config::ScoreWeights;
use crate::errors::StageError;
use crate::llm_client::{parse_json_payload, CompletionClient};
use crate::retry::{call_with_retry, RetryPolicy};

/// Semantic-model score over the same [0,100] scale as the
/// deterministic baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticScore {
    pub semantic_match_percent: f64,
    pub soft_skills_match_percent: f64,
    /// `semantic * 0.625 + soft_skills * 0.375`, 2-decimal rounded.
    pub total_score: f64,
    pub reasoning: String,
    pub transferable_skills: Vec<String>,
    pub cultural_fit_notes: String,
}

#[derive(Debug, Deserialize)]
struct SemanticPayload {
    semantic_match_percent: f64,
    soft_skills_match_percent: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    transferable_skills: Vec<String>,
    #[serde(default)]
    cultural_fit_notes: String,
}

impl SemanticPayload {
    /// Percent fields outside [0,100] are non-conforming output, not
    /// something to silently clamp.
    fn check_ranges(&self) -> Result<(), StageError> {
        for (name, value) in [
            ("semantic_match_percent", self.semantic_match_percent),
            ("soft_skills_match_percent", self.soft_skills_match_percent),
        ] {
            if !(0.0..=100.0).contains(&value) || !value.is_finite() {
                return Err(StageError::NonConforming(format!(
                    "{name} out of range: {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Runs semantic validation against both raw texts plus the
/// deterministic baseline. Exhausting the retry budget yields
/// [`StageError::Validation`], except call-deadline overruns which
/// stay [`StageError::Timeout`].
pub async fn validate(
    client: &dyn CompletionClient,
    retry: &RetryPolicy,
    call_timeout: Duration,
    job_text: &str,
    cv_text: &str,
    baseline: &DeterministicScore,
    weights: &ScoreWeights,
) -> Result<SemanticScore, StageError> {
    let prompt = build_prompt(job_text, cv_text, baseline);

    let payload = call_with_retry(retry, "scoring_semantic", || async {
        let text = timed_completion(client, call_timeout, SEMANTIC_SYSTEM, &prompt).await?;
        let payload = parse_json_payload::<SemanticPayload>(&text)
            .map_err(|e| StageError::NonConforming(e.to_string()))?;
        payload.check_ranges()?;
        Ok(payload)
    })
    .await
    .map_err(as_validation_error)?;

    let total = payload.semantic_match_percent * weights.semantic_match
        + payload.soft_skills_match_percent * weights.soft_skills;

    let score = SemanticScore {
        semantic_match_percent: round2(payload.semantic_match_percent),
        soft_skills_match_percent: round2(payload.soft_skills_match_percent),
        total_score: round2(total),
        reasoning: payload.reasoning,
        transferable_skills: payload.transferable_skills,
        cultural_fit_notes: payload.cultural_fit_notes,
    };

    info!(
        semantic_match = score.semantic_match_percent,
        soft_skills = score.soft_skills_match_percent,
        total = score.total_score,
        "semantic validation complete"
    );
    Ok(score)
}

fn build_prompt(job_text: &str, cv_text: &str, baseline: &DeterministicScore) -> String {
    SEMANTIC_PROMPT_TEMPLATE
        .replace("{skill_match}", &baseline.skill_match_percent.to_string())
        .replace("{matched_skills}", &join_or_none(&baseline.matched_skills))
        .replace("{missing_skills}", &join_or_none(&baseline.missing_skills))
        .replace(
            "{experience_alignment}",
            &baseline.experience_alignment_percent.to_string(),
        )
        .replace("{job_text}", job_text)
        .replace("{cv_text}", cv_text)
}

fn join_or_none(skills: &[String]) -> String {
    if skills.is_empty() {
        "None".to_string()
    } else {
        skills.join(", ")
    }
}

/// Terminal reclassification: timeouts keep their identity, other
/// spent retryables become `Validation`.
fn as_validation_error(e: StageError) -> StageError {
    match e {
        StageError::Timeout(_) => e,
        e if e.is_retryable() => StageError::Validation(e.to_string()),
        e => e,
    }
}
