//! Pipeline orchestrator — sequences the analysis stages, owns the
//! retry/timeout/partial-failure policy, and is the sole entry point
//! used by the API boundary.

use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::report::AnalysisReport;
use crate::analysis::{deterministic, hybrid, report, semantic, structuring};
use crate::config::AnalyzerConfig;
use crate::errors::{PipelineFailure, StageError};
use crate::llm_client::{CompletionClient, LlmClient};

/// Pipeline execution states. Strictly sequential: no stage begins
/// before its predecessor's output is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    StructuringJob,
    StructuringCv,
    ScoringDeterministic,
    ScoringSemantic,
    Combining,
    Synthesizing,
    Complete,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::StructuringJob => "structuring_job",
            PipelineStage::StructuringCv => "structuring_cv",
            PipelineStage::ScoringDeterministic => "scoring_deterministic",
            PipelineStage::ScoringSemantic => "scoring_semantic",
            PipelineStage::Combining => "combining",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// The analysis pipeline. Cheap to clone; holds no per-request
/// state, so distinct requests may run concurrently on one instance.
#[derive(Clone)]
pub struct Pipeline {
    client: Arc<dyn CompletionClient>,
    config: AnalyzerConfig,
}

impl Pipeline {
    /// Builds a pipeline backed by the production completion client.
    pub fn new(config: AnalyzerConfig) -> Self {
        let client = Arc::new(LlmClient::new(config.anthropic_api_key.clone()));
        Self::with_client(config, client)
    }

    /// Builds a pipeline with an injected completion client (fakes
    /// in tests, instrumented clients in production).
    pub fn with_client(config: AnalyzerConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self { client, config }
    }

    /// Runs the full analysis under the overall pipeline deadline.
    ///
    /// Every exit path is structured: a complete report, a degraded
    /// report (scores present, recommendations empty, warning set),
    /// or a [`PipelineFailure`] naming the stage that failed.
    pub async fn run(
        &self,
        cv_text: &str,
        job_text: &str,
    ) -> Result<AnalysisReport, PipelineFailure> {
        let correlation_id = Uuid::new_v4();
        let stage = Mutex::new(PipelineStage::Idle);

        info!(%correlation_id, "starting analysis pipeline");

        let outcome = tokio::time::timeout(
            self.config.pipeline_deadline,
            self.run_stages(cv_text, job_text, correlation_id, &stage),
        )
        .await;

        match outcome {
            Ok(Ok(report)) => Ok(report),
            Ok(Err((failed_stage, e))) => {
                error!(%correlation_id, stage = %failed_stage, error = %e, "pipeline aborted");
                Err(PipelineFailure::new(failed_stage, &e, correlation_id))
            }
            // Deadline expiry drops the in-flight stage future; any
            // completion result it was waiting on is discarded.
            Err(_) => {
                let failed_stage = *stage.lock().expect("stage lock");
                let e = StageError::Timeout(self.config.pipeline_deadline.as_secs());
                error!(%correlation_id, stage = %failed_stage, "pipeline deadline exceeded");
                Err(PipelineFailure::new(failed_stage, &e, correlation_id))
            }
        }
    }

    async fn run_stages(
        &self,
        cv_text: &str,
        job_text: &str,
        correlation_id: Uuid,
        stage: &Mutex<PipelineStage>,
    ) -> Result<AnalysisReport, (PipelineStage, StageError)> {
        let client = self.client.as_ref();
        let retry = &self.config.retry;
        let call_timeout = self.config.call_timeout;
        let weights = &self.config.weights;
        let enter = |s: PipelineStage| {
            *stage.lock().expect("stage lock") = s;
            info!(%correlation_id, stage = %s, "entering stage");
            s
        };

        let current = enter(PipelineStage::StructuringJob);
        let job = structuring::parse_job(client, retry, call_timeout, job_text)
            .await
            .map_err(|e| (current, e))?;

        let current = enter(PipelineStage::StructuringCv);
        let candidate = structuring::parse_cv(client, retry, call_timeout, cv_text)
            .await
            .map_err(|e| (current, e))?;

        enter(PipelineStage::ScoringDeterministic);
        let baseline = deterministic::score(&job, &candidate, weights);

        let current = enter(PipelineStage::ScoringSemantic);
        let semantic_score = semantic::validate(
            client, retry, call_timeout, job_text, cv_text, &baseline, weights,
        )
        .await
        .map_err(|e| (current, e))?;

        enter(PipelineStage::Combining);
        let strengths = hybrid::compile_strengths(&baseline, &semantic_score);
        let gaps = hybrid::compile_gaps(&baseline, &semantic_score);
        let score = hybrid::combine(baseline, semantic_score, weights);

        enter(PipelineStage::Synthesizing);
        let (summary, recommendations, warnings) =
            match report::synthesize(client, retry, call_timeout, &score, &job, &candidate).await {
                Ok(payload) => (payload.summary, payload.recommendations, Vec::new()),
                // Non-fatal: degrade to a numeric-only result.
                Err(e) => {
                    warn!(%correlation_id, error = %e, "recommendation synthesis failed, degrading");
                    (
                        report::fallback_summary(&score),
                        Vec::new(),
                        vec![format!("recommendation synthesis failed: {e}")],
                    )
                }
            };

        enter(PipelineStage::Complete);
        info!(
            %correlation_id,
            final_score = score.final_score,
            grade = %score.grade,
            "pipeline complete"
        );

        Ok(AnalysisReport {
            correlation_id,
            generated_at: Utc::now(),
            score,
            summary,
            strengths,
            gaps,
            recommendations,
            warnings,
        })
    }
}

/// Content fingerprint of an input pair, usable as a key for an
/// optional caller-side result cache. Stable for the life of the
/// process; not a cryptographic digest.
pub fn fingerprint(cv_text: &str, job_text: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    cv_text.hash(&mut hasher);
    job_text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::analysis::hybrid::Grade;
    use crate::llm_client::fake::{transport_failure, ScriptedClient};
    use crate::llm_client::LlmError;

    const JOB_TEXT: &str = "Senior Backend Engineer. Requires Python, FastAPI, Azure, Docker. 5+ years.";
    const CV_TEXT: &str = "Jane Doe. 6 years building Python and FastAPI services on AWS and Kubernetes.";

    const JOB_JSON: &str = r#"{
        "job_title": "Senior Backend Engineer",
        "required_skills": ["python", "fastapi", "azure", "docker"],
        "preferred_skills": [],
        "required_years": 5,
        "role_type": "senior"
    }"#;

    const CV_JSON: &str = r#"{
        "candidate_name": "Jane Doe",
        "skills": ["python", "fastapi", "aws", "kubernetes"],
        "years_experience": 6.0
    }"#;

    const SEMANTIC_JSON: &str = r#"{
        "semantic_match_percent": 80.0,
        "soft_skills_match_percent": 80.0,
        "reasoning": "AWS and Kubernetes experience transfers to the Azure/Docker stack",
        "transferable_skills": ["aws", "kubernetes"],
        "cultural_fit_notes": "clear communicator"
    }"#;

    const REPORT_JSON: &str = r#"{
        "summary": "Solid backend match with a cloud-platform gap.",
        "recommendations": [
            {"category": "add", "priority": "high", "description": "Add Azure exposure", "rationale": "Required skill"},
            {"category": "add", "priority": "high", "description": "Add Docker projects", "rationale": "Required skill"},
            {"category": "emphasize", "priority": "medium", "description": "Lead with FastAPI services", "rationale": "Core requirement"},
            {"category": "modify", "priority": "medium", "description": "Quantify service scale", "rationale": "Stronger evidence"},
            {"category": "remove", "priority": "low", "description": "Trim unrelated detail", "rationale": "Focus"}
        ]
    }"#;

    fn pipeline(client: ScriptedClient) -> Pipeline {
        Pipeline::with_client(AnalyzerConfig::new("test-key".into()), Arc::new(client))
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_produces_full_report() {
        let client = ScriptedClient::new(vec![
            Ok(JOB_JSON.to_string()),
            Ok(CV_JSON.to_string()),
            Ok(SEMANTIC_JSON.to_string()),
            Ok(REPORT_JSON.to_string()),
        ]);
        let report = pipeline(client).run(CV_TEXT, JOB_TEXT).await.unwrap();

        // det: 50.0 * 0.667 + 100.0 * 0.333 = 66.65
        // sem: 80.0 * 0.625 + 80.0 * 0.375 = 80.0
        // final: 66.65 * 0.60 + 80.0 * 0.40 = 71.99
        assert_eq!(report.score.deterministic_component.total_score, 66.65);
        assert_eq!(report.score.semantic_component.total_score, 80.0);
        assert_eq!(report.score.final_score, 71.99);
        assert_eq!(report.score.grade, Grade::C);
        assert_eq!(report.recommendations.len(), 5);
        assert!(report.warnings.is_empty());
        assert!(!report.strengths.is_empty());
        assert!(report.gaps[0].contains("azure"));
    }

    #[tokio::test(start_paused = true)]
    async fn synthesis_failure_degrades_to_numeric_result() {
        let client = ScriptedClient::new(vec![
            Ok(JOB_JSON.to_string()),
            Ok(CV_JSON.to_string()),
            Ok(SEMANTIC_JSON.to_string()),
            transport_failure(),
            transport_failure(),
        ]);
        let report = pipeline(client).run(CV_TEXT, JOB_TEXT).await.unwrap();

        assert_eq!(report.score.final_score, 71.99);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("recommendation synthesis failed"));
        assert_eq!(
            report.summary,
            "Candidate scored 71.99/100 with grade C."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn structuring_failure_is_fatal_and_names_the_stage() {
        let client = ScriptedClient::new(vec![
            Ok("not json".to_string()),
            Ok("still not json".to_string()),
        ]);
        let failure = pipeline(client).run(CV_TEXT, JOB_TEXT).await.unwrap_err();

        assert_eq!(failure.stage, PipelineStage::StructuringJob);
        assert!(failure.reason.contains("parse error"));
    }

    #[tokio::test(start_paused = true)]
    async fn semantic_failure_is_fatal_and_names_the_stage() {
        let client = ScriptedClient::new(vec![
            Ok(JOB_JSON.to_string()),
            Ok(CV_JSON.to_string()),
            Err(LlmError::EmptyContent),
            Err(LlmError::EmptyContent),
        ]);
        let failure = pipeline(client).run(CV_TEXT, JOB_TEXT).await.unwrap_err();

        assert_eq!(failure.stage, PipelineStage::ScoringSemantic);
        assert!(failure.reason.contains("validation error"));
    }

    struct HangingClient;

    #[async_trait]
    impl CompletionClient for HangingClient {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_deadline_unwinds_with_stage_context() {
        let mut config = AnalyzerConfig::new("test-key".into());
        // Per-call budget larger than the pipeline deadline so the
        // overall deadline is the one that fires.
        config.call_timeout = Duration::from_secs(60);
        config.pipeline_deadline = Duration::from_secs(5);
        let pipeline = Pipeline::with_client(config, Arc::new(HangingClient));

        let failure = pipeline.run(CV_TEXT, JOB_TEXT).await.unwrap_err();
        assert_eq!(failure.stage, PipelineStage::StructuringJob);
        assert!(failure.reason.contains("deadline"));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_runs_are_independent() {
        let strong = pipeline(ScriptedClient::new(vec![
            Ok(JOB_JSON.to_string()),
            Ok(CV_JSON.to_string()),
            Ok(SEMANTIC_JSON.to_string()),
            Ok(REPORT_JSON.to_string()),
        ]));
        let weak_semantic = r#"{
            "semantic_match_percent": 20.0,
            "soft_skills_match_percent": 20.0,
            "reasoning": "little overlap",
            "transferable_skills": [],
            "cultural_fit_notes": ""
        }"#;
        let weak = pipeline(ScriptedClient::new(vec![
            Ok(JOB_JSON.to_string()),
            Ok(CV_JSON.to_string()),
            Ok(weak_semantic.to_string()),
            Ok(REPORT_JSON.to_string()),
        ]));

        let (a, b) = tokio::join!(
            strong.run(CV_TEXT, JOB_TEXT),
            weak.run("Different CV. 6 years Python.", "Different job. Python required.")
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.score.final_score, 71.99);
        // weak sem total = 20.0; final = 66.65 * 0.6 + 20.0 * 0.4 = 47.99
        assert_eq!(b.score.final_score, 47.99);
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn fingerprint_is_stable_and_input_sensitive() {
        assert_eq!(fingerprint("cv", "job"), fingerprint("cv", "job"));
        assert_ne!(fingerprint("cv", "job"), fingerprint("cv2", "job"));
        // Field boundaries matter: ("ab","c") is not ("a","bc").
        assert_ne!(fingerprint("ab", "c"), fingerprint("a", "bc"));
    }
}
