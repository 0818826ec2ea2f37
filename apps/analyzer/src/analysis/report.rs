//! Recommendation synthesizer and the final analysis report.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::hybrid::HybridScore;
use crate::analysis::prompts::{REPORT_PROMPT_TEMPLATE, REPORT_SYSTEM};
use crate::analysis::structuring::{CandidateProfile, JobRequirements};
use crate::analysis::timed_completion;
use crate::errors::StageError;
use crate::llm_client::{parse_json_payload, CompletionClient};
use crate::retry::{call_with_retry, RetryPolicy};

/// Minimum recommendations a full report should carry. Fewer is
/// logged, not failed (per agreed behavior).
const MIN_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Add,
    Remove,
    Modify,
    Emphasize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// One actionable CV-improvement recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: RecommendationPriority,
    pub description: String,
    pub rationale: String,
}

/// Completion payload for the synthesis stage.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportPayload {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// The finished analysis returned to the API boundary.
///
/// `warnings` is non-empty exactly when the pipeline degraded to a
/// numeric-only result (recommendation synthesis failed).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub correlation_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub score: HybridScore,
    pub summary: String,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<String>,
}

/// Asks the completion capability for an executive summary and
/// categorized recommendations. Exhausting the retry budget yields
/// [`StageError::Generation`] — the orchestrator treats that as
/// non-fatal.
pub async fn synthesize(
    client: &dyn CompletionClient,
    retry: &RetryPolicy,
    call_timeout: Duration,
    score: &HybridScore,
    job: &JobRequirements,
    candidate: &CandidateProfile,
) -> Result<ReportPayload, StageError> {
    let prompt = build_prompt(score, job, candidate);

    let payload = call_with_retry(retry, "synthesizing", || async {
        let text = timed_completion(client, call_timeout, REPORT_SYSTEM, &prompt).await?;
        parse_json_payload::<ReportPayload>(&text)
            .map_err(|e| StageError::NonConforming(e.to_string()))
    })
    .await
    .map_err(as_generation_error)?;

    if payload.recommendations.len() < MIN_RECOMMENDATIONS {
        warn!(
            count = payload.recommendations.len(),
            expected = MIN_RECOMMENDATIONS,
            "fewer recommendations than expected"
        );
    }
    info!(
        recommendations = payload.recommendations.len(),
        "report synthesized"
    );
    Ok(payload)
}

/// Fallback summary for a degraded, numeric-only report.
pub fn fallback_summary(score: &HybridScore) -> String {
    format!(
        "Candidate scored {}/100 with grade {}.",
        score.final_score, score.grade
    )
}

fn build_prompt(score: &HybridScore, job: &JobRequirements, candidate: &CandidateProfile) -> String {
    let det = &score.deterministic_component;
    let sem = &score.semantic_component;

    REPORT_PROMPT_TEMPLATE
        .replace("{final_score}", &score.final_score.to_string())
        .replace("{grade}", &score.grade.to_string())
        .replace("{skill_match}", &det.skill_match_percent.to_string())
        .replace("{missing_skills}", &det.missing_skills.join(", "))
        .replace("{semantic_match}", &sem.semantic_match_percent.to_string())
        .replace("{reasoning}", &sem.reasoning)
        .replace("{job_title}", job.job_title.as_deref().unwrap_or("unknown"))
        .replace(
            "{required_skills}",
            &job.required_skills
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        )
        .replace("{required_years}", &job.required_years.to_string())
        .replace("{role_type}", &job.role_type.to_string())
        .replace(
            "{candidate_years}",
            &candidate.years_experience.to_string(),
        )
        .replace(
            "{candidate_skills}",
            &candidate
                .skills
                .iter()
                .take(10)
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        )
}

fn as_generation_error(e: StageError) -> StageError {
    if e.is_retryable() {
        StageError::Generation(e.to_string())
    } else {
        e
    }
}
