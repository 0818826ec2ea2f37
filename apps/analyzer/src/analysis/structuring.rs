//! Structuring stage — turns raw job/CV text into normalized
//! structured records via the completion capability.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::prompts::{
    CV_PARSE_PROMPT_TEMPLATE, CV_PARSE_SYSTEM, JOB_PARSE_PROMPT_TEMPLATE, JOB_PARSE_SYSTEM,
};
use crate::analysis::timed_completion;
use crate::errors::StageError;
use crate::llm_client::{parse_json_payload, CompletionClient};
use crate::retry::{call_with_retry, RetryPolicy};

/// Maximum accepted CV length in characters.
pub const CV_TEXT_MAX: usize = 50_000;
/// Maximum accepted job description length in characters.
pub const JOB_TEXT_MAX: usize = 10_000;

/// Seniority level extracted from the job description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Entry,
    Senior,
    Lead,
    Principal,
    // Last on purpose: the serde derive only accepts `other` there.
    #[default]
    #[serde(other)]
    Mid,
}

impl std::fmt::Display for RoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoleType::Entry => "entry",
            RoleType::Mid => "mid",
            RoleType::Senior => "senior",
            RoleType::Lead => "lead",
            RoleType::Principal => "principal",
        };
        f.write_str(s)
    }
}

/// Normalized job requirements. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequirements {
    pub job_title: Option<String>,
    /// Canonical lower-case, trimmed skill names. Downstream set
    /// intersection depends on this normalization.
    pub required_skills: BTreeSet<String>,
    pub preferred_skills: BTreeSet<String>,
    pub required_years: u32,
    pub role_type: RoleType,
}

/// Normalized candidate profile. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateProfile {
    pub candidate_name: Option<String>,
    pub skills: BTreeSet<String>,
    pub years_experience: f64,
}

// Raw completion payloads. Missing optional fields default to empty
// rather than failing the parse.

#[derive(Debug, Deserialize)]
struct JobPayload {
    #[serde(default)]
    job_title: Option<String>,
    #[serde(default)]
    required_skills: Vec<String>,
    #[serde(default)]
    preferred_skills: Vec<String>,
    #[serde(default)]
    required_years: Option<f64>,
    #[serde(default)]
    role_type: RoleType,
}

#[derive(Debug, Deserialize)]
struct CvPayload {
    #[serde(default)]
    candidate_name: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    years_experience: Option<f64>,
}

impl JobPayload {
    fn normalize(self) -> JobRequirements {
        JobRequirements {
            job_title: self.job_title,
            required_skills: normalize_skills(self.required_skills),
            preferred_skills: normalize_skills(self.preferred_skills),
            required_years: self.required_years.unwrap_or(0.0).max(0.0).round() as u32,
            role_type: self.role_type,
        }
    }
}

impl CvPayload {
    fn normalize(self) -> CandidateProfile {
        CandidateProfile {
            candidate_name: self.candidate_name,
            skills: normalize_skills(self.skills),
            years_experience: self.years_experience.unwrap_or(0.0).max(0.0),
        }
    }
}

/// Canonical skill form: lower-case, whitespace-trimmed, empties dropped.
fn normalize_skills(skills: Vec<String>) -> BTreeSet<String> {
    skills
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Structures a raw job description into [`JobRequirements`].
/// Exactly one completion call per attempt; exhausting the retry
/// budget yields [`StageError::Parse`].
pub async fn parse_job(
    client: &dyn CompletionClient,
    retry: &RetryPolicy,
    call_timeout: Duration,
    job_text: &str,
) -> Result<JobRequirements, StageError> {
    check_input_length("job description", job_text, JOB_TEXT_MAX)?;

    let prompt = JOB_PARSE_PROMPT_TEMPLATE.replace("{job_text}", job_text);
    let payload = call_with_retry(retry, "structuring_job", || async {
        let text = timed_completion(client, call_timeout, JOB_PARSE_SYSTEM, &prompt).await?;
        parse_json_payload::<JobPayload>(&text)
            .map_err(|e| StageError::NonConforming(e.to_string()))
    })
    .await
    .map_err(as_parse_error)?;

    let requirements = payload.normalize();
    info!(
        title = requirements.job_title.as_deref().unwrap_or("unknown"),
        required_skills = requirements.required_skills.len(),
        required_years = requirements.required_years,
        "job description structured"
    );
    Ok(requirements)
}

/// Structures a raw CV into a [`CandidateProfile`].
/// Exactly one completion call per attempt; exhausting the retry
/// budget yields [`StageError::Parse`].
pub async fn parse_cv(
    client: &dyn CompletionClient,
    retry: &RetryPolicy,
    call_timeout: Duration,
    cv_text: &str,
) -> Result<CandidateProfile, StageError> {
    check_input_length("CV", cv_text, CV_TEXT_MAX)?;

    let prompt = CV_PARSE_PROMPT_TEMPLATE.replace("{cv_text}", cv_text);
    let payload = call_with_retry(retry, "structuring_cv", || async {
        let text = timed_completion(client, call_timeout, CV_PARSE_SYSTEM, &prompt).await?;
        parse_json_payload::<CvPayload>(&text).map_err(|e| StageError::NonConforming(e.to_string()))
    })
    .await
    .map_err(as_parse_error)?;

    let profile = payload.normalize();
    info!(
        candidate = profile.candidate_name.as_deref().unwrap_or("unknown"),
        skills = profile.skills.len(),
        years_experience = profile.years_experience,
        "CV structured"
    );
    Ok(profile)
}

fn check_input_length(label: &str, text: &str, max: usize) -> Result<(), StageError> {
    if text.trim().is_empty() {
        return Err(StageError::Parse(format!("{label} text is empty")));
    }
    // The caps are character counts; byte length only short-circuits
    // (a char is at most 4 bytes, so <= max bytes can't exceed it).
    if text.len() <= max {
        return Ok(());
    }
    let chars = text.chars().count();
    if chars > max {
        return Err(StageError::Parse(format!(
            "{label} text exceeds {max} characters ({chars} given)"
        )));
    }
    Ok(())
}

/// Terminal reclassification for this stage: a spent retry budget
/// surfaces as `Parse`, everything else passes through unchanged.
fn as_parse_error(e: StageError) -> StageError {
    if e.is_retryable() {
        StageError::Parse(e.to_string())
    } else {
        e
    }
}
