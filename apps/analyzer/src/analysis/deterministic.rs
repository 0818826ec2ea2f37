//! Deterministic scorer — pure keyword/experience comparison. No
//! I/O, bit-identical output for identical input.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::analysis::structuring::{CandidateProfile, JobRequirements};
use crate::config::ScoreWeights;

/// Rule-based baseline score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeterministicScore {
    pub skill_match_percent: f64,
    pub experience_alignment_percent: f64,
    /// `skill_match * 0.667 + experience_alignment * 0.333`, 2-decimal rounded.
    pub total_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub experience_gaps: BTreeMap<String, String>,
}

/// Scores the candidate against the job requirements.
pub fn score(
    job: &JobRequirements,
    candidate: &CandidateProfile,
    weights: &ScoreWeights,
) -> DeterministicScore {
    let (skill_match, matched, missing) = skill_match(job, candidate);
    let (alignment, gaps) =
        experience_alignment(job.required_years, candidate.years_experience);

    let total = skill_match * weights.skill_match + alignment * weights.experience_alignment;

    debug!(
        skill_match,
        experience_alignment = alignment,
        total,
        "deterministic score computed"
    );

    DeterministicScore {
        skill_match_percent: round2(skill_match),
        experience_alignment_percent: round2(alignment),
        total_score: round2(total),
        matched_skills: matched,
        missing_skills: missing,
        experience_gaps: gaps,
    }
}

/// Exact-set skill match over normalized names. An empty required
/// set counts as a full match.
fn skill_match(
    job: &JobRequirements,
    candidate: &CandidateProfile,
) -> (f64, Vec<String>, Vec<String>) {
    if job.required_skills.is_empty() {
        return (100.0, Vec::new(), Vec::new());
    }

    let matched: Vec<String> = job
        .required_skills
        .intersection(&candidate.skills)
        .cloned()
        .collect();
    let missing: Vec<String> = job
        .required_skills
        .difference(&candidate.skills)
        .cloned()
        .collect();

    let percent = matched.len() as f64 / job.required_skills.len() as f64 * 100.0;
    (percent, matched, missing)
}

/// Experience alignment with a mild over-qualification penalty.
///
/// Within 2x of the requirement is a full match. Beyond 2x the score
/// decays 2 points per extra year but never below the 90.0 floor.
/// Under the requirement the penalty is linear in the shortage.
fn experience_alignment(required_years: u32, candidate_years: f64) -> (f64, BTreeMap<String, String>) {
    let mut gaps = BTreeMap::new();
    let required = required_years as f64;

    // A zero-year requirement can never be under-filled.
    if required_years == 0 {
        return (100.0, gaps);
    }

    if candidate_years >= required {
        if candidate_years <= required * 2.0 {
            (100.0, gaps)
        } else {
            let alignment = (100.0 - (candidate_years - required * 2.0) * 2.0).max(90.0);
            gaps.insert(
                "over_qualified".to_string(),
                format!(
                    "Candidate has {:.1} years beyond requirement",
                    candidate_years - required
                ),
            );
            (alignment, gaps)
        }
    } else {
        let shortage = required - candidate_years;
        let alignment = (100.0 - shortage / required * 100.0).max(0.0);
        gaps.insert(
            "under_qualified".to_string(),
            format!("Missing {shortage:.1} years of experience"),
        );
        (alignment, gaps)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
