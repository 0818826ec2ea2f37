//! Hybrid combiner — pure weighted merge of the deterministic and
//! semantic scores, plus grade mapping and strength/gap compilation.

use std::fmt;

use serde::Serialize;

use crate::analysis::deterministic::{round2, DeterministicScore};
use crate::analysis::semantic::SemanticScore;
use crate::config::ScoreWeights;

/// Letter grade for a final score. Thresholds evaluated high-to-low,
/// first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            Grade::APlus
        } else if score >= 90.0 {
            Grade::A
        } else if score >= 85.0 {
            Grade::BPlus
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 75.0 {
            Grade::CPlus
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Final combined score with full component breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridScore {
    /// `deterministic.total * 0.60 + semantic.total * 0.40`, 2-decimal rounded.
    pub final_score: f64,
    pub deterministic_component: DeterministicScore,
    /// Serialized as `llm_component` — the breakdown shape the API
    /// boundary documents.
    #[serde(rename = "llm_component")]
    pub semantic_component: SemanticScore,
    pub grade: Grade,
}

/// Merges both component scores. Pure; inputs are pre-validated
/// scores in [0,100].
pub fn combine(
    deterministic: DeterministicScore,
    semantic: SemanticScore,
    weights: &ScoreWeights,
) -> HybridScore {
    let final_score = round2(
        deterministic.total_score * weights.deterministic + semantic.total_score * weights.semantic,
    );
    let grade = Grade::from_score(final_score);

    HybridScore {
        final_score,
        deterministic_component: deterministic,
        semantic_component: semantic,
        grade,
    }
}

/// Compiles up to five human-readable strengths from both components.
pub fn compile_strengths(det: &DeterministicScore, sem: &SemanticScore) -> Vec<String> {
    let mut strengths = Vec::new();

    if !det.matched_skills.is_empty() {
        strengths.push(format!(
            "Strong match on {} required skills: {}",
            det.matched_skills.len(),
            det.matched_skills
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    if det.experience_alignment_percent >= 90.0 {
        strengths.push("Excellent experience level alignment".to_string());
    }

    if !sem.transferable_skills.is_empty() {
        strengths.push(format!(
            "Transferable skills identified: {}",
            sem.transferable_skills
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    if strengths.len() < 3 && !sem.reasoning.is_empty() {
        strengths.push(truncate_chars(&sem.reasoning, 200));
    }

    strengths.truncate(5);
    strengths
}

/// Compiles up to five human-readable gaps from both components.
pub fn compile_gaps(det: &DeterministicScore, sem: &SemanticScore) -> Vec<String> {
    let mut gaps = Vec::new();

    if !det.missing_skills.is_empty() {
        gaps.push(format!(
            "Missing {} required skills: {}",
            det.missing_skills.len(),
            det.missing_skills
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    for description in det.experience_gaps.values() {
        gaps.push(description.clone());
    }

    if sem.cultural_fit_notes.to_lowercase().contains("concern") {
        gaps.push(truncate_chars(&sem.cultural_fit_notes, 200));
    }

    gaps.truncate(5);
    gaps
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
