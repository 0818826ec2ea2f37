use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::analysis::orchestrator::PipelineStage;
use crate::llm_client::LlmError;

/// Stage-local error taxonomy.
///
/// `Transport`, `Timeout`, and `NonConforming` are retryable within a
/// stage's retry budget. Once the budget is exhausted they are
/// reclassified into the stage's terminal variant: `Parse` for
/// structuring, `Validation`/`Timeout` for semantic validation,
/// `Generation` for recommendation synthesis.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("completion transport error: {0}")]
    Transport(#[from] LlmError),

    #[error("completion call exceeded {0}s deadline")]
    Timeout(u64),

    #[error("non-conforming completion output: {0}")]
    NonConforming(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("report generation error: {0}")]
    Generation(String),
}

impl StageError {
    /// Whether the stage retry wrapper may attempt this call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StageError::Transport(_) | StageError::Timeout(_) | StageError::NonConforming(_)
        )
    }
}

/// Fatal pipeline outcome surfaced to the API boundary.
///
/// Carries the stage that failed and a correlation identifier so the
/// caller can tie the failure back to logs. Serializable as-is into
/// an error response body.
#[derive(Debug, Error, Serialize)]
#[error("pipeline failed at {stage}: {reason} [correlation_id={correlation_id}]")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    pub reason: String,
    pub correlation_id: Uuid,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: &StageError, correlation_id: Uuid) -> Self {
        Self {
            stage,
            reason: error.to_string(),
            correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_nonconforming_are_retryable() {
        assert!(StageError::NonConforming("bad json".into()).is_retryable());
        assert!(StageError::Timeout(20).is_retryable());
    }

    #[test]
    fn terminal_variants_are_not_retryable() {
        assert!(!StageError::Parse("x".into()).is_retryable());
        assert!(!StageError::Validation("x".into()).is_retryable());
        assert!(!StageError::Generation("x".into()).is_retryable());
    }

    #[test]
    fn failure_message_names_stage_and_correlation_id() {
        let id = Uuid::new_v4();
        let failure = PipelineFailure::new(
            PipelineStage::StructuringJob,
            &StageError::Parse("bad payload".into()),
            id,
        );
        let message = failure.to_string();
        assert!(message.contains("structuring_job"));
        assert!(message.contains(&id.to_string()));
    }
}
