//! CV/job compatibility analysis core.
//!
//! The upstream API boundary constructs a [`Pipeline`] once (with an
//! [`AnalyzerConfig`] and a completion client) and calls
//! [`Pipeline::run`] per request. Everything else in this crate is
//! plumbing for that single operation.

pub mod analysis;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod retry;
pub mod telemetry;

pub use analysis::orchestrator::{fingerprint, Pipeline, PipelineStage};
pub use analysis::report::{AnalysisReport, Recommendation};
pub use config::{AnalyzerConfig, ScoreWeights};
pub use errors::{PipelineFailure, StageError};
pub use llm_client::{CompletionClient, LlmClient};
pub use retry::RetryPolicy;
