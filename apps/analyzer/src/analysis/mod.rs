//! The analysis pipeline: structuring → deterministic scoring →
//! semantic validation → hybrid combination → recommendation
//! synthesis, sequenced by the orchestrator.

use std::time::Duration;

use crate::errors::StageError;
use crate::llm_client::CompletionClient;

pub mod deterministic;
pub mod hybrid;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod semantic;
pub mod structuring;

/// One completion call under the per-call deadline. Dropping the
/// timed-out future abandons the in-flight request; its eventual
/// result is never applied.
pub(crate) async fn timed_completion(
    client: &dyn CompletionClient,
    call_timeout: Duration,
    system: &str,
    prompt: &str,
) -> Result<String, StageError> {
    match tokio::time::timeout(call_timeout, client.complete(system, prompt)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(StageError::Transport(e)),
        Err(_) => Err(StageError::Timeout(call_timeout.as_secs())),
    }
}
