//! Error types for the orchestration engine.
//!
//! Everything is caught at the orchestrator boundary; nothing escapes to
//! corrupt the host editing surface. Cancellation is silent, timeouts are
//! retryable only for tab completion, and transport failures surface as a
//! brief notice.

use ghostwriter_llm::LlmError;

/// Errors that can occur during suggestion orchestration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Cancelled by the user or superseded by a newer request. Silent:
    /// transient UI is torn down, no notice is shown, nothing is retried.
    #[error("cancelled")]
    Cancelled,

    /// A request attempt exceeded its per-attempt timeout.
    #[error("request timed out")]
    Timeout,

    /// Model client failure (non-timeout, non-cancellation).
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl EngineError {
    /// Whether this is the silent cancellation class.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled) || matches!(self, Self::Llm(e) if e.is_cancellation())
    }
}
