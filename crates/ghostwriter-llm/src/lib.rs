//! Model-client interface for ghostwriter.
//!
//! The orchestration engine never talks to a concrete provider; it consumes
//! this crate's [`LlmClient`] trait — one non-streaming `generate` call for
//! low-latency tab completions and one `stream` call for continuations.
//! Both take a shared [`CancellationToken`]: cancellation is cooperative,
//! the client is responsible for honoring it promptly, and callers never
//! wait for it to take effect.

pub mod stream;

#[cfg(feature = "test-mock")]
pub mod mock;

pub use stream::{EventStream, StreamEvent, StreamRequest};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions from the integrating application.
    System,
    /// Human/user message.
    User,
    /// Assistant/model message.
    Assistant,
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Configuration for a non-streaming completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation history.
    pub messages: Vec<Message>,
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 2.0 = creative).
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a new completion request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: model.into(),
            max_tokens: 256,
            temperature: None,
        }
    }

    /// Set max tokens, clamped to the provider-safe 16..=2000 range.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.clamp(16, 2000);
        self
    }

    /// Set temperature, clamped to 0.0..=2.0.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }
}

/// Response from a non-streaming completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text content.
    pub content: String,
    /// Model that generated the response.
    pub model: String,
    /// Reason the generation stopped.
    pub stop_reason: Option<String>,
}

/// Error type for model-client operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Client not configured or no provider available.
    #[error("client not available: {0}")]
    Unavailable(String),

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limited.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API error.
    #[error("api error: {0}")]
    Api(String),

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// The request observed its cancellation token and stopped.
    #[error("request cancelled")]
    Cancelled,
}

impl LlmError {
    /// Whether this error is the silent cancellation class: no user-visible
    /// notice, transient UI torn down, nothing retried.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for model-client operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Trait for model clients.
///
/// Implementations wrap a concrete provider. Both calls take a
/// [`CancellationToken`] shared with the caller's cancellation registry;
/// a cancelled token should surface as [`LlmError::Cancelled`] as soon as
/// the implementation can unwind.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the client name (e.g., "anthropic", "local").
    fn name(&self) -> &str;

    /// Send a non-streaming completion request.
    async fn generate(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> LlmResult<CompletionResponse>;

    /// Open a streaming request; the returned stream yields [`StreamEvent`]s
    /// until a terminal event or cancellation.
    async fn stream(
        &self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> LlmResult<EventStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = Message::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");

        let system = Message::system("be brief");
        assert_eq!(system.role, Role::System);
    }

    #[test]
    fn test_completion_request_clamps() {
        let request = CompletionRequest::new("model-a", vec![Message::user("test")])
            .with_max_tokens(4)
            .with_temperature(3.5);
        assert_eq!(request.max_tokens, 16);
        assert_eq!(request.temperature, Some(2.0));

        let request = CompletionRequest::new("model-a", vec![]).with_max_tokens(64);
        assert_eq!(request.max_tokens, 64);
    }

    #[test]
    fn test_cancellation_class() {
        assert!(LlmError::Cancelled.is_cancellation());
        assert!(!LlmError::Api("boom".into()).is_cancellation());
    }
}
