//! Streaming events for continuation responses.
//!
//! Providers convert their native streaming formats into [`StreamEvent`]s.
//! The engine consumes exactly two delta kinds: reasoning deltas feed the
//! thinking-indicator preview (advisory UI only, never inserted into the
//! document), text deltas accumulate into the ghost-text suggestion.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::Message;

/// A streaming response: events until a terminal [`StreamEvent::Done`] or
/// [`StreamEvent::Error`], or until the request's token is cancelled.
pub type EventStream = BoxStream<'static, StreamEvent>;

/// Provider-agnostic streaming events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// Incremental reasoning text, produced before real content.
    ThinkingDelta(String),

    /// Incremental response text.
    TextDelta(String),

    /// Generation completed.
    Done {
        /// Reason generation stopped (e.g., "end_turn", "max_tokens").
        stop_reason: Option<String>,
    },

    /// Error during generation.
    Error(String),
}

impl StreamEvent {
    /// Check if this is a delta event (thinking or text).
    pub fn is_delta(&self) -> bool {
        matches!(self, Self::ThinkingDelta(_) | Self::TextDelta(_))
    }

    /// Check if this is a terminal event (Done or Error).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error(_))
    }

    /// Extract delta text if this is a delta event.
    pub fn as_delta(&self) -> Option<&str> {
        match self {
            Self::ThinkingDelta(s) | Self::TextDelta(s) => Some(s),
            _ => None,
        }
    }
}

/// Configuration for a streaming request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRequest {
    /// The model to use.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 2.0 = creative).
    pub temperature: Option<f32>,
}

impl StreamRequest {
    /// Create a new streaming request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: 4096,
            temperature: None,
        }
    }

    /// Set max tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature, clamped to 0.0..=2.0.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature.clamp(0.0, 2.0));
        self
    }
}
