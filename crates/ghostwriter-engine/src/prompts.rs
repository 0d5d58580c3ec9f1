//! Prompt and context assembly boundary.
//!
//! Turning document context into model messages is not the engine's
//! business; it consumes an opaque [`PromptSource`]. [`DefaultPrompts`]
//! ships workable instructions so the engine runs out of the box, but
//! hosts are expected to substitute their own.

use ghostwriter_llm::{CompletionRequest, Message, StreamRequest};

use crate::config::{ContinuationConfig, TabCompletionConfig};

/// Assembles model requests from document context. Opaque to the engine;
/// only the async, cancellable nature of the resulting calls matters to
/// orchestration.
pub trait PromptSource: Send + Sync {
    /// Build the non-streaming request for one tab-completion attempt.
    fn tab_completion_request(
        &self,
        context: &str,
        title: Option<&str>,
        config: &TabCompletionConfig,
    ) -> CompletionRequest;

    /// Build the streaming request for a continuation.
    fn continuation_request(
        &self,
        context: &str,
        instruction: Option<&str>,
        title: Option<&str>,
        config: &ContinuationConfig,
    ) -> StreamRequest;
}

const TAB_COMPLETION_SYSTEM_PROMPT: &str = "You are a helpful assistant providing inline \
    writing suggestions. Predict a concise continuation after the user's cursor. Do not \
    repeat existing text. Return only the suggested continuation without quotes or extra \
    commentary.";

const CONTINUATION_SYSTEM_PROMPT: &str = "You are an intelligent writing assistant. Continue \
    the user's document naturally from where it leaves off, matching its tone and style. \
    Return only the continuation text without quotes or commentary.";

/// Stock prompt assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

impl PromptSource for DefaultPrompts {
    fn tab_completion_request(
        &self,
        context: &str,
        title: Option<&str>,
        config: &TabCompletionConfig,
    ) -> CompletionRequest {
        let title_section = title
            .map(|t| format!("File title: {t}\n\n"))
            .unwrap_or_default();
        let user = format!(
            "{title_section}Recent context:\n\n{context}\n\nProvide the next words that \
             would help continue naturally."
        );
        CompletionRequest::new(
            config.model.as_str(),
            vec![Message::system(TAB_COMPLETION_SYSTEM_PROMPT), Message::user(user)],
        )
        .with_max_tokens(config.max_tokens)
        .with_temperature(config.temperature)
    }

    fn continuation_request(
        &self,
        context: &str,
        instruction: Option<&str>,
        title: Option<&str>,
        config: &ContinuationConfig,
    ) -> StreamRequest {
        let title_section = title
            .map(|t| format!("Document title: {t}\n"))
            .unwrap_or_default();
        let instruction_section = instruction
            .map(|i| format!("Instruction:\n{i}\n\n"))
            .unwrap_or_default();
        let context_section = if context.trim().is_empty() {
            String::new()
        } else {
            format!("Preceding content:\n\n{context}\n\n")
        };
        let user = format!(
            "{title_section}{instruction_section}{context_section}Continue writing from here."
        );
        StreamRequest::new(
            config.model.as_str(),
            vec![Message::system(CONTINUATION_SYSTEM_PROMPT), Message::user(user)],
        )
        .with_max_tokens(config.max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_request_carries_clamped_params() {
        let config = TabCompletionConfig {
            max_tokens: 4,
            ..TabCompletionConfig::default()
        };
        let request = DefaultPrompts.tab_completion_request("some context", Some("notes"), &config);
        assert_eq!(request.max_tokens, 16);
        assert_eq!(request.temperature, Some(0.5));
        assert!(request.messages[1].content.contains("File title: notes"));
        assert!(request.messages[1].content.contains("some context"));
    }

    #[test]
    fn test_continuation_request_sections_are_optional() {
        let config = ContinuationConfig::default();
        let request = DefaultPrompts.continuation_request("", Some("keep going"), None, &config);
        let user = &request.messages[1].content;
        assert!(user.contains("Instruction:\nkeep going"));
        assert!(!user.contains("Preceding content"));
        assert!(!user.contains("Document title"));
    }
}
