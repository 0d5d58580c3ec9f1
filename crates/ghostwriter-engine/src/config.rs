//! Engine configuration snapshot.
//!
//! Supplied by the host as an immutable snapshot read at the start of each
//! operation; the engine never mutates it. Durations are stored as integer
//! milliseconds so the snapshot round-trips through host settings files
//! unchanged.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How plain spaces on a blank line open the smart-space panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmartSpaceMode {
    /// Any space on a blank line triggers immediately.
    Single,
    /// First space inserts normally and arms a watch; a second space within
    /// the window removes it and triggers.
    Double,
    /// Plain spaces never trigger; the slash-then-space combo still works.
    Off,
}

/// Trigger detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Whether the quick-ask trigger is active.
    pub quick_ask_enabled: bool,
    /// The quick-ask trigger string, 1–3 characters. Out-of-range values
    /// disable the trigger rather than erroring.
    pub quick_ask_trigger: String,
    /// Whether smart-space triggers are active at all.
    pub smart_space_enabled: bool,
    /// Blank-line space behavior.
    pub smart_space_mode: SmartSpaceMode,
    /// Shared window for the slash-then-space and double-space watches.
    pub watch_window_ms: u64,
}

impl TriggerConfig {
    /// The watch window as a [`Duration`].
    pub fn watch_window(&self) -> Duration {
        Duration::from_millis(self.watch_window_ms)
    }

    /// The quick-ask trigger, if enabled and within the 1–3 char bound.
    pub fn effective_quick_ask_trigger(&self) -> Option<&str> {
        if !self.quick_ask_enabled {
            return None;
        }
        let len = self.quick_ask_trigger.chars().count();
        if (1..=3).contains(&len) {
            Some(&self.quick_ask_trigger)
        } else {
            None
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            quick_ask_enabled: true,
            quick_ask_trigger: "@".into(),
            smart_space_enabled: true,
            smart_space_mode: SmartSpaceMode::Single,
            watch_window_ms: 600,
        }
    }
}

/// Tab-completion scheduling and request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabCompletionConfig {
    /// Whether idle tab completion runs at all.
    pub enabled: bool,
    /// Model identifier handed to the client.
    pub model: String,
    /// Idle debounce before a scheduled fetch fires.
    pub debounce_ms: u64,
    /// Minimum trimmed length of preceding text; below this the fetch is
    /// silently skipped.
    pub min_context_len: usize,
    /// Bounded tail of preceding text sent as context.
    pub max_context_chars: usize,
    /// Displayed suggestions are truncated to this many bytes.
    pub max_suggestion_len: usize,
    /// Token budget for the completion request.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-attempt timeout; zero disables the timeout.
    pub request_timeout_ms: u64,
    /// Additional attempts after a timeout abort. Only timeouts retry.
    pub max_retries: u32,
}

impl TabCompletionConfig {
    /// The debounce delay as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The per-attempt timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for TabCompletionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "default".into(),
            debounce_ms: 3000,
            min_context_len: 20,
            max_context_chars: 4000,
            max_suggestion_len: 240,
            max_tokens: 64,
            temperature: 0.5,
            request_timeout_ms: 12_000,
            max_retries: 0,
        }
    }
}

/// Continuation request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationConfig {
    /// Model identifier handed to the client.
    pub model: String,
    /// Character budget for context; the tail (most recent content) is kept
    /// when over budget.
    pub max_context_chars: usize,
    /// Token budget for the streaming request.
    pub max_tokens: u32,
    /// Label on the thinking indicator while waiting for first content.
    pub thinking_label: String,
    /// Bounded window of buffered reasoning deltas.
    pub reasoning_buffer_cap: usize,
    /// Length of the whitespace-normalized preview tail shown on the
    /// thinking indicator.
    pub reasoning_preview_len: usize,
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self {
            model: "default".into(),
            max_context_chars: 8000,
            max_tokens: 1024,
            thinking_label: "Thinking".into(),
            reasoning_buffer_cap: 400,
            reasoning_preview_len: 120,
        }
    }
}

/// Immutable engine configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub trigger: TriggerConfig,
    pub tab_completion: TabCompletionConfig,
    pub continuation: ContinuationConfig,
}
