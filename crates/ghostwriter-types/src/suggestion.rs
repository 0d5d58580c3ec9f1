//! Inline suggestions and auxiliary panel kinds.

use serde::{Deserialize, Serialize};

/// Which flow produced a suggestion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionSource {
    /// Idle-typing tab completion.
    Tab,
    /// Explicit "continue writing" request.
    Continuation,
}

/// Proposed but unconfirmed ghost text anchored at a live document offset.
///
/// At most one of these is visible at any moment; a new one fully replaces
/// the old. The anchor is remapped through every subsequent document change
/// for as long as the suggestion stays valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSuggestion {
    /// Which flow produced it.
    pub source: SuggestionSource,
    /// Live document offset the ghost text hangs off.
    pub anchor: usize,
    /// The proposed text.
    pub text: String,
}

/// Auxiliary panels the trigger detector can open.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PanelKind {
    /// The space-triggered quick-actions panel.
    SmartSpace,
    /// The `@`-triggered ask panel.
    QuickAsk,
}
