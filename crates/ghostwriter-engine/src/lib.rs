//! Inline suggestion and trigger orchestration engine.
//!
//! Augments a text-editing host with AI-generated ghost-text continuations.
//! The hard part is not calling a model — it is coordinating *when* to ask,
//! *what* to show while waiting, how to cancel stale work the instant the
//! document changes, and how to reconcile the two suggestion flows (idle
//! tab completion and explicit continuation) without ever corrupting the
//! document or leaking zombie requests.
//!
//! # Architecture
//!
//! ```text
//! keystrokes ──► TriggerDetector ──► auxiliary panel (consume)
//!      │               │
//!      │          passthrough
//!      ▼               ▼
//! TabScheduler (idle debounce) ──► CancelRegistry ──► LlmClient
//!      │                                                  │
//!      ▼                                                  ▼
//! SuggestionRenderer ◄── accept/reject ◄── displayed ghost text
//!
//! request_continuation() preempts everything above, shares the same
//! registry, renderer, and accept/reject machinery.
//! ```
//!
//! The host injects its capabilities (editor surface, decorations, panels,
//! notices, telemetry) as trait objects into one explicitly-constructed
//! [`Engine`]; nothing here is ambient global state. The document is only
//! ever mutated by explicit user typing, the Accept transition, and the
//! trigger detector's own deletions of partial trigger characters — never
//! speculatively.

pub mod accept;
pub mod cancel;
pub mod config;
pub mod continuation;
pub mod engine;
pub mod error;
pub mod events;
pub mod prompts;
pub mod render;
pub mod retry;
pub mod surface;
pub mod tab;
pub mod trigger;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{CancelRegistry, TaskHandle, TaskKind};
pub use config::{
    ContinuationConfig, EngineConfig, SmartSpaceMode, TabCompletionConfig, TriggerConfig,
};
pub use engine::{Engine, HostBindings, KeyVerdict};
pub use error::EngineError;
pub use events::{Subscription, Subscriptions, SurfaceEvents};
pub use prompts::{DefaultPrompts, PromptSource};
pub use render::{Renderable, SuggestionRenderer};
pub use surface::{DecorationHost, DecorationId, EditorSurface, InvocationSink, NoticeSink, PanelHost};
pub use trigger::{TriggerAction, TriggerDetector};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
