//! Shared data types for ghostwriter.
//!
//! This crate is the foundation the engine and the model-client interface
//! build on: typed IDs, document offsets and changes, key events, inline
//! suggestions, and telemetry records. It has **no internal ghostwriter
//! dependencies** — a pure leaf crate.
//!
//! # Key Types
//!
//! | Type                 | Purpose                                        |
//! |----------------------|------------------------------------------------|
//! | [`TaskId`]           | Which in-flight AI task                        |
//! | [`DocChange`]        | One document edit, with offset remapping       |
//! | [`KeyEvent`]         | A keystroke as seen by the trigger detector    |
//! | [`InlineSuggestion`] | Proposed but unconfirmed ghost text            |
//! | [`InvocationRecord`] | Terminal telemetry record for one AI lifecycle |

pub mod change;
pub mod ids;
pub mod key;
pub mod suggestion;
pub mod telemetry;

pub use change::DocChange;
pub use ids::TaskId;
pub use key::{Key, KeyEvent};
pub use suggestion::{InlineSuggestion, PanelKind, SuggestionSource};
pub use telemetry::{InvocationOutcome, InvocationRecord};
