//! Accept/reject state machine for displayed suggestions.
//!
//! Two states: no suggestion, or one displayed suggestion. Accept (Tab)
//! is only valid while the live caret sits exactly at the suggestion's
//! current anchor with no selection; it inserts the text, moves the caret
//! past it, and — for tab-sourced suggestions — immediately re-arms the
//! scheduler. Reject (Shift-Tab or Escape) clears the suggestion and
//! cancels the underlying task if it is still streaming. When no matching
//! suggestion exists, both keys pass through untouched.

use std::sync::Arc;

use ghostwriter_types::{Key, KeyEvent, SuggestionSource};

use crate::cancel::TaskKind;
use crate::engine::{EngineCtx, KeyVerdict};
use crate::tab::TabScheduler;

impl From<SuggestionSource> for TaskKind {
    fn from(source: SuggestionSource) -> Self {
        match source {
            SuggestionSource::Tab => TaskKind::TabCompletion,
            SuggestionSource::Continuation => TaskKind::Continuation,
        }
    }
}

/// Route a keystroke through the accept/reject bindings. `None` means the
/// key is not ours and evaluation continues (trigger detection, then the
/// host's normal behavior).
pub(crate) fn on_suggestion_key(
    ctx: &Arc<EngineCtx>,
    tab: &TabScheduler,
    event: &KeyEvent,
) -> Option<KeyVerdict> {
    if event.has_blocking_modifier() {
        return None;
    }
    let is_reject = event.is_shift_tab() || matches!(event.key, Key::Escape);
    let is_accept = !is_reject && matches!(event.key, Key::Tab);
    if !is_accept && !is_reject {
        return None;
    }

    let mut ui = ctx.ui.lock();
    let active = ui.active.clone()?;

    if is_reject {
        ui.clear_suggestion();
        drop(ui);
        ctx.registry.cancel_kind(active.source.into());
        tracing::debug!(source = %active.source, "suggestion rejected");
        return Some(KeyVerdict::Consumed);
    }

    // Accept: validate against the live world, never the request-time one.
    if ctx.surface.caret() != active.anchor || ctx.surface.selection().is_some() {
        // Stale anchor — no document mutation, key returns to the host.
        ui.clear_suggestion();
        drop(ui);
        ctx.registry.cancel_kind(active.source.into());
        return None;
    }

    ui.clear_suggestion();
    drop(ui);
    ctx.registry.cancel_kind(active.source.into());

    ctx.surface
        .replace_range(active.anchor, active.anchor, &active.text);
    ctx.surface.set_caret(active.anchor + active.text.len());
    tracing::debug!(source = %active.source, len = active.text.len(), "suggestion accepted");

    if active.source == SuggestionSource::Tab {
        tab.schedule();
    }
    Some(KeyVerdict::Consumed)
}
