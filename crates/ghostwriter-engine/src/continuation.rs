//! Explicit "continue writing" orchestration.
//!
//! User-invoked, never idle-triggered. A continuation always wins: it
//! cancels everything in flight (including another continuation), shows a
//! thinking indicator at the insertion point, streams the response, swaps
//! the indicator for accumulating ghost text on first content, and leaves
//! the final suggestion awaiting accept/reject. Reasoning deltas before
//! real content only feed the indicator's preview — advisory UI, never
//! inserted into the document.
//!
//! Exactly one terminal telemetry record is emitted per invocation,
//! whatever the path: success, empty result, precondition abort, error, or
//! cancellation.

use std::sync::Arc;

use futures::StreamExt;

use ghostwriter_llm::{LlmError, StreamEvent};
use ghostwriter_types::telemetry::unix_millis_now;
use ghostwriter_types::{InvocationOutcome, PanelKind, SuggestionSource};

use crate::cancel::{TaskHandle, TaskKind};
use crate::engine::EngineCtx;
use crate::error::EngineError;

const SURFACE_LABEL: &str = "continuation";

/// How a continuation flow ended, short of an error.
enum FlowEnd {
    /// Non-empty suggestion left displayed, awaiting accept/reject.
    Suggested,
    /// Stream finished with nothing usable.
    Empty,
    /// No context, no instruction, no title — the model was never called.
    NothingToContinue,
}

/// Entry point: synchronously preempt everything, then run the flow.
pub(crate) fn request(
    ctx: &Arc<EngineCtx>,
    instruction: Option<String>,
    explicit_context: Option<String>,
) {
    ctx.registry.cancel_all();
    {
        let mut ui = ctx.ui.lock();
        ui.active = None;
        ui.renderer.clear();
        ui.continuation_in_progress = true;
    }
    let task = ctx.registry.register(TaskKind::Continuation);
    let ctx = ctx.clone();
    tokio::spawn(async move {
        run(ctx, task, instruction, explicit_context).await;
    });
}

async fn run(
    ctx: Arc<EngineCtx>,
    task: TaskHandle,
    instruction: Option<String>,
    explicit_context: Option<String>,
) {
    let started_at = unix_millis_now();
    let end = flow(&ctx, &task, instruction, explicit_context).await;

    {
        let mut ui = ctx.ui.lock();
        ui.renderer.clear_thinking();
        if !matches!(end, Ok(FlowEnd::Suggested)) {
            ui.clear_suggestion();
        }
        ui.continuation_in_progress = false;
    }

    let (outcome, error_message, notice) = match &end {
        Ok(FlowEnd::Suggested) => (
            InvocationOutcome::Success,
            None,
            Some("Continuation ready — press Tab to accept."),
        ),
        Ok(FlowEnd::Empty) => (
            InvocationOutcome::Success,
            None,
            Some("No continuation generated."),
        ),
        Ok(FlowEnd::NothingToContinue) => (
            InvocationOutcome::Aborted,
            None,
            Some("No preceding content to continue."),
        ),
        Err(err) if err.is_cancellation() => {
            (InvocationOutcome::Aborted, None, Some("Continuation cancelled."))
        }
        Err(err) => {
            tracing::error!(%err, "continuation failed");
            (
                InvocationOutcome::Error,
                Some(err.to_string()),
                Some("Failed to generate continuation."),
            )
        }
    };
    if let Some(message) = notice {
        ctx.notices.notice(message);
    }
    ctx.record_invocation(SURFACE_LABEL, started_at, outcome, error_message);
}

async fn flow(
    ctx: &Arc<EngineCtx>,
    task: &TaskHandle,
    instruction: Option<String>,
    explicit_context: Option<String>,
) -> Result<FlowEnd, EngineError> {
    let config = &ctx.config.continuation;
    let surface = &ctx.surface;
    let token = task.token().clone();

    // Insertion point: selection end when a selection exists, else the
    // caret. Context prefers the explicit override, then the selection,
    // then the tail of preceding text.
    let selection = surface.selection();
    let insert_at = match selection {
        Some((_, end)) => {
            surface.set_caret(end);
            end
        }
        None => surface.caret(),
    };
    let context = match explicit_context.filter(|c| !c.trim().is_empty()) {
        Some(explicit) => explicit,
        None => match selection {
            Some((from, to)) => surface.text_in(from, to),
            None => surface.text_before(insert_at, config.max_context_chars),
        },
    };
    let context = tail_chars(&context, config.max_context_chars);
    let instruction = instruction.filter(|i| !i.trim().is_empty());
    let title = surface.document_title().filter(|t| !t.trim().is_empty());

    if context.trim().is_empty() && instruction.is_none() && title.is_none() {
        return Ok(FlowEnd::NothingToContinue);
    }

    // Thinking affordance goes up before the request; panels and inline
    // decorations are mutually exclusive surfaces.
    {
        let mut ui = ctx.ui.lock();
        ui.renderer
            .show_thinking(insert_at, &config.thinking_label, None);
        ui.open_panel = None;
    }
    ctx.panels.close_panel(PanelKind::SmartSpace);
    ctx.panels.close_panel(PanelKind::QuickAsk);

    let request =
        ctx.prompts
            .continuation_request(&context, instruction.as_deref(), title.as_deref(), config);

    let mut events = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(EngineError::Cancelled),
        opened = ctx.llm.stream(request, token.clone()) => opened.map_err(into_engine_error)?,
    };

    let mut accumulated = String::new();
    let mut reasoning = ReasoningPreview::new(config.reasoning_buffer_cap, config.reasoning_preview_len);
    loop {
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(EngineError::Cancelled),
            event = events.next() => event,
        };
        let Some(event) = event else { break };
        match event {
            StreamEvent::ThinkingDelta(delta) => {
                // Advisory preview only, and only while no content arrived.
                if accumulated.is_empty() {
                    if let Some(preview) = reasoning.push(&delta) {
                        ctx.ui.lock().renderer.show_thinking(
                            insert_at,
                            &config.thinking_label,
                            Some(&preview),
                        );
                    }
                }
            }
            StreamEvent::TextDelta(delta) => {
                if delta.is_empty() {
                    continue;
                }
                let first = accumulated.is_empty();
                accumulated.push_str(&delta);

                let mut ui = ctx.ui.lock();
                if first {
                    // Validate against the live caret immediately before
                    // first display; the anchor from request time is never
                    // trusted.
                    if surface.caret() != insert_at || surface.selection().is_some() {
                        task.cancel();
                        return Err(EngineError::Cancelled);
                    }
                } else if !ui.suggestion_matches(SuggestionSource::Continuation, insert_at) {
                    // A document edit invalidated the partial suggestion
                    // while we were streaming; edits always win.
                    task.cancel();
                    return Err(EngineError::Cancelled);
                }
                ui.show_suggestion(SuggestionSource::Continuation, insert_at, accumulated.clone());
            }
            StreamEvent::Done { .. } => break,
            StreamEvent::Error(message) => return Err(EngineError::Llm(LlmError::Api(message))),
        }
    }

    if accumulated.trim().is_empty() {
        Ok(FlowEnd::Empty)
    } else {
        Ok(FlowEnd::Suggested)
    }
}

fn into_engine_error(err: LlmError) -> EngineError {
    if err.is_cancellation() {
        EngineError::Cancelled
    } else {
        EngineError::Llm(err)
    }
}

/// Bounded window over reasoning deltas, yielding a whitespace-normalized
/// preview tail whenever it changes.
struct ReasoningPreview {
    buffer: String,
    cap: usize,
    preview_len: usize,
    last: String,
}

impl ReasoningPreview {
    fn new(cap: usize, preview_len: usize) -> Self {
        Self {
            buffer: String::new(),
            cap,
            preview_len,
            last: String::new(),
        }
    }

    /// Absorb a delta; returns the new preview when it changed.
    fn push(&mut self, delta: &str) -> Option<String> {
        self.buffer.push_str(delta);
        if self.buffer.chars().count() > self.cap {
            self.buffer = tail_chars(&self.buffer, self.cap);
        }
        let normalized = self
            .buffer
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if normalized.is_empty() {
            return None;
        }
        let preview = tail_chars(&normalized, self.preview_len);
        if preview == self.last {
            None
        } else {
            self.last = preview.clone();
            Some(preview)
        }
    }
}

/// The last `n` characters of `s`.
fn tail_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    if count <= n {
        s.to_string()
    } else {
        s.chars().skip(count - n).collect()
    }
}
