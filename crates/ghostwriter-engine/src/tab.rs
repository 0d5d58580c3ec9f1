//! Idle tab-completion scheduling.
//!
//! Every relevant document change restarts a debounce timer; when it fires
//! untouched, the scheduler re-validates the world (caret unmoved, no
//! selection, enough preceding text), issues one non-streaming request
//! through the retry runner, post-processes the result, and displays it as
//! tab-sourced ghost text — but only if the caret is still exactly where
//! the fetch was scheduled.
//!
//! A pending schedule is identified by a generation number; any further
//! keystroke, focus change, or caret movement away from the scheduled
//! offset bumps the generation and the stale timer fires into nothing.

use std::sync::Arc;

use parking_lot::Mutex;

use ghostwriter_types::telemetry::unix_millis_now;
use ghostwriter_types::{InvocationOutcome, SuggestionSource};

use crate::cancel::TaskKind;
use crate::engine::EngineCtx;
use crate::retry::{self, AttemptError};

const SURFACE_LABEL: &str = "tab-completion";

#[derive(Default)]
struct SchedState {
    generation: u64,
    pending: Option<Pending>,
}

struct Pending {
    offset: usize,
    generation: u64,
}

/// Debounced tab-completion scheduler. Cheap to clone; clones share the
/// schedule state.
#[derive(Clone)]
pub(crate) struct TabScheduler {
    ctx: Arc<EngineCtx>,
    sched: Arc<Mutex<SchedState>>,
}

impl TabScheduler {
    pub fn new(ctx: Arc<EngineCtx>) -> Self {
        Self {
            ctx,
            sched: Arc::new(Mutex::new(SchedState::default())),
        }
    }

    /// A document change: cancel the previous tab-completion task (never a
    /// continuation) and restart the debounce.
    pub fn on_document_changed(&self) {
        self.ctx.registry.cancel_kind(TaskKind::TabCompletion);
        self.schedule();
    }

    /// A caret move invalidates a schedule armed for a different offset.
    pub fn on_caret_moved(&self, caret: usize) {
        let mut sched = self.sched.lock();
        if sched.pending.as_ref().is_some_and(|p| p.offset != caret) {
            sched.pending = None;
            sched.generation += 1;
        }
    }

    /// Drop any pending schedule and cancel any in-flight tab task.
    pub fn invalidate(&self) {
        {
            let mut sched = self.sched.lock();
            sched.pending = None;
            sched.generation += 1;
        }
        self.ctx.registry.cancel_kind(TaskKind::TabCompletion);
    }

    /// Arm a new debounced fetch at the current caret.
    pub fn schedule(&self) {
        let config = &self.ctx.config.tab_completion;
        let armed = config.enabled
            && !self.ctx.ui.lock().continuation_in_progress
            && self.ctx.surface.selection().is_none();
        let offset = self.ctx.surface.caret();

        let generation = {
            let mut sched = self.sched.lock();
            sched.generation += 1;
            sched.pending = armed.then_some(Pending {
                offset,
                generation: sched.generation,
            });
            sched.generation
        };
        if !armed {
            return;
        }

        let this = self.clone();
        let debounce = config.debounce();
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            this.fire(generation, offset).await;
        });
    }

    /// The debounce elapsed untouched; validate and fetch.
    async fn fire(&self, generation: u64, offset: usize) {
        {
            let mut sched = self.sched.lock();
            match sched.pending.as_ref() {
                Some(p) if p.generation == generation => sched.pending = None,
                _ => return,
            }
        }

        let ctx = &self.ctx;
        let config = &ctx.config.tab_completion;
        if ctx.ui.lock().continuation_in_progress {
            return;
        }
        if ctx.surface.selection().is_some() || ctx.surface.caret() != offset {
            return;
        }

        let context = ctx.surface.text_before(offset, config.max_context_chars);
        if context.trim().chars().count() < config.min_context_len {
            return;
        }

        let title = ctx.surface.document_title();
        let request = ctx
            .prompts
            .tab_completion_request(&context, title.as_deref(), config);

        tracing::debug!(offset, "issuing tab completion request");
        let started_at = unix_millis_now();
        let result = retry::run_attempts(
            &ctx.registry,
            TaskKind::TabCompletion,
            config.max_retries + 1,
            config.request_timeout(),
            |token| {
                let llm = ctx.llm.clone();
                let request = request.clone();
                async move { llm.generate(request, token).await }
            },
        )
        .await;

        match result {
            Ok(response) => {
                if let Some(text) = postprocess(&response.content, config.max_suggestion_len) {
                    let mut ui = ctx.ui.lock();
                    let world_unchanged = ctx.surface.caret() == offset
                        && ctx.surface.selection().is_none()
                        && !ui.continuation_in_progress;
                    if world_unchanged {
                        ui.show_suggestion(SuggestionSource::Tab, offset, text);
                    }
                }
                ctx.record_invocation(SURFACE_LABEL, started_at, InvocationOutcome::Success, None);
            }
            Err(AttemptError::Cancelled) => {
                ctx.record_invocation(SURFACE_LABEL, started_at, InvocationOutcome::Aborted, None);
            }
            Err(AttemptError::TimedOut) => {
                tracing::debug!("tab completion gave up after timeout");
                ctx.record_invocation(
                    SURFACE_LABEL,
                    started_at,
                    InvocationOutcome::Error,
                    Some("request timed out".into()),
                );
            }
            Err(AttemptError::Failed(err)) => {
                tracing::warn!(%err, "tab completion failed");
                ctx.record_invocation(
                    SURFACE_LABEL,
                    started_at,
                    InvocationOutcome::Error,
                    Some(err.to_string()),
                );
            }
        }
    }
}

/// Normalize a raw completion into displayable ghost text, or discard it.
fn postprocess(content: &str, max_len: usize) -> Option<String> {
    let normalized = content.replace("\r\n", "\n");
    let trimmed = normalized.trim_end();
    if trimmed.trim().is_empty() {
        return None;
    }
    // Leading line breaks look awkward in ghost text.
    let mut text = trimmed.trim_start().to_string();
    if text.len() > max_len {
        let mut cut = max_len;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, TabCompletionConfig};
    use crate::testing::Harness;
    use ghostwriter_llm::mock::ScriptedReply;
    use ghostwriter_llm::LlmError;
    use std::time::Duration;

    const CONTEXT: &str = "The quick brown fox prepares to jump. ";

    fn config_with(tab: TabCompletionConfig) -> EngineConfig {
        EngineConfig {
            tab_completion: tab,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_postprocess_pipeline() {
        assert_eq!(postprocess("  \n\t ", 240), None);
        assert_eq!(postprocess("", 240), None);
        assert_eq!(
            postprocess("\n\nfox jumps  \r\n", 240),
            Some("fox jumps".into())
        );
        assert_eq!(postprocess("abcdef", 4), Some("abcd".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_burst_into_one_fetch() {
        let h = Harness::new();
        h.surface.set_text(CONTEXT);
        h.llm.push_completion("fox jumps");

        for c in "abcde".chars() {
            h.type_char(c);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(3200)).await;
        h.settle().await;

        assert_eq!(h.llm.generate_calls(), 1);
        assert_eq!(h.surface.ghost_text(), Some("fox jumps".into()));
        let active = h.engine.active_suggestion().unwrap();
        assert_eq!(active.source, SuggestionSource::Tab);
        assert_eq!(active.anchor, h.surface.caret());
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_context_aborts_silently() {
        let h = Harness::new();
        h.surface.set_text("hi. ");
        h.type_char('x');
        tokio::time::sleep(Duration::from_millis(3200)).await;
        h.settle().await;
        assert_eq!(h.llm.generate_calls(), 0);
        assert!(h.surface.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_only_result_discarded() {
        let h = Harness::new();
        h.surface.set_text(CONTEXT);
        h.llm.push_completion("   \n  ");
        h.type_char('x');
        tokio::time::sleep(Duration::from_millis(3200)).await;
        h.settle().await;
        assert!(h.surface.ghost_text().is_none());
        // The lifecycle still completed.
        assert_eq!(h.surface.records().len(), 1);
        assert_eq!(h.surface.records()[0].outcome, InvocationOutcome::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_truncated_to_max_suggestion_len() {
        let h = Harness::with_config(config_with(TabCompletionConfig {
            max_suggestion_len: 10,
            ..TabCompletionConfig::default()
        }));
        h.surface.set_text(CONTEXT);
        h.llm.push_completion("a very long suggestion that keeps going");
        h.type_char('x');
        tokio::time::sleep(Duration::from_millis(3200)).await;
        h.settle().await;
        assert_eq!(h.surface.ghost_text(), Some("a very lon".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_caret_moved_before_fire_skips_fetch() {
        let h = Harness::new();
        h.surface.set_text(CONTEXT);
        h.type_char('x');
        // Caret drifts away before the debounce elapses.
        h.surface.set_caret(3);
        h.engine.selection_changed();
        tokio::time::sleep(Duration::from_millis(3200)).await;
        h.settle().await;
        assert_eq!(h.llm.generate_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caret_moved_after_fetch_drops_display() {
        let h = Harness::new();
        h.surface.set_text(CONTEXT);
        h.llm.push(ScriptedReply::CompleteAfter(
            Duration::from_millis(500),
            Ok(ghostwriter_llm::CompletionResponse {
                content: "fox jumps".into(),
                model: "scripted".into(),
                stop_reason: None,
            }),
        ));
        h.type_char('x');
        tokio::time::sleep(Duration::from_millis(3100)).await;
        // Fetch is in flight; move the caret without a document change.
        h.surface.set_caret(3);
        tokio::time::sleep(Duration::from_millis(600)).await;
        h.settle().await;
        assert_eq!(h.llm.generate_calls(), 1);
        assert!(h.surface.ghost_text().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retries_once_then_reports_error() {
        let h = Harness::with_config(config_with(TabCompletionConfig {
            request_timeout_ms: 1000,
            max_retries: 1,
            ..TabCompletionConfig::default()
        }));
        h.surface.set_text(CONTEXT);
        h.llm.push(ScriptedReply::Pending);
        h.llm.push(ScriptedReply::Pending);
        h.type_char('x');
        tokio::time::sleep(Duration::from_millis(3100 + 2 * 1000 + 200)).await;
        h.settle().await;

        assert_eq!(h.llm.generate_calls(), 2);
        assert!(h.surface.ghost_text().is_none());
        let records = h.surface.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, InvocationOutcome::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_error_is_silent_and_final() {
        let h = Harness::new();
        h.surface.set_text(CONTEXT);
        h.llm
            .push(ScriptedReply::Complete(Err(LlmError::Api("boom".into()))));
        h.type_char('x');
        tokio::time::sleep(Duration::from_millis(3200)).await;
        h.settle().await;

        assert_eq!(h.llm.generate_calls(), 1);
        assert!(h.surface.ghost_text().is_none());
        assert!(h.surface.notices().is_empty());
        let records = h.surface.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, InvocationOutcome::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_keystroke_cancels_inflight_fetch() {
        let h = Harness::new();
        h.surface.set_text(CONTEXT);
        h.llm.push(ScriptedReply::Pending);
        h.llm.push_completion("second answer");

        h.type_char('x');
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(h.engine.registry().count_kind(TaskKind::TabCompletion), 1);

        // Next keystroke cancels the in-flight task and re-debounces.
        h.type_char('y');
        h.settle().await;
        assert_eq!(h.engine.registry().count_kind(TaskKind::TabCompletion), 0);

        tokio::time::sleep(Duration::from_millis(3200)).await;
        h.settle().await;
        assert_eq!(h.llm.generate_calls(), 2);
        assert_eq!(h.surface.ghost_text(), Some("second answer".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_scheduler_never_fetches() {
        let h = Harness::with_config(config_with(TabCompletionConfig {
            enabled: false,
            ..TabCompletionConfig::default()
        }));
        h.surface.set_text(CONTEXT);
        h.type_char('x');
        tokio::time::sleep(Duration::from_secs(4)).await;
        h.settle().await;
        assert_eq!(h.llm.generate_calls(), 0);
    }
}
