//! The orchestration context object and host-facing API.
//!
//! One [`Engine`] per editing session, explicitly constructed with the
//! host's capabilities and disposed when the session ends. The host feeds
//! it keystrokes and change notifications; the engine feeds back consumed
//! verdicts, decorations, panel openings, notices, and telemetry records.
//!
//! Construction and every scheduling entry point must run inside a tokio
//! runtime; debounce and request work is spawned onto it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use ghostwriter_llm::LlmClient;
use ghostwriter_types::telemetry::unix_millis_now;
use ghostwriter_types::{
    DocChange, InlineSuggestion, InvocationOutcome, InvocationRecord, KeyEvent, PanelKind,
    SuggestionSource,
};

use crate::accept;
use crate::cancel::CancelRegistry;
use crate::config::EngineConfig;
use crate::continuation;
use crate::prompts::PromptSource;
use crate::render::SuggestionRenderer;
use crate::surface::{DecorationHost, EditorSurface, InvocationSink, NoticeSink, PanelHost};
use crate::tab::TabScheduler;
use crate::trigger::{TriggerAction, TriggerDetector};

/// What the engine decided about a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyVerdict {
    /// The engine acted on the key; the host must not insert it.
    Consumed,
    /// Normal editor behavior applies.
    Passthrough,
}

/// The host capabilities injected into the engine.
pub struct HostBindings {
    pub surface: Arc<dyn EditorSurface>,
    pub decorations: Arc<dyn DecorationHost>,
    pub panels: Arc<dyn PanelHost>,
    pub notices: Arc<dyn NoticeSink>,
    pub telemetry: Arc<dyn InvocationSink>,
}

/// Shared orchestration context: config snapshot, collaborators, the
/// cancellation registry, and the single mutable UI slot.
pub(crate) struct EngineCtx {
    pub config: EngineConfig,
    pub surface: Arc<dyn EditorSurface>,
    pub panels: Arc<dyn PanelHost>,
    pub notices: Arc<dyn NoticeSink>,
    pub telemetry: Arc<dyn InvocationSink>,
    pub prompts: Arc<dyn PromptSource>,
    pub llm: Arc<dyn LlmClient>,
    pub registry: CancelRegistry,
    pub ui: Mutex<UiState>,
}

impl EngineCtx {
    /// Emit one terminal telemetry record. Sink failures are logged, never
    /// allowed to mask the primary outcome.
    pub(crate) fn record_invocation(
        &self,
        surface: &str,
        started_at_ms: u64,
        outcome: InvocationOutcome,
        error_message: Option<String>,
    ) {
        let record = InvocationRecord {
            surface: surface.to_string(),
            started_at_ms,
            ended_at_ms: unix_millis_now(),
            outcome,
            error_message,
        };
        if let Err(err) = self.telemetry.record(record) {
            tracing::warn!(%err, "failed to record invocation");
        }
    }
}

/// The single mutable UI slot: at most one visible suggestion or thinking
/// indicator, at most one tracked open panel.
pub(crate) struct UiState {
    pub renderer: SuggestionRenderer,
    pub active: Option<InlineSuggestion>,
    pub open_panel: Option<(PanelKind, usize)>,
    pub continuation_in_progress: bool,
}

impl UiState {
    /// Clear a displayed ghost suggestion, leaving a thinking indicator
    /// alone.
    pub fn clear_suggestion(&mut self) {
        self.renderer.clear_ghost();
        self.active = None;
    }

    /// Display `text` as the one visible suggestion.
    pub fn show_suggestion(&mut self, source: SuggestionSource, anchor: usize, text: String) {
        self.renderer.show_ghost(anchor, &text);
        self.active = Some(InlineSuggestion {
            source,
            anchor,
            text,
        });
    }

    /// Whether the displayed suggestion is the given one.
    pub fn suggestion_matches(&self, source: SuggestionSource, anchor: usize) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.source == source && a.anchor == anchor)
    }
}

/// The inline suggestion and trigger orchestration engine.
pub struct Engine {
    ctx: Arc<EngineCtx>,
    tab: TabScheduler,
    detector: Mutex<TriggerDetector>,
    disposed: AtomicBool,
}

impl Engine {
    /// Construct an engine over the host's capabilities. `config` is an
    /// immutable snapshot; build a new engine to apply changed settings.
    pub fn new(
        config: EngineConfig,
        host: HostBindings,
        prompts: Arc<dyn PromptSource>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let renderer = SuggestionRenderer::new(host.decorations);
        let detector = TriggerDetector::new(config.trigger.clone());
        let ctx = Arc::new(EngineCtx {
            config,
            surface: host.surface,
            panels: host.panels,
            notices: host.notices,
            telemetry: host.telemetry,
            prompts,
            llm,
            registry: CancelRegistry::new(),
            ui: Mutex::new(UiState {
                renderer,
                active: None,
                open_panel: None,
                continuation_in_progress: false,
            }),
        });
        Self {
            tab: TabScheduler::new(ctx.clone()),
            ctx,
            detector: Mutex::new(detector),
            disposed: AtomicBool::new(false),
        }
    }

    /// Evaluate one keystroke: accept/reject bindings first (only active
    /// while a suggestion exists), then trigger detection.
    pub fn handle_key(&self, event: &KeyEvent) -> KeyVerdict {
        if self.is_disposed() {
            return KeyVerdict::Passthrough;
        }
        if let Some(verdict) = accept::on_suggestion_key(&self.ctx, &self.tab, event) {
            return verdict;
        }
        let action = self
            .detector
            .lock()
            .on_key(event, self.ctx.surface.as_ref(), Instant::now());
        match action {
            TriggerAction::Passthrough => KeyVerdict::Passthrough,
            TriggerAction::OpenPanel { kind, anchor } => {
                self.open_panel(kind, anchor);
                KeyVerdict::Consumed
            }
        }
    }

    /// The host made (or relayed) a document edit. Displayed ghost text is
    /// invalidated, surviving decorations and panel anchors are remapped,
    /// and the tab-completion debounce restarts.
    pub fn document_changed(&self, change: &DocChange) {
        if self.is_disposed() {
            return;
        }
        {
            let mut ui = self.ctx.ui.lock();
            ui.clear_suggestion();
            ui.renderer.remap(change);
            if let Some((_, anchor)) = ui.open_panel.as_mut() {
                *anchor = change.map_offset(*anchor);
            }
        }
        self.tab.on_document_changed();
    }

    /// The caret or selection changed without a document edit. A caret that
    /// left the suggestion's anchor invalidates it; the smart-space panel
    /// closes when the caret leaves its anchor.
    pub fn selection_changed(&self) {
        if self.is_disposed() {
            return;
        }
        let caret = self.ctx.surface.caret();
        let has_selection = self.ctx.surface.selection().is_some();
        if has_selection {
            self.detector.lock().discard_watches();
        }
        let close_smart_space = {
            let mut ui = self.ctx.ui.lock();
            if let Some(active) = &ui.active {
                if has_selection || caret != active.anchor {
                    ui.clear_suggestion();
                }
            }
            match ui.open_panel {
                Some((PanelKind::SmartSpace, anchor)) if has_selection || caret != anchor => {
                    ui.open_panel = None;
                    true
                }
                _ => false,
            }
        };
        if close_smart_space {
            self.ctx.panels.close_panel(PanelKind::SmartSpace);
        }
        self.tab.on_caret_moved(caret);
    }

    /// The editing surface lost or changed focus: pending schedules and
    /// displayed suggestions do not survive it.
    pub fn focus_changed(&self) {
        if self.is_disposed() {
            return;
        }
        self.detector.lock().discard_watches();
        self.tab.invalidate();
        self.ctx.ui.lock().clear_suggestion();
    }

    /// Explicit "continue writing" entry point for UI callers. Always
    /// preempts everything in flight, including another continuation.
    pub fn request_continuation(
        &self,
        instruction: Option<String>,
        explicit_context: Option<String>,
    ) {
        if self.is_disposed() {
            return;
        }
        continuation::request(&self.ctx, instruction, explicit_context);
    }

    /// The focus-independent cancel key: cancel every in-flight task and
    /// tear down transient UI.
    pub fn global_cancel(&self) {
        self.ctx.registry.cancel_all();
        let mut ui = self.ctx.ui.lock();
        ui.active = None;
        ui.renderer.clear();
    }

    /// The host reports an auxiliary panel closing.
    pub fn panel_closed(&self, kind: PanelKind) {
        let mut ui = self.ctx.ui.lock();
        if matches!(ui.open_panel, Some((open, _)) if open == kind) {
            ui.open_panel = None;
        }
    }

    /// Tear the engine down: cancel everything, clear decorations, close
    /// panels. Idempotent; the engine ignores calls afterwards.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tab.invalidate();
        self.ctx.registry.cancel_all();
        let open = {
            let mut ui = self.ctx.ui.lock();
            ui.active = None;
            ui.renderer.clear();
            ui.open_panel.take()
        };
        if let Some((kind, _)) = open {
            self.ctx.panels.close_panel(kind);
        }
    }

    /// The shared cancellation registry.
    pub fn registry(&self) -> &CancelRegistry {
        &self.ctx.registry
    }

    /// The currently displayed suggestion, if any.
    pub fn active_suggestion(&self) -> Option<InlineSuggestion> {
        self.ctx.ui.lock().active.clone()
    }

    #[cfg(test)]
    pub(crate) fn ctx(&self) -> &Arc<EngineCtx> {
        &self.ctx
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn open_panel(&self, kind: PanelKind, anchor: usize) {
        // Panels and ghost text are mutually exclusive surfaces, and so are
        // the two panels.
        let previous = {
            let mut ui = self.ctx.ui.lock();
            ui.active = None;
            ui.renderer.clear();
            let previous = ui.open_panel.take().map(|(k, _)| k).filter(|k| *k != kind);
            ui.open_panel = Some((kind, anchor));
            previous
        };
        if let Some(previous) = previous {
            self.ctx.panels.close_panel(previous);
        }
        self.ctx.panels.open_panel(kind, anchor);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.ctx.registry.cancel_all();
    }
}
