//! In-memory host implementations for tests.
//!
//! [`MemorySurface`] implements the full host capability set over a plain
//! string buffer and records everything the engine does to it (decorations,
//! panels, notices, telemetry). [`Harness`] wires it to an engine and a
//! scripted model client.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use ghostwriter_llm::mock::ScriptedClient;
use ghostwriter_types::{DocChange, InvocationRecord, KeyEvent, PanelKind, SuggestionSource};

use crate::config::EngineConfig;
use crate::engine::{Engine, HostBindings, KeyVerdict};
use crate::prompts::DefaultPrompts;
use crate::render::Renderable;
use crate::surface::{
    DecorationHost, DecorationId, EditorSurface, InvocationSink, NoticeSink, PanelHost,
};

#[derive(Default)]
struct SurfaceState {
    text: String,
    caret: usize,
    selection: Option<(usize, usize)>,
    title: Option<String>,
    next_decoration: u64,
    decorations: HashMap<u64, (usize, Renderable)>,
    open_panels: Vec<(PanelKind, usize)>,
    notices: Vec<String>,
    records: Vec<InvocationRecord>,
    fail_telemetry: bool,
}

/// Scripted in-memory editing surface implementing every host trait.
#[derive(Default)]
pub(crate) struct MemorySurface {
    state: Mutex<SurfaceState>,
}

impl MemorySurface {
    pub fn new(text: &str) -> Arc<Self> {
        let surface = Arc::new(Self::default());
        surface.set_text(text);
        surface.state.lock().caret = 0;
        surface
    }

    /// Replace the whole document; the caret lands at the end.
    pub fn set_text(&self, text: &str) {
        let mut state = self.state.lock();
        state.text = text.to_string();
        state.caret = text.len();
        state.selection = None;
    }

    pub fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    pub fn caret(&self) -> usize {
        self.state.lock().caret
    }

    pub fn set_caret(&self, offset: usize) {
        let mut state = self.state.lock();
        state.caret = offset.min(state.text.len());
        state.selection = None;
    }

    pub fn select(&self, from: usize, to: usize) {
        let mut state = self.state.lock();
        state.selection = Some((from, to));
        state.caret = to;
    }

    /// Insert at the caret the way host typing would, returning the change
    /// the host would report.
    pub fn insert_at_caret(&self, s: &str) -> DocChange {
        let mut state = self.state.lock();
        let at = state.caret;
        state.text.insert_str(at, s);
        state.caret = at + s.len();
        DocChange::insertion(at, s.len())
    }

    pub fn set_title(&self, title: &str) {
        self.state.lock().title = Some(title.to_string());
    }

    pub fn fail_telemetry(&self, fail: bool) {
        self.state.lock().fail_telemetry = fail;
    }

    pub fn decoration_count(&self) -> usize {
        self.state.lock().decorations.len()
    }

    /// The displayed ghost text, if any.
    pub fn ghost_text(&self) -> Option<String> {
        self.state
            .lock()
            .decorations
            .values()
            .find_map(|(_, r)| match r {
                Renderable::Ghost { text } => Some(text.clone()),
                Renderable::Thinking { .. } => None,
            })
    }

    /// The displayed thinking indicator, if any.
    pub fn thinking(&self) -> Option<(String, Option<String>)> {
        self.state
            .lock()
            .decorations
            .values()
            .find_map(|(_, r)| match r {
                Renderable::Thinking { label, preview } => {
                    Some((label.clone(), preview.clone()))
                }
                Renderable::Ghost { .. } => None,
            })
    }

    pub fn open_panels(&self) -> Vec<(PanelKind, usize)> {
        self.state.lock().open_panels.clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.state.lock().notices.clone()
    }

    pub fn records(&self) -> Vec<InvocationRecord> {
        self.state.lock().records.clone()
    }
}

impl EditorSurface for MemorySurface {
    fn caret(&self) -> usize {
        MemorySurface::caret(self)
    }

    fn selection(&self) -> Option<(usize, usize)> {
        self.state.lock().selection.filter(|(from, to)| from != to)
    }

    fn doc_len(&self) -> usize {
        self.state.lock().text.len()
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        let state = self.state.lock();
        state.text.get(offset..).and_then(|s| s.chars().next())
    }

    fn line_start(&self, offset: usize) -> usize {
        let state = self.state.lock();
        let offset = offset.min(state.text.len());
        state.text[..offset].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_text(&self, offset: usize) -> String {
        let state = self.state.lock();
        let offset = offset.min(state.text.len());
        let start = state.text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let end = state.text[start..]
            .find('\n')
            .map_or(state.text.len(), |i| start + i);
        state.text[start..end].to_string()
    }

    fn text_in(&self, from: usize, to: usize) -> String {
        let state = self.state.lock();
        let to = to.min(state.text.len());
        let from = from.min(to);
        state.text[from..to].to_string()
    }

    fn text_before(&self, offset: usize, max_chars: usize) -> String {
        let state = self.state.lock();
        let offset = offset.min(state.text.len());
        let head = &state.text[..offset];
        let count = head.chars().count();
        if count <= max_chars {
            head.to_string()
        } else {
            head.chars().skip(count - max_chars).collect()
        }
    }

    fn document_title(&self) -> Option<String> {
        self.state.lock().title.clone()
    }

    fn replace_range(&self, from: usize, to: usize, text: &str) {
        let mut state = self.state.lock();
        let doc_len = state.text.len();
        let to = to.min(doc_len);
        let from = from.min(to);
        state.text.replace_range(from..to, text);
        let len = state.text.len();
        if state.caret > len {
            state.caret = len;
        }
    }

    fn set_caret(&self, offset: usize) {
        MemorySurface::set_caret(self, offset)
    }
}

impl DecorationHost for MemorySurface {
    fn show(&self, anchor: usize, renderable: Renderable) -> DecorationId {
        let mut state = self.state.lock();
        state.next_decoration += 1;
        let id = state.next_decoration;
        state.decorations.insert(id, (anchor, renderable));
        DecorationId(id)
    }

    fn remove(&self, id: DecorationId) {
        self.state.lock().decorations.remove(&id.0);
    }
}

impl PanelHost for MemorySurface {
    fn open_panel(&self, kind: PanelKind, anchor: usize) {
        let mut state = self.state.lock();
        state.open_panels.retain(|(k, _)| *k != kind);
        state.open_panels.push((kind, anchor));
    }

    fn close_panel(&self, kind: PanelKind) {
        self.state.lock().open_panels.retain(|(k, _)| *k != kind);
    }
}

impl NoticeSink for MemorySurface {
    fn notice(&self, message: &str) {
        self.state.lock().notices.push(message.to_string());
    }
}

impl InvocationSink for MemorySurface {
    fn record(&self, record: InvocationRecord) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        if state.fail_telemetry {
            anyhow::bail!("telemetry sink unavailable");
        }
        state.records.push(record);
        Ok(())
    }
}

/// An engine wired to a [`MemorySurface`] and a [`ScriptedClient`].
pub(crate) struct Harness {
    pub engine: Engine,
    pub surface: Arc<MemorySurface>,
    pub llm: Arc<ScriptedClient>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let surface = MemorySurface::new("");
        let llm = ScriptedClient::new();
        let engine = Engine::new(
            config,
            HostBindings {
                surface: surface.clone(),
                decorations: surface.clone(),
                panels: surface.clone(),
                notices: surface.clone(),
                telemetry: surface.clone(),
            },
            Arc::new(DefaultPrompts),
            llm.clone(),
        );
        Self {
            engine,
            surface,
            llm,
        }
    }

    /// One host keystroke: consult the engine, insert on passthrough,
    /// report the change.
    pub fn type_char(&self, c: char) {
        if self.engine.handle_key(&KeyEvent::ch(c)) == KeyVerdict::Passthrough {
            let change = self.surface.insert_at_caret(&c.to_string());
            self.engine.document_changed(&change);
        }
    }

    /// Inject a displayed tab-sourced suggestion directly.
    pub fn show_tab_suggestion(&self, anchor: usize, text: &str) {
        let mut ui = self.engine.ctx().ui.lock();
        ui.show_suggestion(SuggestionSource::Tab, anchor, text.to_string());
    }

    /// Let spawned orchestration tasks run to their next suspension point.
    pub async fn settle(&self) {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }
}
