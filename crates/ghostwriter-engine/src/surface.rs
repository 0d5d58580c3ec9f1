//! Host capability traits.
//!
//! The engine depends on the editing surface only through this narrow set,
//! injected as trait objects at construction. Implementations must not call
//! back into the engine synchronously from inside these methods — the
//! engine may hold internal locks while invoking them. Deliver
//! document-change and key notifications from the host event loop instead.

use ghostwriter_types::{InvocationRecord, PanelKind};

use crate::render::Renderable;

/// Opaque handle for one displayed decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecorationId(pub u64);

/// The host's text buffer and caret, read-mostly.
///
/// Offsets are byte offsets on char boundaries. The engine mutates the
/// buffer only through [`replace_range`](EditorSurface::replace_range) and
/// only in the three sanctioned places: user typing is the host's own
/// business, Accept inserts the suggestion, and the trigger detector
/// deletes partial trigger characters.
pub trait EditorSurface: Send + Sync {
    /// Current caret offset.
    fn caret(&self) -> usize;

    /// Current selection as `(from, to)` with `from < to`, or `None` when
    /// the caret is collapsed.
    fn selection(&self) -> Option<(usize, usize)>;

    /// Document length in bytes.
    fn doc_len(&self) -> usize;

    /// The character starting at `offset`, if any.
    fn char_at(&self, offset: usize) -> Option<char>;

    /// Offset of the start of the line containing `offset`.
    fn line_start(&self, offset: usize) -> usize;

    /// Full text of the line containing `offset`, without the newline.
    fn line_text(&self, offset: usize) -> String;

    /// Text of the range `[from, to)`.
    fn text_in(&self, from: usize, to: usize) -> String;

    /// Up to `max_chars` characters of text ending at `offset` (the tail —
    /// most recent content — when the preceding text is longer).
    fn text_before(&self, offset: usize, max_chars: usize) -> String;

    /// A derivable document title (file basename or similar), if any.
    fn document_title(&self) -> Option<String>;

    /// Replace `[from, to)` with `text`.
    fn replace_range(&self, from: usize, to: usize, text: &str);

    /// Move the caret, collapsing any selection.
    fn set_caret(&self, offset: usize);
}

/// Renders non-interactive decorations anchored at document offsets.
///
/// Decorations must never be selectable, editable, or counted as document
/// content.
pub trait DecorationHost: Send + Sync {
    /// Show a decoration at `anchor`; returns a handle for removal.
    fn show(&self, anchor: usize, renderable: Renderable) -> DecorationId;

    /// Remove a previously shown decoration.
    fn remove(&self, id: DecorationId);
}

/// Opens and closes the auxiliary panels the trigger detector controls.
pub trait PanelHost: Send + Sync {
    /// Open a panel anchored at `anchor`. The host reports the panel
    /// closing back through [`Engine::panel_closed`](crate::Engine::panel_closed).
    fn open_panel(&self, kind: PanelKind, anchor: usize);

    /// Close a panel if it is open. Idempotent.
    fn close_panel(&self, kind: PanelKind);
}

/// Brief, dismissible user-facing notices ("No continuation generated.").
pub trait NoticeSink: Send + Sync {
    fn notice(&self, message: &str);
}

/// Fire-and-forget telemetry sink, invoked exactly once per tab-completion
/// or continuation lifecycle. Failures are caught and logged by the engine,
/// never allowed to mask the primary outcome.
pub trait InvocationSink: Send + Sync {
    fn record(&self, record: InvocationRecord) -> anyhow::Result<()>;
}
