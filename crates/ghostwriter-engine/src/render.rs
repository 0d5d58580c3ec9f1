//! Suggestion renderer: maps suggestions and thinking indicators onto host
//! decorations.
//!
//! Exactly one decoration may be visible at any moment — a new `show_*`
//! implicitly clears the prior one, whichever kind it was. The renderer
//! only tracks position; deciding *whether* an edit invalidates the
//! suggestion is the caller's job.

use std::sync::Arc;

use ghostwriter_types::DocChange;

use crate::surface::{DecorationHost, DecorationId};

/// What a decoration displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderable {
    /// Non-editable ghost text at the caret.
    Ghost { text: String },
    /// Transient "working" affordance shown between request start and first
    /// received content.
    Thinking {
        label: String,
        preview: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ghost,
    Thinking,
}

struct Visible {
    id: DecorationId,
    anchor: usize,
    kind: Kind,
}

/// Owns the single visible decoration slot.
pub struct SuggestionRenderer {
    host: Arc<dyn DecorationHost>,
    visible: Option<Visible>,
}

impl SuggestionRenderer {
    /// Create a renderer over the host's decoration capability.
    pub fn new(host: Arc<dyn DecorationHost>) -> Self {
        Self {
            host,
            visible: None,
        }
    }

    /// Show ghost text at `anchor`, replacing anything visible.
    pub fn show_ghost(&mut self, anchor: usize, text: &str) {
        self.clear();
        let id = self.host.show(
            anchor,
            Renderable::Ghost {
                text: text.to_string(),
            },
        );
        self.visible = Some(Visible {
            id,
            anchor,
            kind: Kind::Ghost,
        });
    }

    /// Show a thinking indicator at `anchor`, replacing anything visible.
    pub fn show_thinking(&mut self, anchor: usize, label: &str, preview: Option<&str>) {
        self.clear();
        let id = self.host.show(
            anchor,
            Renderable::Thinking {
                label: label.to_string(),
                preview: preview.map(str::to_string),
            },
        );
        self.visible = Some(Visible {
            id,
            anchor,
            kind: Kind::Thinking,
        });
    }

    /// Remove whatever is visible.
    pub fn clear(&mut self) {
        if let Some(visible) = self.visible.take() {
            self.host.remove(visible.id);
        }
    }

    /// Remove the decoration only if it is ghost text.
    pub fn clear_ghost(&mut self) {
        if matches!(self.visible, Some(Visible { kind: Kind::Ghost, .. })) {
            self.clear();
        }
    }

    /// Remove the decoration only if it is a thinking indicator.
    pub fn clear_thinking(&mut self) {
        if matches!(
            self.visible,
            Some(Visible {
                kind: Kind::Thinking,
                ..
            })
        ) {
            self.clear();
        }
    }

    /// Carry the visible decoration's anchor through a document change.
    pub fn remap(&mut self, change: &DocChange) {
        if let Some(visible) = self.visible.as_mut() {
            visible.anchor = change.map_offset(visible.anchor);
        }
    }

    /// Anchor of the visible decoration, if any.
    pub fn anchor(&self) -> Option<usize> {
        self.visible.as_ref().map(|v| v.anchor)
    }

    /// Whether any decoration is visible.
    pub fn has_visible(&self) -> bool {
        self.visible.is_some()
    }

    /// Whether the visible decoration is a thinking indicator.
    pub fn is_thinking(&self) -> bool {
        matches!(
            self.visible,
            Some(Visible {
                kind: Kind::Thinking,
                ..
            })
        )
    }
}
