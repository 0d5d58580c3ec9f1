//! Document change descriptions and offset remapping.
//!
//! A [`DocChange`] describes one edit as a replacement: the byte range
//! `[from, to)` of the *old* document was replaced by `insert_len` bytes.
//! Anchors that must stay meaningful across edits (ghost-text positions,
//! panel positions, thinking indicators) are carried forward with
//! [`DocChange::map_offset`] rather than stored as fixed indices.

use serde::{Deserialize, Serialize};

/// One document edit: old range `[from, to)` replaced by `insert_len` bytes.
///
/// Offsets are byte offsets into the document, always on char boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocChange {
    /// Start of the replaced range in the old document.
    pub from: usize,
    /// End of the replaced range in the old document (exclusive).
    pub to: usize,
    /// Length of the inserted text.
    pub insert_len: usize,
}

impl DocChange {
    /// A pure insertion of `len` bytes at `at`.
    pub fn insertion(at: usize, len: usize) -> Self {
        Self {
            from: at,
            to: at,
            insert_len: len,
        }
    }

    /// A pure deletion of the range `[from, to)`.
    pub fn deletion(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            insert_len: 0,
        }
    }

    /// A replacement of `[from, to)` by `insert_len` bytes.
    pub fn replacement(from: usize, to: usize, insert_len: usize) -> Self {
        Self {
            from,
            to,
            insert_len,
        }
    }

    /// Net length change of the document.
    pub fn shift(&self) -> isize {
        self.insert_len as isize - (self.to - self.from) as isize
    }

    /// Map an old-document offset to the new document.
    ///
    /// Offsets strictly before the replaced range are unchanged; offsets at
    /// or after its end are shifted; offsets inside the replaced range
    /// collapse to the start of the change. An insertion exactly at the
    /// offset pushes it after the inserted text.
    pub fn map_offset(&self, offset: usize) -> usize {
        if offset < self.from {
            offset
        } else if offset >= self.to {
            offset - (self.to - self.from) + self.insert_len
        } else {
            self.from
        }
    }

    /// Whether the edit touches the given anchor (replaces it, inserts at
    /// it, or deletes across it). Used by callers to decide invalidation —
    /// the mapping above stays mechanical.
    pub fn touches(&self, anchor: usize) -> bool {
        anchor >= self.from && anchor <= self.to
    }
}
