//! Keystrokes as seen by the trigger detector and accept/reject bindings.

use serde::{Deserialize, Serialize};

/// A logical key, independent of the host's input backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// Tab (the accept binding).
    Tab,
    /// Shift-Tab as a distinct key, the way terminal backends report it.
    BackTab,
    /// Escape (reject / global cancel).
    Escape,
    /// Enter / Return.
    Enter,
    /// Backspace.
    Backspace,
    /// Anything else the engine has no interest in.
    Other,
}

/// A keystroke: the key plus modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyEvent {
    /// A plain keystroke with no modifiers.
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    /// A plain character keystroke.
    pub fn ch(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    /// Set the shift modifier.
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Set the ctrl modifier.
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Any modifier other than Shift is held.
    ///
    /// Shift is exempt so that shifted characters (`@`, `?`) can still
    /// participate in triggers.
    pub fn has_blocking_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }

    /// The printable character of this keystroke, if any.
    pub fn as_char(&self) -> Option<char> {
        match self.key {
            Key::Char(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this is the reject binding (Shift-Tab in either encoding).
    pub fn is_shift_tab(&self) -> bool {
        matches!(self.key, Key::BackTab) || (matches!(self.key, Key::Tab) && self.shift)
    }
}
