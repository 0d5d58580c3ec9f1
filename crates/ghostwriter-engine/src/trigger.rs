//! Trigger detection: keystroke patterns that open auxiliary panels.
//!
//! Intercepts a keystroke before it mutates the buffer and returns a
//! verdict — consume it (delete any partial trigger characters, open a
//! panel) or pass it through. Two trigger families:
//!
//! - **Quick-ask**: a configurable 1–3 character string (default `@`). The
//!   text on the current line up to the caret plus the incoming character
//!   must exactly equal the trigger; partial prefixes keep typing.
//! - **Smart-space**: two recognizers sharing one watch window — slash
//!   then space, and space(s) on a blank line governed by
//!   [`SmartSpaceMode`](crate::config::SmartSpaceMode).
//!
//! A watch tracks an in-progress multi-key sequence (pending offset plus
//! when it was armed); any keystroke that is not one of the recognized
//! keys discards both watches, as does a non-empty selection or a blocking
//! modifier.

use std::time::Instant;

use ghostwriter_types::{KeyEvent, PanelKind};

use crate::config::{SmartSpaceMode, TriggerConfig};
use crate::surface::EditorSurface;

/// Verdict for one keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Let the host insert the key normally.
    Passthrough,
    /// The keystroke was consumed: partial trigger characters are already
    /// deleted and a panel should open at `anchor`.
    OpenPanel { kind: PanelKind, anchor: usize },
}

/// An in-progress multi-key sequence: the offset the first key landed at
/// and when it was pressed.
#[derive(Debug, Clone, Copy)]
struct Watch {
    offset: usize,
    armed_at: Instant,
}

impl Watch {
    fn expired(&self, now: Instant, window: std::time::Duration) -> bool {
        now.duration_since(self.armed_at) > window
    }
}

/// Recognizes trigger keystroke sequences.
pub struct TriggerDetector {
    config: TriggerConfig,
    /// Pending `/` awaiting a space.
    slash_watch: Option<Watch>,
    /// Pending first space on a blank line (double-space mode).
    space_watch: Option<Watch>,
}

impl TriggerDetector {
    /// Create a detector over a config snapshot.
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            slash_watch: None,
            space_watch: None,
        }
    }

    /// Discard both pending watches. Called on unrelated keystrokes and
    /// when the selection becomes non-empty.
    pub fn discard_watches(&mut self) {
        self.slash_watch = None;
        self.space_watch = None;
    }

    /// Evaluate one keystroke against the trigger rules, in precedence
    /// order. Consuming verdicts have already performed their deletions on
    /// `surface` and left the caret at the returned anchor.
    pub fn on_key(
        &mut self,
        event: &KeyEvent,
        surface: &dyn EditorSurface,
        now: Instant,
    ) -> TriggerAction {
        if event.has_blocking_modifier() {
            self.discard_watches();
            return TriggerAction::Passthrough;
        }
        let Some(ch) = event.as_char() else {
            self.discard_watches();
            return TriggerAction::Passthrough;
        };
        if surface.selection().is_some() {
            self.discard_watches();
            return TriggerAction::Passthrough;
        }

        if let Some(action) = self.quick_ask(ch, surface) {
            return action;
        }
        self.smart_space(ch, surface, now)
    }

    /// Quick-ask trigger. Returns `Some(action)` when the keystroke
    /// completed the trigger; `None` lets evaluation continue (a partial
    /// prefix still falls through so a `/` can arm the slash watch).
    fn quick_ask(&mut self, ch: char, surface: &dyn EditorSurface) -> Option<TriggerAction> {
        let trigger = self.config.effective_quick_ask_trigger()?;

        let caret = surface.caret();
        let line_start = surface.line_start(caret);
        let before = surface.text_in(line_start, caret);

        let mut potential = before.clone();
        potential.push(ch);
        if potential != trigger {
            return None;
        }

        // The existing line text is a strict prefix of the trigger; remove
        // it and open the panel where the trigger began.
        self.discard_watches();
        if !before.is_empty() {
            surface.replace_range(line_start, caret, "");
        }
        surface.set_caret(line_start);
        Some(TriggerAction::OpenPanel {
            kind: PanelKind::QuickAsk,
            anchor: line_start,
        })
    }

    fn smart_space(
        &mut self,
        ch: char,
        surface: &dyn EditorSurface,
        now: Instant,
    ) -> TriggerAction {
        if !self.config.smart_space_enabled {
            self.discard_watches();
            return TriggerAction::Passthrough;
        }
        match ch {
            '/' => {
                self.slash_watch = Some(Watch {
                    offset: surface.caret(),
                    armed_at: now,
                });
                self.space_watch = None;
                TriggerAction::Passthrough
            }
            ' ' => self.on_space(surface, now),
            _ => {
                self.discard_watches();
                TriggerAction::Passthrough
            }
        }
    }

    fn on_space(&mut self, surface: &dyn EditorSurface, now: Instant) -> TriggerAction {
        let window = self.config.watch_window();

        // Slash-then-space: single-use, and the recorded character must
        // still be a slash.
        if let Some(watch) = self.slash_watch.take() {
            if !watch.expired(now, window) && surface.char_at(watch.offset) == Some('/') {
                surface.replace_range(watch.offset, watch.offset + 1, "");
                surface.set_caret(watch.offset);
                self.space_watch = None;
                return TriggerAction::OpenPanel {
                    kind: PanelKind::SmartSpace,
                    anchor: watch.offset,
                };
            }
        }

        // Plain space: only considered on a blank line.
        let caret = surface.caret();
        if !surface.line_text(caret).trim().is_empty() {
            self.space_watch = None;
            return TriggerAction::Passthrough;
        }

        match self.config.smart_space_mode {
            SmartSpaceMode::Off => {
                self.space_watch = None;
                TriggerAction::Passthrough
            }
            SmartSpaceMode::Single => {
                self.space_watch = None;
                TriggerAction::OpenPanel {
                    kind: PanelKind::SmartSpace,
                    anchor: caret,
                }
            }
            SmartSpaceMode::Double => {
                if let Some(watch) = self.space_watch.take() {
                    let is_second_press = !watch.expired(now, window)
                        && watch.offset + 1 == caret
                        && surface.char_at(watch.offset) == Some(' ');
                    if is_second_press {
                        surface.replace_range(watch.offset, watch.offset + 1, "");
                        surface.set_caret(watch.offset);
                        return TriggerAction::OpenPanel {
                            kind: PanelKind::SmartSpace,
                            anchor: watch.offset,
                        };
                    }
                }
                // First press (or a stale watch): let the space insert and
                // arm a watch at the position it will occupy.
                self.space_watch = Some(Watch {
                    offset: caret,
                    armed_at: now,
                });
                TriggerAction::Passthrough
            }
        }
    }
}
