//! Event wiring between a host and the engine.
//!
//! Hosts that surface their input as registration calls (`on_key_down`,
//! `on_document_change`, ...) are wired through [`wire`], which returns one
//! [`Subscriptions`] bundle. Every registration is an explicit
//! [`Subscription`] object disposed deterministically — dropping the bundle
//! (or the engine owner calling [`Subscriptions::dispose`]) detaches every
//! listener; nothing is left registered implicitly.
//!
//! Hosts that prefer to push notifications can skip this module and call
//! the [`Engine`] methods directly.

use std::sync::Arc;

use ghostwriter_types::{DocChange, KeyEvent};

use crate::engine::{Engine, KeyVerdict};

/// One registered listener; unsubscribes when dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap an unsubscribe closure.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now instead of at drop.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Keydown handlers get the event and answer with a verdict so the host
/// can suppress default insertion on [`KeyVerdict::Consumed`].
pub type KeyDownHandler = Box<dyn Fn(&KeyEvent) -> KeyVerdict + Send + Sync>;
/// Document-change handlers get the change that was applied.
pub type DocChangeHandler = Box<dyn Fn(&DocChange) + Send + Sync>;
/// Parameterless notification handlers.
pub type NotifyHandler = Box<dyn Fn() + Send + Sync>;

/// Host-side event registration capabilities.
pub trait SurfaceEvents {
    /// Intercept keydown before it mutates the buffer.
    fn on_key_down(&self, handler: KeyDownHandler) -> Subscription;
    /// Observe applied document changes.
    fn on_document_change(&self, handler: DocChangeHandler) -> Subscription;
    /// Observe caret/selection movement without a document change.
    fn on_selection_change(&self, handler: NotifyHandler) -> Subscription;
    /// Observe the editing surface gaining or losing focus.
    fn on_focus_change(&self, handler: NotifyHandler) -> Subscription;
    /// The global cancel key, independent of editor focus.
    fn on_global_cancel(&self, handler: NotifyHandler) -> Subscription;
}

/// The engine's listeners, torn down as one unit.
pub struct Subscriptions {
    subscriptions: Vec<Subscription>,
}

impl Subscriptions {
    /// Detach every listener now.
    pub fn dispose(self) {
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

/// Register the engine on every host event source.
pub fn wire(engine: Arc<Engine>, events: &dyn SurfaceEvents) -> Subscriptions {
    let subscriptions = vec![
        events.on_key_down({
            let engine = engine.clone();
            Box::new(move |event| engine.handle_key(event))
        }),
        events.on_document_change({
            let engine = engine.clone();
            Box::new(move |change| engine.document_changed(change))
        }),
        events.on_selection_change({
            let engine = engine.clone();
            Box::new(move || engine.selection_changed())
        }),
        events.on_focus_change({
            let engine = engine.clone();
            Box::new(move || engine.focus_changed())
        }),
        events.on_global_cancel(Box::new(move || engine.global_cancel())),
    ];
    Subscriptions { subscriptions }
}
