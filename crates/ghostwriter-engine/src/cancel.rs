//! Cancellation registry for in-flight AI tasks.
//!
//! Every AI-initiated request registers here for its lifetime and is
//! removed on completion, error, or explicit cancellation. Cancellation is
//! cooperative: `cancel*` signals the task's [`CancellationToken`] and
//! synchronously removes the bookkeeping — it never waits for the
//! underlying request to actually unwind. After `cancel_all()`,
//! `is_empty()` holds before the next task is registered, even while
//! cancelled requests are still draining asynchronously.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use ghostwriter_types::TaskId;

/// What flow an in-flight task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum TaskKind {
    /// Idle-typing tab completion (one attempt each).
    TabCompletion,
    /// Explicit continuation request.
    Continuation,
    /// Anything else sharing the registry.
    Other,
}

struct Entry {
    kind: TaskKind,
    token: CancellationToken,
}

type Tasks = Arc<Mutex<HashMap<TaskId, Entry>>>;

/// Registry of every in-flight AI task. Cheap to clone; all clones share
/// one task table with a lifetime tied to the editing session.
#[derive(Clone, Default)]
pub struct CancelRegistry {
    tasks: Tasks,
}

impl CancelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task. The returned handle owns the task's token and
    /// deregisters on drop, so completion and error paths need no explicit
    /// bookkeeping.
    pub fn register(&self, kind: TaskKind) -> TaskHandle {
        let id = TaskId::new();
        let token = CancellationToken::new();
        self.tasks.lock().insert(
            id,
            Entry {
                kind,
                token: token.clone(),
            },
        );
        tracing::debug!(task = %id.short(), %kind, "registered ai task");
        TaskHandle {
            id,
            kind,
            token,
            tasks: self.tasks.clone(),
        }
    }

    /// Cancel one task by id. Returns immediately.
    pub fn cancel(&self, id: TaskId) {
        if let Some(entry) = self.tasks.lock().remove(&id) {
            entry.token.cancel();
        }
    }

    /// Cancel every task of one kind. A new tab-completion request uses
    /// this to cancel only the previous tab-completion task, never an
    /// in-flight continuation.
    pub fn cancel_kind(&self, kind: TaskKind) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|id, entry| {
            if entry.kind == kind {
                tracing::debug!(task = %id.short(), %kind, "cancelling ai task");
                entry.token.cancel();
                false
            } else {
                true
            }
        });
    }

    /// Cancel everything: the global cancel key, and the start of every new
    /// continuation request (continuation always preempts).
    pub fn cancel_all(&self) {
        let mut tasks = self.tasks.lock();
        for entry in tasks.values() {
            entry.token.cancel();
        }
        let cancelled = tasks.len();
        tasks.clear();
        if cancelled > 0 {
            tracing::debug!(cancelled, "cancelled all ai tasks");
        }
    }

    /// Whether no tasks are in flight.
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Number of in-flight tasks.
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Number of in-flight tasks of one kind.
    pub fn count_kind(&self, kind: TaskKind) -> usize {
        self.tasks.lock().values().filter(|e| e.kind == kind).count()
    }
}

/// Owning handle for one registered task.
///
/// Holds the task's cancellation token; dropping the handle removes the
/// registry entry (the token itself is left alone — a completed task has
/// nothing to cancel, and an externally-cancelled one already fired).
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    token: CancellationToken,
    tasks: Tasks,
}

impl TaskHandle {
    /// The task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// The cooperative cancellation token shared with the model client.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancel this task and remove it from the registry immediately.
    pub fn cancel(&self) {
        self.token.cancel();
        self.tasks.lock().remove(&self.id);
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.tasks.lock().remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_drop() {
        let registry = CancelRegistry::new();
        assert!(registry.is_empty());

        let handle = registry.register(TaskKind::TabCompletion);
        assert_eq!(registry.len(), 1);
        assert!(!handle.token().is_cancelled());

        drop(handle);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancel_all_clears_bookkeeping_synchronously() {
        let registry = CancelRegistry::new();
        let a = registry.register(TaskKind::TabCompletion);
        let b = registry.register(TaskKind::Continuation);

        registry.cancel_all();
        assert!(registry.is_empty());
        assert!(a.token().is_cancelled());
        assert!(b.token().is_cancelled());

        // Late drops of the handles stay no-ops.
        drop(a);
        drop(b);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_cancel_kind_is_selective() {
        let registry = CancelRegistry::new();
        let tab = registry.register(TaskKind::TabCompletion);
        let cont = registry.register(TaskKind::Continuation);

        registry.cancel_kind(TaskKind::TabCompletion);
        assert!(tab.token().is_cancelled());
        assert!(!cont.token().is_cancelled());
        assert_eq!(registry.count_kind(TaskKind::TabCompletion), 0);
        assert_eq!(registry.count_kind(TaskKind::Continuation), 1);
    }

    #[test]
    fn test_handle_cancel_removes_entry() {
        let registry = CancelRegistry::new();
        let handle = registry.register(TaskKind::TabCompletion);
        handle.cancel();
        assert!(registry.is_empty());
        assert!(handle.token().is_cancelled());
    }
}
