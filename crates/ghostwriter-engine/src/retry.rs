//! Retryable-attempt runner shared by request flows.
//!
//! Consolidates the retry loop and the cancellation bookkeeping: each
//! attempt registers its own task in the [`CancelRegistry`] and gets its
//! own token; a per-attempt timeout cancels only that attempt's token and
//! is the *only* retryable failure. Cancellation by supersession (a newer
//! request, `cancel_all`, the global cancel key) is never retried, and a
//! client-reported cancellation is treated the same way even when our own
//! token never fired.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use ghostwriter_llm::{LlmError, LlmResult};

use crate::cancel::{CancelRegistry, TaskKind};

/// Terminal failure of an attempt sequence.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// Cancelled externally (supersession or user cancel). Silent.
    Cancelled,
    /// Every allowed attempt timed out.
    TimedOut,
    /// Non-timeout, non-cancellation failure. Never retried.
    Failed(LlmError),
}

/// Run `op` up to `attempts` times with a per-attempt timeout.
///
/// `timeout` of zero disables the per-attempt timer (and with it, retries —
/// only timeouts are retryable).
pub(crate) async fn run_attempts<T, F, Fut>(
    registry: &CancelRegistry,
    kind: TaskKind,
    attempts: u32,
    timeout: Duration,
    mut op: F,
) -> Result<T, AttemptError>
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = LlmResult<T>>,
{
    let attempts = attempts.max(1);
    for attempt in 0..attempts {
        let task = registry.register(kind);
        let token = task.token().clone();
        let fut = op(token.clone());
        tokio::pin!(fut);

        let timed_out = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(AttemptError::Cancelled),
            result = &mut fut => {
                match result {
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_cancellation() => return Err(AttemptError::Cancelled),
                    Err(err) => return Err(AttemptError::Failed(err)),
                }
            }
            _ = tokio::time::sleep(timeout), if !timeout.is_zero() => true,
        };

        if timed_out {
            // Cancel only this attempt's controller; the dropped future
            // unwinds on its own time.
            task.cancel();
            tracing::debug!(%kind, attempt, "attempt timed out");
            if attempt + 1 == attempts {
                return Err(AttemptError::TimedOut);
            }
        }
    }
    unreachable!("attempt loop always returns")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let registry = CancelRegistry::new();
        let result = run_attempts(
            &registry,
            TaskKind::TabCompletion,
            3,
            Duration::from_secs(5),
            |_token| async { Ok::<_, LlmError>(7) },
        )
        .await;
        assert!(matches!(result, Ok(7)));
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retries_then_gives_up() {
        let registry = CancelRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();

        let result = run_attempts(
            &registry,
            TaskKind::TabCompletion,
            3,
            Duration::from_secs(1),
            move |token| {
                calls2.fetch_add(1, Ordering::SeqCst);
                async move {
                    token.cancelled().await;
                    Err::<u32, _>(LlmError::Cancelled)
                }
            },
        )
        .await;

        assert!(matches!(result, Err(AttemptError::TimedOut)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_cancel_is_not_retried() {
        let registry = CancelRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();

        let registry2 = registry.clone();
        let runner = tokio::spawn(async move {
            run_attempts(
                &registry2,
                TaskKind::TabCompletion,
                5,
                Duration::from_secs(60),
                move |token| {
                    calls2.fetch_add(1, Ordering::SeqCst);
                    async move {
                        token.cancelled().await;
                        Err::<u32, _>(LlmError::Cancelled)
                    }
                },
            )
            .await
        });

        // Let the first attempt register, then supersede it.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(registry.count_kind(TaskKind::TabCompletion), 1);
        registry.cancel_kind(TaskKind::TabCompletion);

        let result = runner.await.unwrap();
        assert!(matches!(result, Err(AttemptError::Cancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_api_error_is_not_retried() {
        let registry = CancelRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();

        let result = run_attempts(
            &registry,
            TaskKind::TabCompletion,
            4,
            Duration::from_secs(5),
            move |_token| {
                calls2.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(LlmError::Api("boom".into())) }
            },
        )
        .await;

        assert!(matches!(result, Err(AttemptError::Failed(LlmError::Api(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_reported_cancel_is_not_retried() {
        let registry = CancelRegistry::new();
        let result = run_attempts(
            &registry,
            TaskKind::Continuation,
            3,
            Duration::from_secs(5),
            |_token| async { Err::<u32, _>(LlmError::Cancelled) },
        )
        .await;
        assert!(matches!(result, Err(AttemptError::Cancelled)));
    }
}
