//! Scripted model client for tests.
//!
//! Replays a queued script of replies in order, one per `generate`/`stream`
//! call, honoring the cancellation token the way a well-behaved provider
//! would. Enabled with the `test-mock` feature.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::stream::{EventStream, StreamEvent, StreamRequest};
use crate::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmResult};

/// One scripted reply, consumed front-to-back.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Resolve a `generate` call immediately.
    Complete(LlmResult<CompletionResponse>),
    /// Resolve a `generate` call after a delay (or earlier with `Cancelled`
    /// if the token fires first). Drives timeout/retry tests.
    CompleteAfter(Duration, LlmResult<CompletionResponse>),
    /// Park a `generate` call until its token is cancelled.
    Pending,
    /// Resolve a `stream` call with these events, then end the stream.
    Stream(Vec<StreamEvent>),
    /// Resolve a `stream` call with these events, then keep the stream open
    /// until the token is cancelled. Drives mid-stream cancellation tests.
    StreamThenHang(Vec<StreamEvent>),
    /// Fail a `stream` call outright.
    StreamFail(LlmError),
}

/// Record of one issued call, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedCall {
    Generate { model: String },
    Stream { model: String },
}

/// A model client that replays a script.
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<ScriptedReply>>,
    issued: Mutex<Vec<IssuedCall>>,
}

impl ScriptedClient {
    /// Create an empty client; every call fails until replies are pushed.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply.
    pub fn push(&self, reply: ScriptedReply) {
        self.script.lock().push_back(reply);
    }

    /// Queue a plain successful completion.
    pub fn push_completion(&self, content: impl Into<String>) {
        self.push(ScriptedReply::Complete(Ok(CompletionResponse {
            content: content.into(),
            model: "scripted".into(),
            stop_reason: Some("end_turn".into()),
        })));
    }

    /// All calls issued so far.
    pub fn issued(&self) -> Vec<IssuedCall> {
        self.issued.lock().clone()
    }

    /// Number of `generate` calls issued so far.
    pub fn generate_calls(&self) -> usize {
        self.issued
            .lock()
            .iter()
            .filter(|c| matches!(c, IssuedCall::Generate { .. }))
            .count()
    }

    /// Number of `stream` calls issued so far.
    pub fn stream_calls(&self) -> usize {
        self.issued
            .lock()
            .iter()
            .filter(|c| matches!(c, IssuedCall::Stream { .. }))
            .count()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        self.script.lock().pop_front()
    }
}

/// Build a stream yielding `events`, then staying open until `cancel` fires.
fn hanging_stream(events: Vec<StreamEvent>, cancel: CancellationToken) -> EventStream {
    let tail = stream::once(async move { cancel.cancelled().await })
        .filter_map(|_| async { None::<StreamEvent> });
    stream::iter(events).chain(tail).boxed()
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> LlmResult<CompletionResponse> {
        self.issued.lock().push(IssuedCall::Generate {
            model: request.model.clone(),
        });
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }
        match self.next_reply() {
            Some(ScriptedReply::Complete(result)) => result,
            Some(ScriptedReply::CompleteAfter(delay, result)) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(LlmError::Cancelled),
                    _ = tokio::time::sleep(delay) => result,
                }
            }
            Some(ScriptedReply::Pending) => {
                cancel.cancelled().await;
                Err(LlmError::Cancelled)
            }
            Some(other) => Err(LlmError::InvalidRequest(format!(
                "scripted stream reply {other:?} consumed by generate"
            ))),
            None => Err(LlmError::Unavailable("script exhausted".into())),
        }
    }

    async fn stream(
        &self,
        request: StreamRequest,
        cancel: CancellationToken,
    ) -> LlmResult<EventStream> {
        self.issued.lock().push(IssuedCall::Stream {
            model: request.model.clone(),
        });
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }
        match self.next_reply() {
            Some(ScriptedReply::Stream(events)) => Ok(stream::iter(events).boxed()),
            Some(ScriptedReply::StreamThenHang(events)) => Ok(hanging_stream(events, cancel)),
            Some(ScriptedReply::StreamFail(err)) => Err(err),
            Some(other) => Err(LlmError::InvalidRequest(format!(
                "scripted generate reply {other:?} consumed by stream"
            ))),
            None => Err(LlmError::Unavailable("script exhausted".into())),
        }
    }
}
