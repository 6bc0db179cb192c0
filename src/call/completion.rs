//! The single completion path shared by the asynchronous modes.

use crate::base::callerror::CallError;
use crate::base::neterror::NetError;
use crate::call::invoke::InvokeResult;
use crate::call::observer::{Observer, WatchGuard};
use crate::call::ProxyCall;
use crate::executor::Outcome;
use tokio::sync::oneshot;

pub(crate) type Callback =
    Box<dyn FnOnce(&ProxyCall, Option<&CallError>, Option<&Observer>) + Send>;

/// What to notify once the execution resolves.
pub(crate) enum Continuation {
    Callback(Callback),
    Invoke(oneshot::Sender<InvokeResult>),
}

/// Owned by the dispatch task of one execution.
///
/// Holds the call alive until it completes. Completes exactly once: through
/// [`complete`](Self::complete), or from `Drop` with a cancellation if the
/// task is dropped before the executor finished.
pub(crate) struct CompletionContext {
    call: ProxyCall,
    generation: u64,
    watch: Option<WatchGuard>,
    continuation: Option<Continuation>,
}

impl CompletionContext {
    pub(crate) fn new(
        call: ProxyCall,
        generation: u64,
        watch: Option<WatchGuard>,
        continuation: Continuation,
    ) -> Self {
        Self {
            call,
            generation,
            watch,
            continuation: Some(continuation),
        }
    }

    pub(crate) fn complete(mut self, outcome: Outcome) {
        self.resolve(outcome);
    }

    fn resolve(&mut self, outcome: Outcome) {
        let Some(continuation) = self.continuation.take() else {
            return;
        };

        let result = self.call.record(self.generation, outcome);
        let observer = self.watch.take().and_then(WatchGuard::release);

        tracing::debug!(
            generation = self.generation,
            status = self.call.status_code(),
            ok = result.is_ok(),
            "call completed"
        );

        match continuation {
            Continuation::Callback(callback) => {
                // Released before the callback so it may start a new execution.
                self.call.finish(self.generation);
                callback(&self.call, result.as_ref().err(), observer.as_ref());
            }
            Continuation::Invoke(sender) => {
                let invoke = InvokeResult::dispatched(self.call.clone(), self.generation, result);
                if sender.send(invoke).is_err() {
                    tracing::debug!(generation = self.generation, "invocation dropped before completion");
                }
            }
        }
    }
}

impl Drop for CompletionContext {
    fn drop(&mut self) {
        if self.continuation.is_some() {
            tracing::debug!(generation = self.generation, "dispatch dropped before completion");
            self.resolve(Err(NetError::Cancelled));
        }
    }
}
