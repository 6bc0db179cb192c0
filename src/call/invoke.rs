//! Future-style execution: `invoke` / `invoke_finish`.

use crate::base::callerror::CallError;
use crate::call::ProxyCall;
use futures::future::FusedFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Opaque outcome of an [`Invocation`], consumed by
/// [`ProxyCall::invoke_finish`].
///
/// While it exists the call counts as in flight. Dropping it without
/// finishing releases the call.
pub struct InvokeResult {
    call: ProxyCall,
    generation: u64,
    outcome: Result<(), CallError>,
    owns_slot: bool,
}

impl InvokeResult {
    /// Result of an execution that reached the executor.
    pub(crate) fn dispatched(
        call: ProxyCall,
        generation: u64,
        outcome: Result<(), CallError>,
    ) -> Self {
        Self {
            call,
            generation,
            outcome,
            owns_slot: true,
        }
    }

    /// Result of an execution that failed before dispatch.
    pub(crate) fn rejected(call: ProxyCall, error: CallError) -> Self {
        Self {
            call,
            generation: 0,
            outcome: Err(error),
            owns_slot: false,
        }
    }

    pub(crate) fn belongs_to(&self, call: &ProxyCall) -> bool {
        self.call.ptr_eq(call)
    }

    /// Release the call and hand out the outcome.
    pub(crate) fn finish(mut self) -> Result<(), CallError> {
        if self.owns_slot {
            self.owns_slot = false;
            self.call.finish(self.generation);
        }
        std::mem::replace(&mut self.outcome, Ok(()))
    }
}

impl Drop for InvokeResult {
    fn drop(&mut self) {
        if self.owns_slot {
            tracing::debug!(generation = self.generation, "invoke result dropped unfinished");
            self.call.finish(self.generation);
        }
    }
}

impl fmt::Debug for InvokeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokeResult")
            .field("generation", &self.generation)
            .field("outcome", &self.outcome)
            .finish()
    }
}

enum Inner {
    Ready(Option<InvokeResult>),
    Pending {
        call: ProxyCall,
        generation: u64,
        receiver: oneshot::Receiver<InvokeResult>,
    },
}

/// Future returned by [`ProxyCall::invoke`].
///
/// The execution starts when `invoke` is called, not on first poll.
/// Dropping the future does not cancel it; use [`ProxyCall::cancel`].
/// Polling it again after it resolved returns `Poll::Pending`.
#[must_use = "the outcome must be passed to `invoke_finish`"]
pub struct Invocation {
    inner: Inner,
}

impl Invocation {
    pub(crate) fn ready(result: InvokeResult) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    pub(crate) fn pending(
        call: ProxyCall,
        generation: u64,
        receiver: oneshot::Receiver<InvokeResult>,
    ) -> Self {
        Self {
            inner: Inner::Pending {
                call,
                generation,
                receiver,
            },
        }
    }
}

impl Future for Invocation {
    type Output = InvokeResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<InvokeResult> {
        let this = self.get_mut();
        let result = match &mut this.inner {
            Inner::Ready(result) => match result.take() {
                Some(result) => result,
                None => return Poll::Pending,
            },
            Inner::Pending {
                call,
                generation,
                receiver,
            } => match receiver.poll_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Ok(result)) => result,
                // The completion context always sends; this only happens if the
                // runtime shut down with the task unpolled and never dropped it.
                Poll::Ready(Err(_)) => InvokeResult::dispatched(
                    call.clone(),
                    *generation,
                    Err(CallError::Cancelled {
                        reason: "dispatch lost".to_string(),
                    }),
                ),
            },
        };
        this.inner = Inner::Ready(None);
        Poll::Ready(result)
    }
}

impl FusedFuture for Invocation {
    fn is_terminated(&self) -> bool {
        matches!(self.inner, Inner::Ready(None))
    }
}
