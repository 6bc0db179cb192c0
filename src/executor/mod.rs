//! HTTP executor abstraction.
//!
//! The executor is the only component that performs network I/O. A call hands
//! it a fully built `http::Request<Bytes>` and gets back either a buffered
//! [`RawResponse`] or a transport [`NetError`].
//!
//! On top of the [`HttpExecutor`] trait this module provides the two dispatch
//! primitives the execution modes use:
//! - [`submit`]: run a request on a Tokio runtime and deliver its outcome to a
//!   completion handler exactly once, with an abort handle ([`InFlight`]).
//! - [`send_blocking`]: run a request to completion on the calling thread.
//!
//! # Example
//!
//! ```rust,ignore
//! use restproxy::executor::{HttpExecutor, Executing};
//!
//! struct Canned;
//!
//! impl HttpExecutor for Canned {
//!     fn execute(&self, _request: http::Request<bytes::Bytes>) -> Executing {
//!         Box::pin(async { Err(restproxy::NetError::CantConnect) })
//!     }
//! }
//! ```

mod blocking;
mod connector;
mod hyperclient;

pub use blocking::{block_on, can_block};
pub use hyperclient::HyperExecutor;

use crate::base::callerror::CallError;
use crate::base::neterror::NetError;
use crate::http::response::RawResponse;
use bytes::Bytes;
use futures::future::BoxFuture;
use http::Request;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// What an executor reports for one request.
pub type Outcome = Result<RawResponse, NetError>;

/// Alias for the `Future` type returned by an executor.
pub type Executing = BoxFuture<'static, Outcome>;

/// Trait for HTTP transports.
///
/// Implementations own connection management, TLS and timeouts. They must be
/// thread-safe: one executor is shared by every call of a proxy.
pub trait HttpExecutor: Send + Sync {
    /// Send `request` and buffer the whole response.
    ///
    /// Dropping the returned future must abort the exchange.
    fn execute(&self, request: Request<Bytes>) -> Executing;
}

/// Blanket implementation for Arc-wrapped executors.
impl<E: HttpExecutor + ?Sized> HttpExecutor for Arc<E> {
    fn execute(&self, request: Request<Bytes>) -> Executing {
        (**self).execute(request)
    }
}

/// Abort handle for a request started with [`submit`].
#[derive(Debug)]
pub struct InFlight {
    cancel: Option<oneshot::Sender<()>>,
}

impl InFlight {
    /// Ask the dispatch to abort.
    ///
    /// The completion handler still runs, with [`NetError::Cancelled`], unless
    /// the executor already finished. Returns `false` if the request had
    /// already completed or was cancelled before.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(sender) => sender.send(()).is_ok(),
            None => false,
        }
    }
}

/// Run `request` on `handle` and pass the outcome to `on_complete`.
///
/// `on_complete` runs exactly once, on a runtime worker, with whichever
/// finished first: the executor or a cancellation through the returned
/// [`InFlight`]. Dropping the `InFlight` without cancelling does not abort.
pub fn submit<H>(
    handle: &Handle,
    executor: Arc<dyn HttpExecutor>,
    request: Request<Bytes>,
    on_complete: H,
) -> InFlight
where
    H: FnOnce(Outcome) + Send + 'static,
{
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
    let method = request.method().clone();
    let uri = request.uri().clone();

    handle.spawn(async move {
        tracing::debug!(method = %method, uri = %uri, "dispatching request");
        let outcome = tokio::select! {
            biased;
            Ok(()) = &mut cancel_rx => {
                tracing::debug!(method = %method, uri = %uri, "request aborted");
                Err(NetError::Cancelled)
            }
            outcome = executor.execute(request) => outcome,
        };
        on_complete(outcome);
    });

    InFlight {
        cancel: Some(cancel_tx),
    }
}

/// Run `request` to completion on the calling thread.
///
/// Fails only when no runtime can be driven from here (see [`block_on`]).
pub fn send_blocking(
    executor: &dyn HttpExecutor,
    request: Request<Bytes>,
) -> Result<Outcome, CallError> {
    block_on(executor.execute(request))
}
