//! Driving futures to completion from synchronous code.

use crate::base::callerror::CallError;
use once_cell::sync::OnceCell;
use std::future::Future;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};

/// Runtime used when the caller is not inside one.
///
/// It lives for the whole process so pooled connections opened by one
/// blocking call stay usable by the next.
static SHARED: OnceCell<Runtime> = OnceCell::new();

fn shared() -> Result<&'static Runtime, CallError> {
    SHARED.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("restproxy-blocking")
            .enable_all()
            .build()
            .map_err(|e| CallError::Runtime(e.to_string()))
    })
}

/// Whether [`block_on`] can run on this thread.
///
/// Fails with [`CallError::Runtime`] inside a current-thread runtime, where
/// blocking would deadlock.
pub fn can_block() -> Result<(), CallError> {
    match Handle::try_current() {
        Ok(handle) => match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => Ok(()),
            flavor => {
                tracing::error!(?flavor, "blocking call made on a single-threaded runtime");
                Err(CallError::Runtime(format!(
                    "cannot block inside a {flavor:?} runtime"
                )))
            }
        },
        Err(_) => Ok(()),
    }
}

/// Block the current thread until `future` resolves.
///
/// - Inside a multi-thread runtime the worker is handed off with
///   `block_in_place` first.
/// - Inside a current-thread runtime this fails (see [`can_block`]).
/// - Outside any runtime a shared background runtime drives the future.
pub fn block_on<F: Future>(future: F) -> Result<F::Output, CallError> {
    can_block()?;
    match Handle::try_current() {
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(future))),
        Err(_) => Ok(shared()?.block_on(future)),
    }
}
