//! A single REST call against a [`RestProxy`].
//!
//! A [`ProxyCall`] accumulates a method, a function (path suffix), headers
//! and parameters, then runs in one of three modes:
//!
//! - [`call_sync`](ProxyCall::call_sync): blocks until the response arrives.
//! - [`call_async`](ProxyCall::call_async): returns at once and reports
//!   through a callback, optionally tied to an [`Observer`].
//! - [`invoke`](ProxyCall::invoke) / [`invoke_finish`](ProxyCall::invoke_finish):
//!   a future resolving to an opaque result.
//!
//! Every mode goes through the same request builder and error mapping, so a
//! given response yields the same [`CallError`] in each of them.
//!
//! # Example
//!
//! ```rust,ignore
//! use restproxy::RestProxy;
//!
//! let proxy = RestProxy::new("http://api.example.com/");
//! let call = proxy.new_call();
//! call.set_function(Some("search"));
//! call.add_param("q", "rust");
//! call.call_sync()?;
//! println!("{} bytes", call.payload_len());
//! ```

mod completion;
pub mod invoke;
pub mod observer;

pub use crate::http::builder::PrepareHook;
pub use invoke::{Invocation, InvokeResult};
pub use observer::{Observer, WatchGuard};

use crate::base::callerror::{map_outcome, CallError};
use crate::base::callstate::CallState;
use crate::executor::{self, InFlight, Outcome};
use crate::http::builder::{build_request, CallConfig};
use crate::http::headers::Headers;
use crate::http::params::{Param, Params};
use crate::proxy::RestProxy;
use bytes::Bytes;
use completion::{CompletionContext, Continuation};
use http::Request;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

#[cfg(feature = "json")]
use crate::base::callerror::PayloadError;

/// Response fields, reset when an execution starts.
#[derive(Debug, Default)]
struct ResponseState {
    headers: Headers,
    payload: Option<Bytes>,
    status_code: u32,
    status_message: Option<String>,
}

enum Phase {
    Idle,
    InFlight {
        generation: u64,
        handle: Option<InFlight>,
        cancel_requested: bool,
    },
    Completed,
}

impl Phase {
    fn state(&self) -> CallState {
        match self {
            Phase::Idle => CallState::Idle,
            Phase::InFlight { .. } => CallState::InFlight,
            Phase::Completed => CallState::Completed,
        }
    }

    fn is_generation(&self, wanted: u64) -> bool {
        matches!(self, Phase::InFlight { generation, .. } if *generation == wanted)
    }
}

struct CallData {
    config: CallConfig,
    response: ResponseState,
    phase: Phase,
    generation: u64,
}

struct CallInner {
    proxy: Arc<RestProxy>,
    prepare: Option<Arc<dyn PrepareHook>>,
    data: Mutex<CallData>,
}

/// Handle to a call. Clones refer to the same call.
#[derive(Clone)]
pub struct ProxyCall {
    inner: Arc<CallInner>,
}

impl ProxyCall {
    pub(crate) fn new(proxy: Arc<RestProxy>, prepare: Option<Arc<dyn PrepareHook>>) -> Self {
        Self {
            inner: Arc::new(CallInner {
                proxy,
                prepare,
                data: Mutex::new(CallData {
                    config: CallConfig::default(),
                    response: ResponseState::default(),
                    phase: Phase::Idle,
                    generation: 0,
                }),
            }),
        }
    }

    pub fn proxy(&self) -> &Arc<RestProxy> {
        &self.inner.proxy
    }

    pub(crate) fn ptr_eq(&self, other: &ProxyCall) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Configuration ---

    /// Set the HTTP method. Defaults to `GET`.
    pub fn set_method(&self, method: &str) {
        self.inner.data.lock().config.set_method(method);
    }

    pub fn method(&self) -> String {
        self.inner.data.lock().config.method().to_string()
    }

    /// Set the path appended to the proxy URL, or `None` to clear it.
    pub fn set_function(&self, function: Option<&str>) {
        self.inner
            .data
            .lock()
            .config
            .set_function(function.map(str::to_string));
    }

    pub fn clear_function(&self) {
        self.set_function(None);
    }

    pub fn function(&self) -> Option<String> {
        self.inner.data.lock().config.function().map(str::to_string)
    }

    /// Set a request header, replacing any value under the same name.
    pub fn add_header(&self, name: &str, value: &str) {
        self.inner.data.lock().config.headers_mut().insert(name, value);
    }

    pub fn add_headers<I, N, V>(&self, headers: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut data = self.inner.data.lock();
        for (name, value) in headers {
            data.config.headers_mut().insert(name, value);
        }
    }

    pub fn lookup_header(&self, name: &str) -> Option<String> {
        self.inner
            .data
            .lock()
            .config
            .headers()
            .get(name)
            .map(str::to_string)
    }

    pub fn remove_header(&self, name: &str) {
        self.inner.data.lock().config.headers_mut().remove(name);
    }

    /// Add a string parameter, replacing any parameter with the same name.
    pub fn add_param(&self, name: &str, value: &str) {
        self.add_param_full(Param::string(name, value));
    }

    /// Add a parameter of any kind, replacing any with the same name.
    pub fn add_param_full(&self, param: Param) {
        self.inner.data.lock().config.params_mut().add(param);
    }

    pub fn add_params<I, N, V>(&self, params: I)
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut data = self.inner.data.lock();
        for (name, value) in params {
            data.config.params_mut().add(Param::string(name, value));
        }
    }

    pub fn lookup_param(&self, name: &str) -> Option<Param> {
        self.inner.data.lock().config.params().get(name).cloned()
    }

    pub fn remove_param(&self, name: &str) {
        self.inner.data.lock().config.params_mut().remove(name);
    }

    /// Snapshot of the parameters, in insertion order.
    pub fn params(&self) -> Params {
        self.inner.data.lock().config.params().clone()
    }

    // --- Results ---

    /// HTTP status of the last execution, or a transport code below 100.
    ///
    /// `0` until an execution completes.
    pub fn status_code(&self) -> u32 {
        self.inner.data.lock().response.status_code
    }

    pub fn status_message(&self) -> Option<String> {
        self.inner.data.lock().response.status_message.clone()
    }

    /// Response body of the last execution.
    pub fn payload(&self) -> Option<Bytes> {
        self.inner.data.lock().response.payload.clone()
    }

    pub fn payload_len(&self) -> usize {
        self.inner
            .data
            .lock()
            .response
            .payload
            .as_ref()
            .map_or(0, Bytes::len)
    }

    pub fn lookup_response_header(&self, name: &str) -> Option<String> {
        self.inner
            .data
            .lock()
            .response
            .headers
            .get(name)
            .map(str::to_string)
    }

    pub fn response_headers(&self) -> Headers {
        self.inner.data.lock().response.headers.clone()
    }

    pub fn state(&self) -> CallState {
        self.inner.data.lock().phase.state()
    }

    /// Decode the payload as JSON.
    #[cfg(feature = "json")]
    pub fn payload_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, PayloadError> {
        let payload = self.payload().ok_or(PayloadError::Missing)?;
        Ok(serde_json::from_slice(&payload)?)
    }

    // --- Execution ---

    /// Run the call and block until it completes.
    ///
    /// Works outside a runtime and inside a multi-thread one; fails with
    /// [`CallError::Runtime`] inside a current-thread runtime.
    pub fn call_sync(&self) -> Result<(), CallError> {
        executor::can_block()?;
        let (generation, request) = self.begin()?;
        let executor = Arc::clone(self.inner.proxy.executor());

        let outcome = match executor::send_blocking(&*executor, request) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.finish(generation);
                return Err(e);
            }
        };

        let result = self.record(generation, outcome);
        self.finish(generation);
        result
    }

    /// Start the call and return immediately.
    ///
    /// `callback` runs exactly once when the call completes, with the error
    /// if it failed and the observer if it is still alive. Destroying
    /// `observer` first cancels the call. Must be called within a Tokio
    /// runtime. Errors detected before dispatch are returned here and the
    /// callback is not run.
    pub fn call_async<F, U>(
        &self,
        callback: F,
        observer: Option<&Observer>,
        user_data: U,
    ) -> Result<(), CallError>
    where
        F: FnOnce(&ProxyCall, Option<&CallError>, Option<&Observer>, U) + Send + 'static,
        U: Send + 'static,
    {
        let handle = current_runtime()?;
        let continuation = Continuation::Callback(Box::new(
            move |call: &ProxyCall, error: Option<&CallError>, observer: Option<&Observer>| {
                callback(call, error, observer, user_data)
            },
        ));
        self.dispatch(&handle, observer, continuation).map(|_| ())
    }

    /// Start the call as a future.
    ///
    /// Pass the resolved [`InvokeResult`] to [`invoke_finish`](Self::invoke_finish).
    /// Errors detected before dispatch are delivered the same way.
    pub fn invoke(&self, observer: Option<&Observer>) -> Invocation {
        let handle = match current_runtime() {
            Ok(handle) => handle,
            Err(e) => return Invocation::ready(InvokeResult::rejected(self.clone(), e)),
        };

        let (sender, receiver) = oneshot::channel();
        match self.dispatch(&handle, observer, Continuation::Invoke(sender)) {
            Ok(generation) => Invocation::pending(self.clone(), generation, receiver),
            Err(e) => Invocation::ready(InvokeResult::rejected(self.clone(), e)),
        }
    }

    /// Consume the result of [`invoke`](Self::invoke) and release the call.
    pub fn invoke_finish(&self, result: InvokeResult) -> Result<(), CallError> {
        if !result.belongs_to(self) {
            tracing::warn!("invoke result passed to a different call");
            return Err(CallError::ForeignResult);
        }
        result.finish()
    }

    /// Run the call asynchronously and wait for its callback.
    pub fn run(&self) -> Result<(), CallError> {
        executor::block_on(async {
            let (sender, receiver) = oneshot::channel();
            let started = self.call_async(
                |_, error, _, sender: oneshot::Sender<Option<CallError>>| {
                    let _ = sender.send(error.cloned());
                },
                None,
                sender,
            );
            if let Err(e) = started {
                return Err(e);
            }
            match receiver.await {
                Ok(None) => Ok(()),
                Ok(Some(error)) => Err(error),
                Err(_) => Err(CallError::Cancelled {
                    reason: "dispatch lost".to_string(),
                }),
            }
        })?
    }

    /// Like [`run`](Self::run), but only reports success.
    pub fn run_ok(&self) -> bool {
        match self.run() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "call failed");
                false
            }
        }
    }

    /// Abort the execution in flight, if any.
    ///
    /// The completion still runs once, with a cancellation error. Does
    /// nothing when no execution is in flight. Blocking executions cannot be
    /// aborted.
    pub fn cancel(&self) -> Result<(), CallError> {
        let mut data = self.inner.data.lock();
        if let Phase::InFlight {
            generation,
            handle,
            cancel_requested,
        } = &mut data.phase
        {
            tracing::debug!(generation = *generation, "cancelling call");
            match handle {
                Some(handle) => {
                    handle.cancel();
                }
                None => *cancel_requested = true,
            }
        }
        Ok(())
    }

    // --- Internals ---

    /// Claim the call for a new execution and build its request.
    ///
    /// The request is built without holding the call lock, so a prepare hook
    /// may use the call's own API. Leaves the call as it was on failure.
    fn begin(&self) -> Result<(u64, Request<Bytes>), CallError> {
        let (generation, previous, mut config) = {
            let mut data = self.inner.data.lock();
            if !data.phase.state().can_start() {
                tracing::error!("call already in progress");
                return Err(CallError::AlreadyInProgress);
            }
            data.generation += 1;
            let generation = data.generation;
            let previous = std::mem::replace(
                &mut data.phase,
                Phase::InFlight {
                    generation,
                    handle: None,
                    cancel_requested: false,
                },
            );
            (generation, previous, data.config.clone())
        };

        let endpoint = self.inner.proxy.endpoint();
        let built = build_request(&endpoint, &mut config, self.inner.prepare.as_deref());

        let mut data = self.inner.data.lock();
        match built {
            Ok(request) => {
                data.config = config;
                data.response = ResponseState::default();
                Ok((generation, request))
            }
            Err(e) => {
                if data.phase.is_generation(generation) {
                    data.phase = previous;
                }
                Err(e)
            }
        }
    }

    fn dispatch(
        &self,
        handle: &Handle,
        observer: Option<&Observer>,
        continuation: Continuation,
    ) -> Result<u64, CallError> {
        let (generation, request) = self.begin()?;
        let watch = observer.map(|observer| {
            let call = Arc::downgrade(&self.inner);
            observer.watch(move || {
                if let Some(inner) = call.upgrade() {
                    ProxyCall { inner }.cancel_generation(generation);
                }
            })
        });

        let context = CompletionContext::new(self.clone(), generation, watch, continuation);
        let in_flight = executor::submit(
            handle,
            Arc::clone(self.inner.proxy.executor()),
            request,
            move |outcome| context.complete(outcome),
        );
        self.attach(generation, in_flight);
        Ok(generation)
    }

    /// Store the abort handle, applying a cancel that arrived before it.
    fn attach(&self, generation: u64, mut in_flight: InFlight) {
        let mut data = self.inner.data.lock();
        if let Phase::InFlight {
            generation: current,
            handle,
            cancel_requested,
        } = &mut data.phase
        {
            if *current == generation {
                if *cancel_requested {
                    in_flight.cancel();
                }
                *handle = Some(in_flight);
            }
        }
    }

    fn cancel_generation(&self, generation: u64) {
        let mut data = self.inner.data.lock();
        if !data.phase.is_generation(generation) {
            return;
        }
        tracing::debug!(generation, "observer destroyed, cancelling call");
        if let Phase::InFlight {
            handle,
            cancel_requested,
            ..
        } = &mut data.phase
        {
            match handle {
                Some(handle) => {
                    handle.cancel();
                }
                None => *cancel_requested = true,
            }
        }
    }

    /// Write the outcome into the response fields and map it.
    pub(crate) fn record(&self, generation: u64, outcome: Outcome) -> Result<(), CallError> {
        let result = map_outcome(&outcome);
        let mut data = self.inner.data.lock();
        if !data.phase.is_generation(generation) {
            tracing::warn!(generation, "outcome for a stale execution ignored");
            return result;
        }

        let response = &mut data.response;
        match outcome {
            Ok(raw) => {
                response.status_code = raw.status_code();
                response.status_message = Some(raw.reason().to_string());
                let (headers, body) = raw.into_parts();
                response.headers = Headers::from_header_map(&headers);
                response.payload = Some(body);
            }
            Err(net) => {
                response.status_code = net.as_u32();
                response.status_message = Some(net.to_string());
            }
        }
        result
    }

    /// Return the call to a startable state if `generation` still holds it.
    pub(crate) fn finish(&self, generation: u64) {
        let mut data = self.inner.data.lock();
        if data.phase.is_generation(generation) {
            data.phase = Phase::Completed;
        }
    }
}

fn current_runtime() -> Result<Handle, CallError> {
    Handle::try_current().map_err(|e| {
        tracing::error!(error = %e, "asynchronous call made outside a Tokio runtime");
        CallError::Runtime(e.to_string())
    })
}

impl fmt::Debug for ProxyCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.inner.data.lock();
        f.debug_struct("ProxyCall")
            .field("method", &data.config.method())
            .field("function", &data.config.function())
            .field("state", &data.phase.state())
            .field("status_code", &data.response.status_code)
            .finish()
    }
}
