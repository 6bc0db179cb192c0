//! # restproxy
//!
//! A REST call layer for Rust.
//!
//! A [`RestProxy`] describes a service endpoint: its base URL (optionally a
//! format bound at runtime), its User-Agent and the [`HttpExecutor`] that
//! performs the network I/O. Each [`ProxyCall`] made from it carries a method,
//! a function (path suffix), headers and parameters, and can be run:
//!
//! - synchronously with [`ProxyCall::call_sync`],
//! - with a callback via [`ProxyCall::call_async`], optionally cancelled when
//!   an [`Observer`] is destroyed,
//! - as a future with [`ProxyCall::invoke`] and [`ProxyCall::invoke_finish`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use restproxy::RestProxy;
//!
//! #[tokio::main]
//! async fn main() {
//!     let proxy = RestProxy::new("http://api.example.com/");
//!     let call = proxy.new_call();
//!     call.set_function(Some("users"));
//!     call.add_param("page", "2");
//!
//!     let result = call.invoke(None).await;
//!     match call.invoke_finish(result) {
//!         Ok(()) => println!("{} bytes", call.payload_len()),
//!         Err(e) => eprintln!("failed: {e} ({:?})", e.kind()),
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy and call state
//! - [`http`] - Parameters, headers, body encoding and the request builder
//! - [`executor`] - The transport abstraction and its hyper implementation
//! - [`proxy`] - Service endpoints
//! - [`call`] - Calls and their execution modes

pub mod base;
pub mod call;
pub mod executor;
pub mod http;
pub mod proxy;

pub use base::callerror::{CallError, ErrorKind, PayloadError};
pub use base::callstate::CallState;
pub use base::neterror::NetError;
pub use call::{Invocation, InvokeResult, Observer, ProxyCall, WatchGuard};
pub use executor::{HttpExecutor, HyperExecutor};
pub use crate::http::{Param, ParamKind, PrepareHook};
pub use proxy::{ProxyConfig, RestProxy};
