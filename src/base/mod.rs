//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): transport failure classes reported by executors
//! - [`CallError`](callerror::CallError): the error taxonomy every call reports
//! - [`CallState`](callstate::CallState): execution state of a call

pub mod callerror;
pub mod callstate;
pub mod context;
pub mod neterror;

#[cfg(test)]
mod tests;
