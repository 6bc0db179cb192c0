//! Default executor backed by the hyper client.
//!
//! Speaks HTTP/1.1 over pooled connections, plain for `http` and
//! BoringSSL-backed TLS for `https`.

use crate::base::context::classify_io;
use crate::base::neterror::NetError;
use crate::executor::connector::{TlsConnector, TlsFailure};
use crate::executor::{Executing, HttpExecutor};
use crate::http::response::RawResponse;
use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full};
use hyper::ext::ReasonPhrase;
use hyper_util::client::legacy::{Client, Error as ClientError};
use hyper_util::rt::TokioExecutor;
use std::error::Error as StdError;
use std::fmt;
use std::io;

/// [`HttpExecutor`] that sends requests with a pooled hyper client.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct HyperExecutor {
    client: Client<TlsConnector, Full<Bytes>>,
}

impl HyperExecutor {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(TlsConnector::new());
        Self { client }
    }
}

impl Default for HyperExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HyperExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperExecutor").finish_non_exhaustive()
    }
}

impl HttpExecutor for HyperExecutor {
    fn execute(&self, request: Request<Bytes>) -> Executing {
        let client = self.client.clone();
        let host = request.uri().host().unwrap_or_default().to_string();

        Box::pin(async move {
            let response = client
                .request(request.map(Full::new))
                .await
                .map_err(|e| {
                    let class = classify_client_error(&e);
                    tracing::debug!(host = %host, error = %e, class = ?class, "request failed");
                    class
                })?;

            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| {
                    let class = classify_hyper_error(&e);
                    tracing::debug!(host = %host, error = %e, class = ?class, "body read failed");
                    class
                })?
                .to_bytes();

            let mut raw = RawResponse::new(parts.status, parts.headers, body);
            if let Some(reason) = parts.extensions.get::<ReasonPhrase>() {
                raw = raw.with_reason(String::from_utf8_lossy(reason.as_bytes()).into_owned());
            }
            Ok(raw)
        })
    }
}

/// Map a client error onto a transport class.
fn classify_client_error(err: &ClientError) -> NetError {
    if err.is_connect() {
        return classify_connect(err);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(hyper_err) = cause.downcast_ref::<hyper::Error>() {
            return classify_hyper_error(hyper_err);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return classify_io(io_err);
        }
        source = cause.source();
    }
    NetError::IoError
}

/// Map a connector failure onto a transport class by walking its sources.
fn classify_connect(err: &(dyn StdError + 'static)) -> NetError {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<TlsFailure>() {
            return NetError::SslFailed;
        }
        // hyper-util reports lookup failures as "dns error".
        if cause.to_string().starts_with("dns error") {
            return NetError::CantResolve;
        }
        source = cause.source();
    }
    NetError::CantConnect
}

/// Map a hyper protocol error onto a transport class.
fn classify_hyper_error(err: &hyper::Error) -> NetError {
    if err.is_canceled() {
        return NetError::Cancelled;
    }
    if err.is_parse() || err.is_parse_status() {
        return NetError::Malformed;
    }
    if err.is_incomplete_message() {
        return NetError::IoError;
    }
    match err.source().and_then(|s| s.downcast_ref::<io::Error>()) {
        Some(io_err) => classify_io(io_err),
        None => NetError::IoError,
    }
}
