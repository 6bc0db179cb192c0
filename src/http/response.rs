//! Fully buffered response handed back by an executor.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// A response that completed a transport round trip.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            reason: None,
            headers,
            body,
        }
    }

    /// Override the reason phrase sent by the server.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u32 {
        u32::from(self.status.as_u16())
    }

    /// Reason phrase: the server's own, else the canonical one, else empty.
    pub fn reason(&self) -> &str {
        self.reason
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (HeaderMap, Bytes) {
        (self.headers, self.body)
    }
}
