//! Call error taxonomy and the mapping from transport outcomes onto it.
//!
//! Every execution mode funnels its outcome through [`map_outcome`], so a
//! given response is classified the same way whether it arrived through
//! `call_sync`, `call_async` or `invoke`.

use crate::base::neterror::NetError;
use crate::http::response::RawResponse;
use thiserror::Error;

/// Closed classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The execution was cancelled (explicitly or by observer teardown).
    Cancelled,
    /// The host name could not be resolved.
    Resolution,
    /// No connection could be established.
    Connection,
    /// TLS negotiation failed.
    Tls,
    /// The connection broke mid-exchange.
    Io,
    /// Any other transport failure, including malformed responses.
    Failed,
    /// A response arrived with a status outside 200-299.
    Http,
    /// The caller broke a usage contract (e.g. started a second execution).
    Contract,
}

/// Error returned by every execution mode of a call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("cancelled: {reason}")]
    Cancelled { reason: String },
    #[error("name resolution failed: {reason}")]
    Resolution { reason: String },
    #[error("connection failed: {reason}")]
    Connection { reason: String },
    #[error("TLS failure: {reason}")]
    Tls { reason: String },
    #[error("I/O failure: {reason}")]
    Io { reason: String },
    #[error("transport failure: {reason}")]
    Failed { reason: String },
    #[error("HTTP {code}: {reason}")]
    Http { code: u32, reason: String },

    // Contract violations
    #[error("call already in progress")]
    AlreadyInProgress,
    #[error("URL requires binding and is unbound")]
    Unbound,
    #[error("invoke result belongs to a different call")]
    ForeignResult,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error("prepare hook failed: {0}")]
    Prepare(String),
    #[error("no usable runtime: {0}")]
    Runtime(String),
}

impl CallError {
    /// Build the error for a transport failure class.
    pub fn from_net(err: NetError, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match err {
            NetError::Cancelled => CallError::Cancelled { reason },
            NetError::CantResolve | NetError::CantResolveProxy => CallError::Resolution { reason },
            NetError::CantConnect | NetError::CantConnectProxy => CallError::Connection { reason },
            NetError::SslFailed => CallError::Tls { reason },
            NetError::IoError => CallError::Io { reason },
            NetError::Malformed | NetError::TryAgain | NetError::Unknown(_) => {
                CallError::Failed { reason }
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::Cancelled { .. } => ErrorKind::Cancelled,
            CallError::Resolution { .. } => ErrorKind::Resolution,
            CallError::Connection { .. } => ErrorKind::Connection,
            CallError::Tls { .. } => ErrorKind::Tls,
            CallError::Io { .. } => ErrorKind::Io,
            CallError::Failed { .. } => ErrorKind::Failed,
            CallError::Http { .. } => ErrorKind::Http,
            CallError::AlreadyInProgress
            | CallError::Unbound
            | CallError::ForeignResult
            | CallError::InvalidUrl(_)
            | CallError::InvalidMethod(_)
            | CallError::InvalidHeader(_)
            | CallError::Prepare(_)
            | CallError::Runtime(_) => ErrorKind::Contract,
        }
    }

    /// HTTP status carried by an [`ErrorKind::Http`] error.
    pub fn status_code(&self) -> Option<u32> {
        match self {
            CallError::Http { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Reason text of a transport or HTTP error.
    pub fn reason(&self) -> Option<&str> {
        match self {
            CallError::Cancelled { reason }
            | CallError::Resolution { reason }
            | CallError::Connection { reason }
            | CallError::Tls { reason }
            | CallError::Io { reason }
            | CallError::Failed { reason }
            | CallError::Http { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

/// Failure to turn a payload into a structured document.
///
/// Lives outside [`CallError`]: the call itself succeeded.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("call has no payload")]
    Missing,
    #[error("payload is not a valid document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Map a numeric status and reason phrase onto the call taxonomy.
///
/// Codes below 100 are transport sentinels (see [`NetError`]); 200-299 is
/// success; everything else is an HTTP error.
pub fn map_status(code: u32, reason: &str) -> Result<(), CallError> {
    if NetError::is_sentinel(code) {
        let net = NetError::from(code);
        let reason = if reason.is_empty() {
            net.to_string()
        } else {
            reason.to_string()
        };
        return Err(CallError::from_net(net, reason));
    }

    if (200..300).contains(&code) {
        return Ok(());
    }

    let reason = if reason.is_empty() {
        http::StatusCode::from_u16(u16::try_from(code).unwrap_or(0))
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string()
    } else {
        reason.to_string()
    };
    Err(CallError::Http { code, reason })
}

/// Map an executor outcome onto the call taxonomy.
pub fn map_outcome(outcome: &Result<RawResponse, NetError>) -> Result<(), CallError> {
    match outcome {
        Ok(response) => map_status(response.status_code(), response.reason()),
        Err(net) => Err(CallError::from_net(*net, net.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, StatusCode};

    #[test]
    fn test_success_range() {
        assert!(map_status(200, "OK").is_ok());
        assert!(map_status(204, "No Content").is_ok());
        assert!(map_status(299, "").is_ok());
    }

    #[test]
    fn test_http_error_keeps_code_and_reason() {
        let err = map_status(404, "Not Found").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.reason(), Some("Not Found"));
    }

    #[test]
    fn test_redirect_and_informational_are_errors() {
        assert_eq!(map_status(301, "Moved").unwrap_err().kind(), ErrorKind::Http);
        assert_eq!(map_status(100, "Continue").unwrap_err().kind(), ErrorKind::Http);
    }

    #[test]
    fn test_empty_reason_uses_canonical_phrase() {
        let err = map_status(503, "").unwrap_err();
        assert_eq!(err.reason(), Some("Service Unavailable"));
    }

    #[test]
    fn test_sentinel_classes() {
        let cases = [
            (1, ErrorKind::Cancelled),
            (2, ErrorKind::Resolution),
            (3, ErrorKind::Resolution),
            (4, ErrorKind::Connection),
            (5, ErrorKind::Connection),
            (6, ErrorKind::Tls),
            (7, ErrorKind::Io),
            (8, ErrorKind::Failed),
            (9, ErrorKind::Failed),
            (0, ErrorKind::Failed),
            (99, ErrorKind::Failed),
        ];
        for (code, kind) in cases {
            let err = map_status(code, "").unwrap_err();
            assert_eq!(err.kind(), kind, "code {code}");
            assert!(!err.reason().unwrap_or_default().is_empty());
            assert_eq!(err.status_code(), None);
        }
    }

    #[test]
    fn test_map_outcome() {
        let ok = RawResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::new());
        assert!(map_outcome(&Ok(ok)).is_ok());

        let teapot = RawResponse::new(StatusCode::IM_A_TEAPOT, HeaderMap::new(), Bytes::new())
            .with_reason("Short and stout");
        let err = map_outcome(&Ok(teapot)).unwrap_err();
        assert_eq!(err.status_code(), Some(418));
        assert_eq!(err.reason(), Some("Short and stout"));

        let err = map_outcome(&Err(NetError::SslFailed)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Tls);
    }

    #[test]
    fn test_contract_errors() {
        assert_eq!(CallError::AlreadyInProgress.kind(), ErrorKind::Contract);
        assert_eq!(CallError::Unbound.reason(), None);
        assert!(CallError::from_net(NetError::Cancelled, "x").is_cancelled());
    }
}
