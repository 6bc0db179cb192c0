use thiserror::Error;

/// Transport-level failure reported by an executor when no HTTP response was
/// produced.
///
/// Each class has a numeric code below 100. Those codes never collide with
/// real HTTP statuses, so a call can record them in its status code slot.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NetError {
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Could not resolve host name")]
    CantResolve,
    #[error("Could not resolve proxy host name")]
    CantResolveProxy,
    #[error("Could not connect to destination")]
    CantConnect,
    #[error("Could not connect to proxy")]
    CantConnectProxy,
    #[error("TLS handshake failed")]
    SslFailed,
    #[error("Connection terminated unexpectedly")]
    IoError,
    #[error("Malformed response")]
    Malformed,
    #[error("Try again")]
    TryAgain,

    #[error("Unknown transport failure: {0}")]
    Unknown(u32),
}

impl NetError {
    pub fn as_u32(&self) -> u32 {
        match self {
            NetError::Cancelled => 1,
            NetError::CantResolve => 2,
            NetError::CantResolveProxy => 3,
            NetError::CantConnect => 4,
            NetError::CantConnectProxy => 5,
            NetError::SslFailed => 6,
            NetError::IoError => 7,
            NetError::Malformed => 8,
            NetError::TryAgain => 9,
            NetError::Unknown(code) => *code,
        }
    }

    /// Whether `code` lies in the "no response" sentinel range.
    pub fn is_sentinel(code: u32) -> bool {
        code < 100
    }
}

impl From<u32> for NetError {
    fn from(code: u32) -> Self {
        match code {
            1 => NetError::Cancelled,
            2 => NetError::CantResolve,
            3 => NetError::CantResolveProxy,
            4 => NetError::CantConnect,
            5 => NetError::CantConnectProxy,
            6 => NetError::SslFailed,
            7 => NetError::IoError,
            8 => NetError::Malformed,
            9 => NetError::TryAgain,
            _ => NetError::Unknown(code),
        }
    }
}
