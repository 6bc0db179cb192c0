//! Classification of IO failures into transport classes.

use crate::base::neterror::NetError;
use std::io;

/// Classify an IO error into a transport failure class.
pub fn classify_io(err: &io::Error) -> NetError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::NotConnected
        | io::ErrorKind::TimedOut => NetError::CantConnect,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => NetError::IoError,
        io::ErrorKind::InvalidData => NetError::Malformed,
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => NetError::TryAgain,
        _ => NetError::IoError,
    }
}
