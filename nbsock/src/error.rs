//
// error.rs - Error Taxonomy for Socket Operations
//
// Purpose:
//   This module defines the single error type surfaced by every fallible
//   operation in the crate. Transient syscall conditions (EINTR, EAGAIN) are
//   absorbed inside the retry loops and never appear here; everything else is
//   classified into one of the variants below.
//
// Main components:
//   - SocketError: the error enum.
//   - Result: crate-wide result alias.
//

use std::{error, fmt, io};

pub type Result<T> = std::result::Result<T, SocketError>;

/// Error classification for all socket operations.
///
/// Each variant maps to one failure class: the deadline elapsed while waiting
/// for readiness (`Timeout`), the peer is gone or the handle is already closed
/// (`Closed`), a connect attempt was rejected (`ConnectFailed`), an arbitrary
/// syscall failure (`Io`), or the caller passed malformed arguments
/// (`Argument`).
#[derive(Debug)]
pub enum SocketError {
    Timeout,
    Closed,
    ConnectFailed(io::Error),
    Io(io::Error),
    Argument(String),
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketError::Timeout => f.write_str("timeout"),
            SocketError::Closed => f.write_str("closed"),
            SocketError::ConnectFailed(e) => write!(f, "connection failed: {e}"),
            SocketError::Io(e) => write!(f, "{e}"),
            SocketError::Argument(msg) => write!(f, "{msg}"),
        }
    }
}

impl error::Error for SocketError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SocketError::ConnectFailed(e) | SocketError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SocketError {
    fn from(e: io::Error) -> Self {
        SocketError::Io(e)
    }
}
