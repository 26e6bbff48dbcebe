//!
//! # Connection Establishment
//!
//! ## Purpose
//!
//! This file drives a non-blocking connect to completion or failure within
//! the handle's deadline. The descriptor is never switched to blocking mode:
//! after the initial syscall reports "in progress", completion is detected by
//! waiting for write-readiness and then reading back the socket's pending
//! error state.
//!
//! ## How it works
//!
//! Three outcomes from the immediate connect syscall:
//! 1. Success (typical for loopback) - done.
//! 2. EINPROGRESS / EINTR - wait for writability under the deadline, then
//!    consult SO_ERROR: zero or EISCONN is success, anything else is the
//!    failure reason.
//! 3. Any other errno - immediate failure.
//!
//! Every failure path closes the handle before returning, so a failed
//! connect never leaves a dangling descriptor behind.

use crate::addr::{self, Address};
use crate::error::{Result, SocketError};
use crate::socket::Socket;
use crate::wait::{self, Interest, Readiness};
use std::io;
use std::mem;
use std::os::fd::RawFd;

impl Socket {
    /// Connects the handle to `addr` within the configured timeout.
    ///
    /// Inet hosts are resolved first (numeric literals bypass the resolver).
    /// On success the descriptor stays open and ready for transfer
    /// operations.
    ///
    /// # Errors
    ///
    /// - `SocketError::Timeout` when the deadline elapses before the connect
    ///   completes; the handle is closed.
    /// - `SocketError::ConnectFailed` for a refused or otherwise failed
    ///   connect; the handle is closed.
    /// - `SocketError::Io` for readiness-wait failures; the handle is closed.
    pub fn connect(&mut self, addr: &Address) -> Result<()> {
        let sa = addr::encode(addr)?;
        if self.is_closed() {
            self.create(sa.family())?;
        }

        let rc = unsafe { libc::connect(self.fileno(), sa.as_ptr(), sa.len()) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            // Non-blocking connect proceeds asynchronously; EINTR leaves it
            // in progress as well.
            Some(libc::EINPROGRESS | libc::EINTR) => {}
            _ => {
                let _ = self.close();
                return Err(SocketError::ConnectFailed(err));
            }
        }

        let deadline = self.deadline();
        match wait::wait_ready(self.fileno(), Interest::Writable, &deadline) {
            Err(e) => {
                let _ = self.close();
                Err(SocketError::Io(e))
            }
            Ok(Readiness::TimedOut) => {
                let _ = self.close();
                Err(SocketError::Timeout)
            }
            Ok(Readiness::Ready) => match take_pending_error(self.fileno()) {
                Ok(()) => Ok(()),
                Err(e) => {
                    let _ = self.close();
                    Err(SocketError::ConnectFailed(e))
                }
            },
        }
    }
}

/// Reads and clears the socket's pending error state after an asynchronous
/// connect completes. "Already connected" counts as success.
fn take_pending_error(fd: RawFd) -> io::Result<()> {
    let mut pending: libc::c_int = 0;
    let mut len = mem::size_of::<libc::c_int>() as libc::socklen_t;
    let rc = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            &mut pending as *mut libc::c_int as *mut libc::c_void,
            &mut len,
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    match pending {
        0 => Ok(()),
        e if e == libc::EISCONN => Ok(()),
        e => Err(io::Error::from_raw_os_error(e)),
    }
}
