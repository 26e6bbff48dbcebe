//!
//! # Send-Side Transfer Loops
//!
//! ## Purpose
//!
//! This file implements the send half of the transfer engine: `send`,
//! `send_to` and the retry-until-complete `write_all` variant. All three
//! share one skeleton: wait for writability under the operation's deadline,
//! attempt the syscall once, classify the result, loop.
//!
//! ## How it works
//!
//! `send` and `send_to` return the single-syscall byte count as-is; a partial
//! send is surfaced to the caller, not retried. `write_all` accumulates
//! counts and keeps re-waiting for writability until the running total
//! equals the requested length. The two contracts are distinct on purpose.
//!
//! Transient errno values (EINTR, EAGAIN) re-enter the wait; EPIPE and
//! ECONNRESET classify as peer closure; everything else aborts with the OS
//! error. All iterations of one call share one deadline, so cumulative
//! waiting is bounded by the configured timeout rather than reset per retry.
//!
//! ## Main components
//!
//! - `send()` / `send_to()`: single-syscall sends.
//! - `write_all()`: send-all with the same deadline across retries.

use crate::addr::{self, Address, SockAddr};
use crate::error::{Result, SocketError};
use crate::socket::Socket;
use crate::wait::{self, Interest, Readiness};
use std::io;
use std::os::fd::RawFd;

/// One classified send attempt: bytes written, or "wait again".
enum Attempt {
    Sent(usize),
    Again,
}

impl Socket {
    /// Sends `data` once the descriptor is writable, returning the
    /// single-syscall byte count. Partial sends surface to the caller.
    ///
    /// # Errors
    ///
    /// `Closed` on a closed handle or a gone peer (EPIPE/ECONNRESET),
    /// `Timeout` when the deadline elapses, `Io` for other syscall failures.
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        if self.is_closed() {
            return Err(SocketError::Closed);
        }
        self.send_loop(data, None)
    }

    /// Sends `data` to an explicit destination (connectionless use).
    ///
    /// A datagram handle without a descriptor gets one lazily, matching the
    /// destination's family.
    pub fn send_to(&mut self, data: &[u8], dest: &Address) -> Result<usize> {
        let sa = addr::encode(dest)?;
        self.ensure_descriptor(sa.family())?;
        self.send_loop(data, Some(&sa))
    }

    /// Sends all of `data`, re-waiting for writability after every partial
    /// send, until the running total equals the requested length.
    ///
    /// The whole call is bounded by one deadline; a partial total is never
    /// silently reported as success.
    pub fn write_all(&mut self, data: &[u8]) -> Result<usize> {
        if self.is_closed() {
            return Err(SocketError::Closed);
        }
        let deadline = self.deadline();
        let mut total = 0usize;
        while total < data.len() {
            match wait::wait_ready(self.fileno(), Interest::Writable, &deadline)? {
                Readiness::TimedOut => return Err(SocketError::Timeout),
                Readiness::Ready => {}
            }
            match try_send(self.fileno(), &data[total..], None)? {
                Attempt::Sent(n) => total += n,
                Attempt::Again => {}
            }
        }
        Ok(total)
    }

    fn send_loop(&mut self, data: &[u8], dest: Option<&SockAddr>) -> Result<usize> {
        let deadline = self.deadline();
        loop {
            match wait::wait_ready(self.fileno(), Interest::Writable, &deadline)? {
                Readiness::TimedOut => return Err(SocketError::Timeout),
                Readiness::Ready => {}
            }
            match try_send(self.fileno(), data, dest)? {
                Attempt::Sent(n) => return Ok(n),
                Attempt::Again => {}
            }
        }
    }
}

/// Issues one send/sendto syscall and classifies the outcome. This is the
/// single spot translating send-side errno values into the error taxonomy.
fn try_send(fd: RawFd, data: &[u8], dest: Option<&SockAddr>) -> Result<Attempt> {
    let rc = unsafe {
        match dest {
            None => libc::send(
                fd,
                data.as_ptr() as *const libc::c_void,
                data.len(),
                libc::MSG_NOSIGNAL,
            ),
            Some(sa) => libc::sendto(
                fd,
                data.as_ptr() as *const libc::c_void,
                data.len(),
                libc::MSG_NOSIGNAL,
                sa.as_ptr(),
                sa.len(),
            ),
        }
    };
    if rc >= 0 {
        return Ok(Attempt::Sent(rc as usize));
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EINTR | libc::EAGAIN) => Ok(Attempt::Again),
        Some(libc::EPIPE | libc::ECONNRESET) => Err(SocketError::Closed),
        _ => Err(SocketError::Io(err)),
    }
}
