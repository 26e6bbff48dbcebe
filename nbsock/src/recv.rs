//!
//! # Receive-Side Transfer Loops
//!
//! ## Purpose
//!
//! This file implements the receive half of the transfer engine: `recv` and
//! `recv_from`. Both follow the shared skeleton: wait for readability under
//! the operation's deadline, attempt the syscall once, classify, loop.
//!
//! ## How it works
//!
//! Stream handles read through the lazily allocated read buffer: one chunked
//! recv syscall fills it, and small `recv(maxlen)` calls drain it without
//! re-entering the kernel. Datagram handles bypass the buffer so message
//! boundaries are preserved, one datagram per call.
//!
//! A zero-length read is an orderly peer shutdown and classifies as the
//! closed error; EINTR/EAGAIN re-enter the wait; any other errno aborts with
//! the OS error.
//!
//! ## Main components
//!
//! - `recv()`: buffered stream receive / plain datagram receive.
//! - `recv_from()`: unbuffered receive reporting the source address.

use crate::addr::{self, PeerAddr};
use crate::error::{Result, SocketError};
use crate::socket::{Kind, Socket};
use crate::wait::{self, Interest, Readiness};
use std::io;
use std::mem;

/// One classified receive attempt.
enum Attempt<T> {
    Received(T),
    Again,
}

impl Socket {
    /// Receives up to `maxlen` bytes.
    ///
    /// # Errors
    ///
    /// `Closed` on a closed handle or an orderly peer shutdown, `Timeout`
    /// when the deadline elapses before any data arrives, `Io` for other
    /// syscall failures.
    pub fn recv(&mut self, maxlen: usize) -> Result<Vec<u8>> {
        if self.is_closed() {
            return Err(SocketError::Closed);
        }
        if maxlen == 0 {
            return Ok(Vec::new());
        }
        match self.kind() {
            Kind::Stream => self.recv_buffered(maxlen),
            Kind::Datagram => self.recv_plain(maxlen),
        }
    }

    /// Receives one message of up to `maxlen` bytes along with its source
    /// address. Always unbuffered.
    pub fn recv_from(&mut self, maxlen: usize) -> Result<(Vec<u8>, PeerAddr)> {
        if self.is_closed() {
            return Err(SocketError::Closed);
        }
        let deadline = self.deadline();
        loop {
            match wait::wait_ready(self.fileno(), Interest::Readable, &deadline)? {
                Readiness::TimedOut => return Err(SocketError::Timeout),
                Readiness::Ready => {}
            }
            let mut buf = vec![0u8; maxlen];
            let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
            let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
            let rc = unsafe {
                libc::recvfrom(
                    self.fileno(),
                    buf.as_mut_ptr() as *mut libc::c_void,
                    maxlen,
                    0,
                    &mut storage as *mut libc::sockaddr_storage as *mut libc::sockaddr,
                    &mut len,
                )
            };
            match classify(rc, self.kind())? {
                Attempt::Again => {}
                Attempt::Received(n) => {
                    buf.truncate(n);
                    return Ok((buf, addr::decode(&storage, len)));
                }
            }
        }
    }

    /// Buffered stream receive: drain the read buffer first, refill it with
    /// one chunked syscall when empty.
    fn recv_buffered(&mut self, maxlen: usize) -> Result<Vec<u8>> {
        if let Some(buf) = self.buffer.as_mut() {
            if !buf.is_empty() {
                return Ok(buf.take(maxlen));
            }
        }
        let deadline = self.deadline();
        let fd = self.fileno();
        loop {
            match wait::wait_ready(fd, Interest::Readable, &deadline)? {
                Readiness::TimedOut => return Err(SocketError::Timeout),
                Readiness::Ready => {}
            }
            let rc = self.buffer_mut().fill_from(fd);
            match classify(rc, Kind::Stream)? {
                Attempt::Again => {}
                Attempt::Received(_) => return Ok(self.buffer_mut().take(maxlen)),
            }
        }
    }

    /// Unbuffered receive straight into the caller's length.
    fn recv_plain(&mut self, maxlen: usize) -> Result<Vec<u8>> {
        let deadline = self.deadline();
        loop {
            match wait::wait_ready(self.fileno(), Interest::Readable, &deadline)? {
                Readiness::TimedOut => return Err(SocketError::Timeout),
                Readiness::Ready => {}
            }
            let mut buf = vec![0u8; maxlen];
            let rc = unsafe {
                libc::recv(
                    self.fileno(),
                    buf.as_mut_ptr() as *mut libc::c_void,
                    maxlen,
                    0,
                )
            };
            match classify(rc, self.kind())? {
                Attempt::Again => {}
                Attempt::Received(n) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
            }
        }
    }
}

/// Classifies one raw recv result. The single errno-translation point for the
/// receive side.
fn classify(rc: isize, kind: Kind) -> Result<Attempt<usize>> {
    if rc > 0 {
        return Ok(Attempt::Received(rc as usize));
    }
    if rc == 0 {
        // For streams a zero-length read is an orderly peer shutdown. A
        // zero-length datagram is legitimate payload.
        return match kind {
            Kind::Stream => Err(SocketError::Closed),
            Kind::Datagram => Ok(Attempt::Received(0)),
        };
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EINTR | libc::EAGAIN) => Ok(Attempt::Again),
        _ => Err(SocketError::Io(err)),
    }
}
