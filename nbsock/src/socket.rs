//
// socket.rs - Socket Handle Lifecycle
//
// Purpose:
//   This module owns the state of one socket handle: the OS descriptor, its
//   address family, the configured timeout, and the lazily allocated read
//   buffer. Whenever a descriptor is present it is in non-blocking mode at
//   the OS level; logical blocking is composed on top of it by the wait
//   primitive and the retry loops in connect.rs / send.rs / recv.rs.
//
// How it works:
//   - Handles are constructed without a descriptor; connect (or a lazy
//     datagram create on sendto) populates it.
//   - create() opens the descriptor with SOCK_CLOEXEC and immediately forces
//     O_NONBLOCK via fcntl, closing the descriptor again if that fails.
//   - close() is idempotent and unconditional about cleanup: the buffer is
//     dropped and the descriptor marked absent even when the close syscall
//     itself reports an error.
//
// Main components:
//   - Socket: the handle struct with lifecycle and timeout accessors.
//   - Kind: stream vs. datagram flavor, fixed at construction.
//

use crate::buffer::ReadBuffer;
use crate::deadline::Deadline;
use crate::error::{Result, SocketError};
use std::io;
use std::os::fd::RawFd;

/// Transport flavor of a handle, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Stream,
    Datagram,
}

/// One socket handle: an owned descriptor (or the closed sentinel `-1`), the
/// family it was created for, a caller-configurable timeout and an optional
/// read-side buffer.
#[derive(Debug)]
pub struct Socket {
    fd: RawFd,
    family: Option<libc::c_int>,
    kind: Kind,
    timeout: f64,
    pub(crate) buffer: Option<ReadBuffer>,
}

impl Socket {
    fn new(kind: Kind) -> Self {
        Socket {
            fd: -1,
            family: None,
            kind,
            timeout: -1.0, // wait forever by default
            buffer: None,
        }
    }

    /// A TCP-class handle with no descriptor yet.
    pub fn tcp() -> Self {
        Socket::new(Kind::Stream)
    }

    /// A UDP-class handle with no descriptor yet.
    pub fn udp() -> Self {
        Socket::new(Kind::Datagram)
    }

    /// The raw descriptor, `-1` when the handle is closed.
    pub fn fileno(&self) -> RawFd {
        self.fd
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Configured timeout in seconds; zero or less means wait forever.
    pub fn timeout(&self) -> f64 {
        self.timeout
    }

    /// Reconfigures the timeout applied to subsequent blocking operations.
    pub fn set_timeout(&mut self, seconds: f64) {
        self.timeout = seconds;
    }

    /// Opens a fresh deadline from the configured timeout. One per blocking
    /// operation, shared by all of its retry iterations.
    pub(crate) fn deadline(&self) -> Deadline {
        Deadline::new(self.timeout)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.fd < 0
    }

    /// Opens the descriptor for `family` and forces non-blocking mode.
    ///
    /// Programmer invariant: the handle holds no descriptor when this is
    /// called.
    pub(crate) fn create(&mut self, family: libc::c_int) -> Result<()> {
        debug_assert!(self.fd < 0, "descriptor already present");
        let ty = match self.kind {
            Kind::Stream => libc::SOCK_STREAM,
            Kind::Datagram => libc::SOCK_DGRAM,
        };
        let fd = unsafe { libc::socket(family, ty | libc::SOCK_CLOEXEC, 0) };
        if fd < 0 {
            return Err(SocketError::Io(io::Error::last_os_error()));
        }
        if let Err(e) = set_nonblocking(fd) {
            unsafe { libc::close(fd) };
            return Err(SocketError::Io(e));
        }
        self.fd = fd;
        self.family = Some(family);
        log::debug!("opened fd {fd} for family {family}");
        Ok(())
    }

    /// For datagram handles without a descriptor, opens one matching the
    /// destination family. Stream handles must connect first.
    pub(crate) fn ensure_descriptor(&mut self, family: libc::c_int) -> Result<()> {
        if self.fd >= 0 {
            return Ok(());
        }
        if self.kind != Kind::Datagram {
            return Err(SocketError::Closed);
        }
        self.create(family)
    }

    /// Closes the handle.
    ///
    /// Idempotent: closing an already closed handle is a no-op success. The
    /// read buffer is released and the descriptor marked absent regardless of
    /// whether the close syscall itself succeeds; only the syscall outcome is
    /// reported.
    pub fn close(&mut self) -> Result<()> {
        self.buffer = None;
        if self.fd < 0 {
            return Ok(());
        }
        let fd = self.fd;
        self.fd = -1;
        self.family = None;
        if unsafe { libc::close(fd) } < 0 {
            return Err(SocketError::Io(io::Error::last_os_error()));
        }
        log::debug!("closed fd {fd}");
        Ok(())
    }

    /// The lazily allocated read-side buffer.
    pub(crate) fn buffer_mut(&mut self) -> &mut ReadBuffer {
        self.buffer.get_or_insert_with(ReadBuffer::new)
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("close on drop failed: {e}");
        }
    }
}

/// Forces `O_NONBLOCK` on a freshly opened descriptor.
fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_handle_has_no_descriptor() {
        let s = Socket::tcp();
        assert_eq!(s.fileno(), -1);
        assert!(s.timeout() <= 0.0);
    }

    #[test]
    fn close_is_idempotent() {
        let mut s = Socket::udp();
        s.create(libc::AF_INET).unwrap();
        assert!(s.fileno() >= 0);
        s.close().unwrap();
        assert_eq!(s.fileno(), -1);
        // Second close must not touch any descriptor.
        s.close().unwrap();
        assert_eq!(s.fileno(), -1);
    }

    #[test]
    fn created_descriptor_is_nonblocking() {
        let mut s = Socket::udp();
        s.create(libc::AF_INET).unwrap();
        let flags = unsafe { libc::fcntl(s.fileno(), libc::F_GETFL) };
        assert!(flags >= 0);
        assert_ne!(flags & libc::O_NONBLOCK, 0);
    }

    #[test]
    fn stream_handle_without_descriptor_reports_closed() {
        let mut s = Socket::tcp();
        assert!(matches!(
            s.ensure_descriptor(libc::AF_INET),
            Err(SocketError::Closed)
        ));
    }

    #[test]
    fn timeout_is_mutable_any_time() {
        let mut s = Socket::tcp();
        s.set_timeout(2.5);
        assert_eq!(s.timeout(), 2.5);
        s.set_timeout(-1.0);
        assert!(s.timeout() <= 0.0);
    }
}
