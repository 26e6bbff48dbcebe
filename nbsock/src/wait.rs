//!
//! # Single-Descriptor Readiness Waits
//!
//! ## Purpose
//!
//! This file provides the wait primitive that every logically blocking
//! operation suspends on. It polls one file descriptor for readability or
//! writability, bounded by an operation deadline, and classifies the outcome
//! as ready, timed out, or a poll error.
//!
//! ## How it works
//!
//! The descriptor is always kept in non-blocking mode at the OS level, so the
//! I/O syscalls themselves never block; `wait_ready` is the only place a
//! caller sleeps. It uses `libc::poll` with the deadline's leftover time as
//! the timeout. A poll interrupted by a signal is retried with a recomputed
//! timeout, so the total wait never exceeds the deadline and EINTR is never
//! surfaced to the caller.
//!
//! ## Main components
//!
//! - `Interest`: which readiness condition to wait for.
//! - `Readiness`: the two non-error outcomes of a wait.
//! - `wait_ready()`: the poll loop.

use crate::deadline::Deadline;
use std::io;
use std::os::fd::RawFd;

/// Readiness condition to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Readable,
    Writable,
    Both,
}

impl Interest {
    fn events(self) -> libc::c_short {
        match self {
            Interest::Readable => libc::POLLIN,
            Interest::Writable => libc::POLLOUT,
            Interest::Both => libc::POLLIN | libc::POLLOUT,
        }
    }
}

/// Non-error outcome of a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    TimedOut,
}

/// Waits until `fd` is ready for `interest` or the deadline expires.
///
/// Contract:
/// - A closed descriptor (`fd < 0`) is reported `Ready` immediately; closed
///   sockets never block, the subsequent syscall reports the real condition.
/// - An already expired deadline is reported `TimedOut` without polling.
/// - `POLLERR`/`POLLHUP` revents count as `Ready` for the same reason as the
///   closed-descriptor case.
///
/// # Errors
///
/// Any poll failure other than `EINTR` is returned as the raw OS error.
pub fn wait_ready(fd: RawFd, interest: Interest, deadline: &Deadline) -> io::Result<Readiness> {
    if fd < 0 {
        return Ok(Readiness::Ready);
    }
    loop {
        if deadline.expired() {
            return Ok(Readiness::TimedOut);
        }
        let mut fds = [libc::pollfd {
            fd,
            events: interest.events(),
            revents: 0,
        }];
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), 1, deadline.poll_millis()) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                // Retry with the recomputed leftover time.
                continue;
            }
            return Err(err);
        }
        if rc == 0 {
            return Ok(Readiness::TimedOut);
        }
        return Ok(Readiness::Ready);
    }
}
