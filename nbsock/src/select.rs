//!
//! # Batch Readiness Waits
//!
//! ## Purpose
//!
//! This file implements the bulk "wait on many sockets" primitive. It polls a
//! read set and a write set of descriptors under one deadline and returns the
//! ready subset of each, so an embedder can drive several handles without an
//! event reactor.
//!
//! ## How it works
//!
//! Both input sets are flattened into one `pollfd` array (read entries first,
//! then write entries; a descriptor may appear in both sets and gets one entry
//! per set). The poll is retried on signal interruption with the deadline's
//! recomputed leftover time. Zero ready events is reported as a timeout error;
//! any non-empty outcome, even with one of the two sets empty, is success.
//!
//! ## Main components
//!
//! - `MAX_SELECT_FDS`: per-set descriptor limit, checked before polling.
//! - `select_fds()`: the batch wait.

use crate::deadline::Deadline;
use crate::error::{Result, SocketError};
use std::io;
use std::os::fd::RawFd;

/// Upper bound on the number of descriptors per input set.
pub const MAX_SELECT_FDS: usize = 64;

const READY_IN: libc::c_short = libc::POLLIN | libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;
const READY_OUT: libc::c_short = libc::POLLOUT | libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;

/// Waits until at least one descriptor of either set becomes ready, or the
/// timeout elapses.
///
/// `timeout_seconds <= 0` waits without bound. Returns the ready subsets of
/// `read_fds` and `write_fds`, preserving input order. Partial readiness is
/// success: a timeout error is returned only when *nothing* became ready.
///
/// # Errors
///
/// - `SocketError::Argument` if either set exceeds [`MAX_SELECT_FDS`], or if
///   both sets are empty (there is nothing to wait on).
/// - `SocketError::Timeout` when the deadline elapses with no ready
///   descriptor.
/// - `SocketError::Io` on a poll failure other than `EINTR`.
pub fn select_fds(
    read_fds: &[RawFd],
    write_fds: &[RawFd],
    timeout_seconds: f64,
) -> Result<(Vec<RawFd>, Vec<RawFd>)> {
    if read_fds.len() > MAX_SELECT_FDS {
        return Err(SocketError::Argument(format!(
            "too many read descriptors: {} (limit {MAX_SELECT_FDS})",
            read_fds.len()
        )));
    }
    if write_fds.len() > MAX_SELECT_FDS {
        return Err(SocketError::Argument(format!(
            "too many write descriptors: {} (limit {MAX_SELECT_FDS})",
            write_fds.len()
        )));
    }
    if read_fds.is_empty() && write_fds.is_empty() {
        return Err(SocketError::Argument("no descriptors to wait on".into()));
    }

    let mut pfds: Vec<libc::pollfd> = Vec::with_capacity(read_fds.len() + write_fds.len());
    for &fd in read_fds {
        pfds.push(libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        });
    }
    for &fd in write_fds {
        pfds.push(libc::pollfd {
            fd,
            events: libc::POLLOUT,
            revents: 0,
        });
    }

    let deadline = Deadline::new(timeout_seconds);
    loop {
        if deadline.expired() {
            return Err(SocketError::Timeout);
        }
        let rc = unsafe { libc::poll(pfds.as_mut_ptr(), pfds.len() as libc::nfds_t, deadline.poll_millis()) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return Err(SocketError::Io(err));
        }
        if rc == 0 {
            return Err(SocketError::Timeout);
        }
        break;
    }

    let ready_read: Vec<RawFd> = pfds[..read_fds.len()]
        .iter()
        .filter(|p| p.revents & READY_IN != 0)
        .map(|p| p.fd)
        .collect();
    let ready_write: Vec<RawFd> = pfds[read_fds.len()..]
        .iter()
        .filter(|p| p.revents & READY_OUT != 0)
        .map(|p| p.fd)
        .collect();
    Ok((ready_read, ready_write))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_sets_fail_before_polling() {
        let fds: Vec<RawFd> = (0..(MAX_SELECT_FDS as RawFd + 1)).collect();
        assert!(matches!(
            select_fds(&fds, &[], 0.1),
            Err(SocketError::Argument(_))
        ));
        assert!(matches!(
            select_fds(&[], &fds, 0.1),
            Err(SocketError::Argument(_))
        ));
    }

    #[test]
    fn empty_sets_are_an_argument_error() {
        assert!(matches!(
            select_fds(&[], &[], 0.1),
            Err(SocketError::Argument(_))
        ));
    }

    #[test]
    fn pipe_ends_classify_into_the_right_sets() {
        let mut fds = [0 as RawFd; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let (r, w) = (fds[0], fds[1]);

        // Write end is ready at once; empty read end is not.
        let (ready_read, ready_write) = select_fds(&[r], &[w], 0.05).unwrap();
        assert!(ready_read.is_empty());
        assert_eq!(ready_write, vec![w]);

        // Nothing to read and nothing asked for writing: timeout.
        assert!(matches!(select_fds(&[r], &[], 0.05), Err(SocketError::Timeout)));

        unsafe {
            libc::close(r);
            libc::close(w);
        }
    }
}
