//! # Operation Deadlines
//!
//! ## Purpose
//!
//! This file provides the `Deadline` type, which turns a relative timeout in
//! seconds into an absolute point in time. Every logically blocking operation
//! (connect, send, recv, select) opens one `Deadline` at its start and keeps
//! consulting it across retry iterations, so the cumulative wait of one call
//! is bounded by the original timeout rather than reset on each retry.
//!
//! ## How it works
//!
//! A timeout of zero or less means "wait forever": the deadline is unbounded
//! and `remaining()` reports `None`. A positive timeout captures
//! `Instant::now()` at construction and stores the expiry instant; from then
//! on `remaining()` reports the clamped leftover, reaching exactly zero at or
//! past expiry and never going negative.
//!
//! ## Main components
//!
//! - `Deadline`: the immutable deadline value.
//! - `poll_millis()`: conversion of the leftover time into a `libc::poll`
//!   timeout argument.

use std::time::{Duration, Instant};

/// An absolute deadline derived from a relative timeout in seconds.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    /// Opens a deadline `timeout_seconds` from now.
    ///
    /// A timeout of zero or less produces an unbounded deadline that never
    /// expires.
    pub fn new(timeout_seconds: f64) -> Self {
        if timeout_seconds <= 0.0 {
            Deadline { expires_at: None }
        } else {
            Deadline {
                expires_at: Some(Instant::now() + Duration::from_secs_f64(timeout_seconds)),
            }
        }
    }

    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Deadline { expires_at: None }
    }

    /// Time left before expiry.
    ///
    /// Returns `None` for an unbounded deadline. For a bounded one the value
    /// is clamped at zero, so it is exactly `Duration::ZERO` once the deadline
    /// has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// True once a bounded deadline has passed. An unbounded deadline never
    /// expires.
    pub fn expired(&self) -> bool {
        matches!(self.remaining(), Some(d) if d.is_zero())
    }

    /// Converts the leftover time into a `libc::poll` timeout in milliseconds.
    ///
    /// Unbounded deadlines convert to `-1` (poll forever). A bounded deadline
    /// with any time left rounds up to at least one millisecond, so leftover
    /// sub-millisecond budget never turns into a premature zero-timeout poll.
    pub fn poll_millis(&self) -> i32 {
        match self.remaining() {
            None => -1,
            Some(d) if d.is_zero() => 0,
            Some(d) => {
                let ms = d.as_millis();
                if ms == 0 {
                    1
                } else if ms > i32::MAX as u128 {
                    i32::MAX
                } else {
                    ms as i32
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn nonpositive_timeout_is_unbounded() {
        for t in [0.0, -1.0, -0.001] {
            let d = Deadline::new(t);
            assert_eq!(d.remaining(), None);
            assert!(!d.expired());
            assert_eq!(d.poll_millis(), -1);
        }
        assert_eq!(Deadline::unbounded().poll_millis(), -1);
    }

    #[test]
    fn fresh_deadline_reports_close_to_timeout() {
        let d = Deadline::new(10.0);
        let left = d.remaining().unwrap();
        assert!(left <= Duration::from_secs(10));
        assert!(left > Duration::from_secs(9));
    }

    #[test]
    fn remaining_clamps_to_zero_after_expiry() {
        let d = Deadline::new(0.01);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(d.remaining(), Some(Duration::ZERO));
        assert!(d.expired());
        assert_eq!(d.poll_millis(), 0);
    }

    #[test]
    fn submillisecond_leftover_rounds_up() {
        // A freshly opened 2ms deadline must not poll with timeout 0.
        let d = Deadline::new(0.002);
        assert!(d.poll_millis() >= 1);
    }
}
