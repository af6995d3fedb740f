//! Poll Records Module
//!
//! Interest and readiness records exchanged with the native poll primitive.

use std::time::Duration;

/// Conditions a caller wants to be woken for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interest {
    /// Data can be read without blocking
    pub read: bool,
    /// Data can be written without blocking
    pub write: bool,
    /// An error or hang-up is pending
    pub error: bool,
}

impl Interest {
    /// Create an interest set
    pub const fn new(read: bool, write: bool, error: bool) -> Self {
        Self { read, write, error }
    }

    /// Whether no condition is requested
    pub fn is_empty(&self) -> bool {
        !self.read && !self.write && !self.error
    }
}

/// Conditions reported by the native poll primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Readiness {
    /// Readable
    pub readable: bool,
    /// Writable
    pub writable: bool,
    /// Error pending
    pub errored: bool,
    /// Peer hung up
    pub hung_up: bool,
    /// Handle is not an open socket
    pub invalid: bool,
}

impl Readiness {
    /// Whether any condition was reported
    pub fn any(&self) -> bool {
        self.readable || self.writable || self.errored || self.hung_up || self.invalid
    }
}

/// One entry of a native poll call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollRequest<R> {
    /// Native handle to watch
    pub raw: R,
    /// Requested conditions
    pub interest: Interest,
    /// Reported conditions, written by the poll call
    pub readiness: Readiness,
}

impl<R> PollRequest<R> {
    /// Create a request with cleared readiness
    pub fn new(raw: R, interest: Interest) -> Self {
        Self { raw, interest, readiness: Readiness::default() }
    }
}

/// Convert a poll timeout to whole milliseconds
///
/// `None` waits forever and maps to `-1`. Sub-millisecond remainders round up
/// so a short timeout never turns into a non-blocking poll, and long timeouts
/// saturate at `i32::MAX`.
pub fn timeout_to_millis(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(duration) => {
            let mut millis = duration.as_millis();
            if Duration::from_millis(millis as u64) < duration {
                millis += 1;
            }
            i32::try_from(millis).unwrap_or(i32::MAX)
        }
    }
}
