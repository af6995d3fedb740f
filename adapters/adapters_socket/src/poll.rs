//! Raw Poll Module
//!
//! Readiness polling and pending error queries on native handles. The pool
//! keeps raw handles rather than borrowing sockets, so it polls through here.

use std::time::{Duration, Instant};

use entities_socket_types::{PollRequest, SocketBackend, SocketError, SocketResult};

use crate::native::{Native, RawSocket, INVALID_SOCKET};

/// Point in time a wait gives up, or never
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `timeout` from now; `None` never expires
    pub fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.and_then(|timeout| Instant::now().checked_add(timeout)))
    }

    /// Deadline that never expires
    pub fn never() -> Self {
        Self(None)
    }

    /// Time left, zero once passed and `None` for no deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the deadline has passed
    pub fn has_passed(&self) -> bool {
        self.0.map_or(false, |deadline| Instant::now() >= deadline)
    }
}

/// Wait for readiness on a set of native handles
///
/// # Arguments
///
/// * `requests` - Handles and interests; readiness is written back in place
/// * `timeout` - `None` waits forever, zero polls without blocking
///
/// # Returns
///
/// * `Ok(usize)` - Number of requests reporting a condition, zero only once
///   `timeout` has elapsed or for an empty set
/// * `Err(SocketError::InvalidArgument)` - A request holds the sentinel
pub fn poll(requests: &mut [PollRequest<RawSocket>], timeout: Option<Duration>) -> SocketResult<usize> {
    poll_until(requests, Deadline::after(timeout))
}

/// Wait for readiness until `deadline`
///
/// Native waits that end early without a condition, e.g. on a signal, are
/// resumed with the time that is left.
pub fn poll_until(requests: &mut [PollRequest<RawSocket>], deadline: Deadline) -> SocketResult<usize> {
    if requests.iter().any(|request| request.raw == INVALID_SOCKET) {
        return Err(SocketError::InvalidArgument);
    }
    if requests.is_empty() {
        return Ok(0);
    }
    loop {
        let timeout = deadline.remaining();
        log::trace!("polling {} handle(s), timeout {:?}", requests.len(), timeout);
        let ready = Native::poll(requests, timeout)?;
        if ready > 0 || deadline.has_passed() {
            return Ok(ready);
        }
    }
}

/// Read and clear the pending error of a native handle
pub fn pending_error(raw: RawSocket) -> SocketResult<Option<SocketError>> {
    if raw == INVALID_SOCKET {
        return Err(SocketError::InvalidArgument);
    }
    Native::pending_error(raw)
}
