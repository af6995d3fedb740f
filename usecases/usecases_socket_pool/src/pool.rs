//! Polling Pool Module
//!
//! Registry of sockets with per-socket interests and a blocking wait that
//! reports which of them are ready.
//!
//! ## Layout
//!
//! Registrations live in an insertion-ordered map keyed by native handle. A
//! parallel vector of poll requests, kept in the same order, is handed to the
//! native poll call as is, so polling never rebuilds the request set.
//! Removal shifts both collections to keep registration order intact.
//!
//! ## Unrequested Conditions
//!
//! Native poll reports errors and hang-ups whether or not they were asked
//! for. A socket woken only by such a condition produces no event; it is
//! left out of the native set for [`MUTE_INTERVAL`] so the wait neither
//! returns early nor spins, then watched again.

use std::thread;
use std::time::Duration;

use indexmap::IndexMap;

use adapters_socket::poll::{pending_error, poll_until, Deadline};
use adapters_socket::{RawSocket, Socket, INVALID_SOCKET};
use entities_socket_types::{Interest, PollRequest, Readiness, SocketError, SocketResult};

/// Registrations the pool reserves room for up front
pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// Longest a socket woken only by unrequested conditions stays unwatched
pub const MUTE_INTERVAL: Duration = Duration::from_millis(50);

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Registrations to reserve space for at creation
    pub initial_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

/// One ready socket reported by [`Pool::poll`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollEvent<T> {
    /// Native handle of the ready socket
    pub socket: RawSocket,
    /// Caller data given at registration
    pub user_data: T,
    /// Readable, or at end of stream (a read will not block)
    pub can_read: bool,
    /// Writable
    pub can_write: bool,
    /// Pending error, only reported for sockets registered with error interest
    pub error: Option<SocketError>,
}

#[derive(Debug)]
struct Registration<T> {
    user_data: T,
}

/// Set of sockets polled together
///
/// The pool holds native handles, not sockets. Sockets must be removed before
/// they are closed; a handle closed while registered makes the next poll
/// report it as invalid to error-interested callers.
#[derive(Debug)]
pub struct Pool<T> {
    registrations: IndexMap<RawSocket, Registration<T>>,
    requests: Vec<PollRequest<RawSocket>>,
}

impl<T: Clone> Pool<T> {
    /// Create an empty pool with the default configuration
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty pool with the given configuration
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            registrations: IndexMap::with_capacity(config.initial_capacity),
            requests: Vec::with_capacity(config.initial_capacity),
        }
    }

    /// Register a socket
    ///
    /// # Arguments
    ///
    /// * `socket` - Socket to watch; the pool does not take ownership
    /// * `user_data` - Returned with every event for this socket
    /// * `want_read` - Report when readable
    /// * `want_write` - Report when writable
    /// * `want_error` - Report pending errors and hang-ups
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Registered
    /// * `Err(SocketError::InvalidArgument)` - The socket is the sentinel or is
    ///   already registered; remove it first to change its interests
    /// * `Err(SocketError::Memory)` - The registry could not grow
    pub fn add(
        &mut self,
        socket: &Socket,
        user_data: T,
        want_read: bool,
        want_write: bool,
        want_error: bool,
    ) -> SocketResult<()> {
        let raw = socket.as_raw();
        if raw == INVALID_SOCKET {
            return Err(SocketError::InvalidArgument);
        }
        if self.registrations.contains_key(&raw) {
            log::debug!("socket {:?} is already registered in the pool", raw);
            return Err(SocketError::InvalidArgument);
        }

        self.registrations.try_reserve(1).map_err(|_| SocketError::Memory)?;
        self.requests.try_reserve(1).map_err(|_| SocketError::Memory)?;

        let interest = Interest::new(want_read, want_write, want_error);
        self.registrations.insert(raw, Registration { user_data });
        self.requests.push(PollRequest::new(raw, interest));
        Ok(())
    }

    /// Deregister a socket
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The user data the socket was registered with
    /// * `Err(SocketError::InvalidArgument)` - The socket is not registered
    pub fn remove(&mut self, socket: &Socket) -> SocketResult<T> {
        self.remove_raw(socket.as_raw())
    }

    /// Deregister by native handle
    ///
    /// Useful when the socket value is already gone.
    pub fn remove_raw(&mut self, raw: RawSocket) -> SocketResult<T> {
        let (index, _, registration) = self
            .registrations
            .shift_remove_full(&raw)
            .ok_or(SocketError::InvalidArgument)?;
        self.requests.remove(index);
        Ok(registration.user_data)
    }

    /// Wait for registered sockets to become ready
    ///
    /// `events` is cleared and then filled with at most `capacity` events in
    /// registration order. Sockets that are ready beyond `capacity` are
    /// reported again by the next call.
    ///
    /// # Arguments
    ///
    /// * `events` - Output, reused between calls
    /// * `capacity` - Maximum events to report
    /// * `timeout` - `None` waits forever, zero does not block
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of events written; zero once `timeout` has
    ///   elapsed, or at once for an empty pool
    /// * `Err(SocketError::InvalidArgument)` - `capacity` is zero
    /// * `Err(SocketError)` - The native poll failed
    pub fn poll(
        &mut self,
        events: &mut Vec<PollEvent<T>>,
        capacity: usize,
        timeout: Option<Duration>,
    ) -> SocketResult<usize> {
        events.clear();
        if capacity == 0 {
            return Err(SocketError::InvalidArgument);
        }
        if self.requests.is_empty() {
            return Ok(0);
        }

        let deadline = Deadline::after(timeout);
        let mut muted = vec![false; self.requests.len()];
        loop {
            let wait = if muted.contains(&true) {
                Some(deadline.remaining().map_or(MUTE_INTERVAL, |left| left.min(MUTE_INTERVAL)))
            } else {
                deadline.remaining()
            };

            if self.poll_watched(&muted, wait)? > 0 {
                self.collect(events, capacity);
                if !events.is_empty() {
                    log::trace!("pool poll: {} reported", events.len());
                    return Ok(events.len());
                }
                for (flag, request) in muted.iter_mut().zip(&self.requests) {
                    *flag |= request.readiness.any();
                }
                log::trace!("pool poll: woken by unrequested conditions only");
            } else {
                muted.fill(false);
            }

            if deadline.has_passed() {
                return Ok(0);
            }
        }
    }

    /// One native wait over the registrations that are not muted
    fn poll_watched(&mut self, muted: &[bool], wait: Option<Duration>) -> SocketResult<usize> {
        for request in self.requests.iter_mut() {
            request.readiness = Readiness::default();
        }
        let deadline = Deadline::after(wait);
        if !muted.contains(&true) {
            return poll_until(&mut self.requests, deadline);
        }

        let (indices, mut watched): (Vec<usize>, Vec<_>) = self
            .requests
            .iter()
            .zip(muted)
            .enumerate()
            .filter(|&(_, (_, &skip))| !skip)
            .map(|(index, (request, _))| (index, PollRequest::new(request.raw, request.interest)))
            .unzip();
        if watched.is_empty() {
            if let Some(wait) = wait {
                thread::sleep(wait);
            }
            return Ok(0);
        }

        let ready = poll_until(&mut watched, deadline)?;
        for (index, request) in indices.into_iter().zip(watched) {
            self.requests[index].readiness = request.readiness;
        }
        Ok(ready)
    }

    fn collect(&self, events: &mut Vec<PollEvent<T>>, capacity: usize) {
        for (request, registration) in self.requests.iter().zip(self.registrations.values()) {
            if events.len() == capacity {
                break;
            }
            if let Some(event) = to_event(request, &registration.user_data) {
                events.push(event);
            }
        }
    }

    /// Deregister every socket without closing any of them
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.requests.clear();
    }

    /// Number of registered sockets
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether no socket is registered
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Whether `socket` is registered
    pub fn contains(&self, socket: &Socket) -> bool {
        self.registrations.contains_key(&socket.as_raw())
    }
}

impl<T: Clone> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn to_event<T: Clone>(request: &PollRequest<RawSocket>, user_data: &T) -> Option<PollEvent<T>> {
    let interest = request.interest;
    let readiness = request.readiness;

    let can_read = interest.read && (readiness.readable || readiness.hung_up);
    let can_write = interest.write && readiness.writable;
    let error = if interest.error {
        error_condition(request.raw, readiness)
    } else {
        None
    };

    if !can_read && !can_write && error.is_none() {
        return None;
    }
    Some(PollEvent {
        socket: request.raw,
        user_data: user_data.clone(),
        can_read,
        can_write,
        error,
    })
}

fn error_condition(raw: RawSocket, readiness: Readiness) -> Option<SocketError> {
    if readiness.invalid {
        return Some(SocketError::InvalidArgument);
    }
    if readiness.errored {
        return match pending_error(raw) {
            Ok(Some(error)) => Some(error),
            Ok(None) if readiness.hung_up => Some(SocketError::SocketClosed),
            Ok(None) => Some(SocketError::Unknown),
            Err(error) => Some(error),
        };
    }
    if readiness.hung_up {
        return Some(SocketError::SocketClosed);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters_socket::{Address, AddressFamily, MessageFlags, Protocol, SocketType, IPV4_LOOPBACK};

    fn bound_udp() -> (Socket, Address) {
        let socket = Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
        socket.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
        let address = socket.local_address().unwrap();
        (socket, address)
    }

    #[test]
    fn test_add_rejects_sentinel_and_duplicates() {
        let mut pool = Pool::new();
        let (socket, _) = bound_udp();

        assert_eq!(pool.add(&Socket::invalid(), 0, true, false, false), Err(SocketError::InvalidArgument));
        pool.add(&socket, 1, true, false, false).unwrap();
        assert_eq!(pool.add(&socket, 2, false, true, false), Err(SocketError::InvalidArgument));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&socket));
    }

    #[test]
    fn test_remove_returns_user_data() {
        let mut pool = Pool::new();
        let (socket, _) = bound_udp();

        assert_eq!(pool.remove(&socket), Err(SocketError::InvalidArgument));
        pool.add(&socket, "first", true, false, false).unwrap();
        assert_eq!(pool.remove(&socket), Ok("first"));
        assert!(pool.is_empty());
        assert_eq!(pool.remove(&socket), Err(SocketError::InvalidArgument));
    }

    #[test]
    fn test_empty_pool_returns_immediately() {
        let mut pool: Pool<u32> = Pool::new();
        let mut events = Vec::new();
        assert_eq!(pool.poll(&mut events, 4, None), Ok(0));
        assert!(events.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut pool = Pool::new();
        let (socket, _) = bound_udp();
        pool.add(&socket, (), true, false, false).unwrap();

        let mut events = Vec::new();
        assert_eq!(pool.poll(&mut events, 0, Some(Duration::ZERO)), Err(SocketError::InvalidArgument));
    }

    #[test]
    fn test_idle_sockets_time_out() {
        let mut pool = Pool::new();
        let (first, _) = bound_udp();
        let (second, _) = bound_udp();
        pool.add(&first, 1, true, false, false).unwrap();
        pool.add(&second, 2, true, false, false).unwrap();

        let mut events = Vec::new();
        assert_eq!(pool.poll(&mut events, 4, Some(Duration::from_millis(20))), Ok(0));
    }

    #[test]
    fn test_write_interest_reports_writable() {
        let mut pool = Pool::new();
        let (socket, _) = bound_udp();
        pool.add(&socket, 7, false, true, false).unwrap();

        let mut events = Vec::new();
        assert_eq!(pool.poll(&mut events, 4, Some(Duration::from_secs(1))), Ok(1));
        assert_eq!(events[0].user_data, 7);
        assert!(events[0].can_write);
        assert!(!events[0].can_read);
        assert_eq!(events[0].error, None);
    }

    #[test]
    fn test_capacity_limits_and_level_triggering() {
        let mut pool = Pool::new();
        let (first, _) = bound_udp();
        let (second, _) = bound_udp();
        pool.add(&first, 'a', false, true, false).unwrap();
        pool.add(&second, 'b', false, true, false).unwrap();

        let mut events = Vec::new();
        for _ in 0..2 {
            assert_eq!(pool.poll(&mut events, 1, Some(Duration::from_secs(1))), Ok(1));
            assert_eq!(events[0].user_data, 'a');
            assert_eq!(events[0].socket, first.as_raw());
        }
        assert_eq!(pool.poll(&mut events, 2, Some(Duration::from_secs(1))), Ok(2));
        assert_eq!(events[1].user_data, 'b');
    }

    #[test]
    fn test_registration_order_survives_removal() {
        let mut pool = Pool::new();
        let sockets: Vec<_> = (0..4).map(|_| bound_udp().0).collect();
        for (index, socket) in sockets.iter().enumerate() {
            pool.add(socket, index, false, true, false).unwrap();
        }
        pool.remove(&sockets[1]).unwrap();

        let mut events = Vec::new();
        pool.poll(&mut events, 8, Some(Duration::from_secs(1))).unwrap();
        let order: Vec<_> = events.iter().map(|event| event.user_data).collect();
        assert_eq!(order, vec![0, 2, 3]);
    }

    #[test]
    fn test_clear_leaves_sockets_open() {
        let mut pool = Pool::new();
        let (receiver, address) = bound_udp();
        pool.add(&receiver, (), true, false, false).unwrap();
        pool.clear();
        assert!(pool.is_empty());

        let (sender, _) = bound_udp();
        sender.send_to(b"still open", MessageFlags::empty(), &address).unwrap();
        let mut buffer = [0u8; 16];
        let (received, _) = receiver.receive_from(&mut buffer, MessageFlags::empty()).unwrap();
        assert_eq!(&buffer[..received], b"still open");
    }

    #[test]
    fn test_error_condition_classification() {
        let (socket, _) = bound_udp();
        let raw = socket.as_raw();

        let invalid = Readiness { invalid: true, ..Readiness::default() };
        assert_eq!(error_condition(raw, invalid), Some(SocketError::InvalidArgument));

        let hung_up = Readiness { hung_up: true, ..Readiness::default() };
        assert_eq!(error_condition(raw, hung_up), Some(SocketError::SocketClosed));

        assert_eq!(error_condition(raw, Readiness::default()), None);
    }

    #[test]
    fn test_unwanted_conditions_are_skipped() {
        let request = PollRequest {
            raw: INVALID_SOCKET,
            interest: Interest::new(true, false, false),
            readiness: Readiness { writable: true, ..Readiness::default() },
        };
        assert_eq!(to_event(&request, &()), None);

        let request = PollRequest {
            readiness: Readiness { hung_up: true, ..Readiness::default() },
            ..request
        };
        let event = to_event(&request, &()).unwrap();
        assert!(event.can_read);
        assert_eq!(event.error, None);
    }
}
