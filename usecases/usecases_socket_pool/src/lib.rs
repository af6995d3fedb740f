//! Use Cases Layer: Socket Polling Pool
//!
//! Waits on many sockets at once and reports which of them became ready.
//!
//! ## Overview
//!
//! A [`Pool`] is a registry of sockets, each with its own interest set
//! (readable, writable, error) and a piece of caller data handed back in every
//! event for that socket. [`Pool::poll`] blocks until at least one registered
//! socket satisfies one of its interests or the timeout expires.
//!
//! Readiness is level-triggered: a socket that is still ready after a poll is
//! reported again by the next one, so events that did not fit in one call are
//! never lost.
//!
//! The pool never owns sockets. Dropping or clearing it leaves every
//! registered socket open.
//!
//! ## See Also
//!
//! - [`adapters_socket`](../adapters_socket/index.html): Socket handle and raw polling

pub mod pool;

pub use pool::{PollEvent, Pool, PoolConfig, DEFAULT_POOL_CAPACITY, MUTE_INTERVAL};
