//! Adapters Layer: Cross-Platform Socket Operations
//!
//! Provides the socket handle and the core operations every higher layer is
//! built on. Native calls go through the backend selected at compile time:
//! `adapters_socket_unix` on Unix-like systems and `adapters_socket_win32`
//! on Windows.
//!
//! ## Overview
//!
//! The `adapters_socket` crate provides:
//! - **Socket handle**: [`Socket`] owns one native handle and closes it on drop
//! - **Core operations**: create, bind, connect (by address or hostname),
//!   listen, accept, send, receive, shutdown and close
//! - **Options**: generic get/set plus typed wrappers for common options
//! - **Resolution**: hostname lookup and local interface listing
//! - **Library lifetime**: reference counted `init`/`free` of the native
//!   subsystem
//! - **Raw polling**: readiness polling on native handles, used by the pool
//!
//! ## Architecture
//!
//! This crate is part of the adapters layer. It depends on:
//! - `entities_socket_types`: status model, addresses and the backend trait
//! - one platform backend crate
//!
//! ## See Also
//!
//! - [`usecases_socket_framing`](../usecases_socket_framing/index.html): Line and netstring framing
//! - [`usecases_socket_pool`](../usecases_socket_pool/index.html): Multi-socket polling

pub mod library;
pub mod native;
pub mod options;
pub mod poll;
pub mod resolve;
pub mod socket;

pub use entities_socket_types::*;
pub use library::{free, init, init_count, LibraryGuard};
pub use native::{Native, RawSocket, INVALID_SOCKET};
pub use resolve::{local_interfaces, resolve_hostname, ConnectConfig, MAX_CANDIDATES};
pub use socket::Socket;
