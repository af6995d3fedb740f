//! Entities Layer: Socket Types
//!
//! Provides the platform independent vocabulary of the socket library.
//!
//! ## Overview
//!
//! The `entities_socket_types` crate is the innermost layer of the workspace.
//! Everything above it speaks in these types:
//! - **Status model**: [`StatusCode`], [`SocketError`], [`TransferError`]
//! - **Addresses**: [`Address`] with parsing and formatting
//! - **Socket parameters**: families, types, protocols, directions and
//!   message flags
//! - **Options**: portable option names and shared byte packing
//! - **Poll records**: interest and readiness exchanged with the native poll
//! - **Backend contract**: the [`SocketBackend`] trait implemented once per
//!   platform
//!
//! ## See Also
//!
//! - [`adapters_socket`](../adapters_socket/index.html): Core socket operations
//! - [`adapters_socket_unix`](../adapters_socket_unix/index.html): POSIX backend
//! - [`adapters_socket_win32`](../adapters_socket_win32/index.html): Winsock backend

pub mod address;
pub mod backend;
pub mod options;
pub mod poll;
pub mod status;
pub mod types;

pub use address::{
    ipv4_from_octets, Address, ADDRESS_TEXT_MAX, IPV4_ANY, IPV4_BROADCAST, IPV4_LOOPBACK, IPV4_NONE,
};
pub use backend::SocketBackend;
pub use options::{Linger, OptionLevel, SocketOption};
pub use poll::{timeout_to_millis, Interest, PollRequest, Readiness};
pub use status::{SocketError, SocketResult, StatusCategory, StatusCode, TransferError};
pub use types::{AddressFamily, Direction, Interface, MessageFlags, Protocol, SocketType, BACKLOG_MAX};
