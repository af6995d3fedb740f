//! Adapters Layer: POSIX Socket Backend
//!
//! Implements [`SocketBackend`](entities_socket_types::SocketBackend) on top of
//! the BSD socket API of Unix-like systems.
//!
//! ## Modules
//!
//! - **`errno`**: Translation of `errno` and resolver codes into `SocketError`
//! - **`sockaddr`**: Conversion between `Address` and native socket addresses
//! - **`posix`**: The backend itself
//!
//! ## See Also
//!
//! - [`adapters_socket_win32`](../adapters_socket_win32/index.html): Winsock backend
//! - [`adapters_socket`](../adapters_socket/index.html): Core operations built on this backend

#[cfg(unix)]
pub mod errno;
#[cfg(unix)]
pub mod posix;
#[cfg(unix)]
mod sockaddr;

#[cfg(unix)]
pub use errno::{map_errno, map_resolver_error};
#[cfg(unix)]
pub use posix::PosixSockets;
