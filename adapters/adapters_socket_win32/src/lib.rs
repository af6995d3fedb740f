//! Adapters Layer: Winsock Socket Backend
//!
//! Implements [`SocketBackend`](entities_socket_types::SocketBackend) on top of
//! Winsock 2.
//!
//! ## Modules
//!
//! - **`wsa_error`**: Translation of `WSAGetLastError` codes into `SocketError`
//! - **`winsock`**: The backend itself
//!
//! ## See Also
//!
//! - [`adapters_socket_unix`](../adapters_socket_unix/index.html): POSIX backend

#[cfg(windows)]
mod sockaddr;
#[cfg(windows)]
pub mod winsock;
#[cfg(windows)]
pub mod wsa_error;

#[cfg(windows)]
pub use winsock::WinsockSockets;
#[cfg(windows)]
pub use wsa_error::map_wsa_error;
