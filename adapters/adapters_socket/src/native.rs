//! Native Backend Selection
//!
//! Picks the [`SocketBackend`] implementation for the target platform.

use entities_socket_types::SocketBackend;

/// Backend of the current platform
#[cfg(unix)]
pub type Native = adapters_socket_unix::PosixSockets;

/// Backend of the current platform
#[cfg(windows)]
pub type Native = adapters_socket_win32::WinsockSockets;

/// Native socket handle of the current platform
pub type RawSocket = <Native as SocketBackend>::Raw;

/// Handle value meaning "no socket"
pub const INVALID_SOCKET: RawSocket = <Native as SocketBackend>::INVALID;
