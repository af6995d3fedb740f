//! Winsock Error Table
//!
//! Maps `WSAGetLastError` codes onto the portable [`SocketError`] taxonomy.

use std::io;

use entities_socket_types::SocketError;
use windows_sys::Win32::Networking::WinSock::*;

/// Translate one Winsock error code
pub fn map_wsa_error(code: i32) -> SocketError {
    match code {
        0 => SocketError::Unknown,
        WSAEACCES => SocketError::PermissionDenied,
        WSAEAFNOSUPPORT | WSAEPROTONOSUPPORT | WSAEPROTOTYPE | WSAEOPNOTSUPP | WSAESOCKTNOSUPPORT
        | WSAENOPROTOOPT => SocketError::NotImplemented,
        WSAENOBUFS | WSAEMFILE => SocketError::Memory,
        WSAEINVAL | WSAENOTSOCK | WSAEFAULT | WSAEISCONN | WSAEMSGSIZE | WSAEADDRINUSE | WSAEADDRNOTAVAIL => {
            SocketError::InvalidArgument
        }
        WSAECONNREFUSED => SocketError::ConnectionRefused,
        WSAENOTCONN | WSAEDESTADDRREQ => SocketError::NotConnected,
        WSAECONNRESET | WSAECONNABORTED | WSAESHUTDOWN | WSAEDISCON => SocketError::SocketClosed,
        WSAEWOULDBLOCK | WSAEINPROGRESS | WSAEALREADY => SocketError::WouldBlock,
        WSAETIMEDOUT => SocketError::TimedOut,
        WSANOTINITIALISED => SocketError::NotInitialized,
        WSAHOST_NOT_FOUND | WSATRY_AGAIN | WSANO_RECOVERY | WSANO_DATA => SocketError::AddressLookupFailed,
        other => {
            log::debug!("unmapped winsock error {}", other);
            SocketError::System
        }
    }
}

/// Translate the calling thread's last Winsock error
pub(crate) fn last_error() -> SocketError {
    // SAFETY: reads thread local state only.
    map_wsa_error(unsafe { WSAGetLastError() })
}

/// Translate an `io::Error` carrying an OS code
pub(crate) fn map_io_error(error: io::Error) -> SocketError {
    match error.raw_os_error() {
        Some(code) => map_wsa_error(code),
        None => SocketError::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_codes() {
        assert_eq!(map_wsa_error(WSAECONNREFUSED), SocketError::ConnectionRefused);
        assert_eq!(map_wsa_error(WSAEWOULDBLOCK), SocketError::WouldBlock);
        assert_eq!(map_wsa_error(WSAETIMEDOUT), SocketError::TimedOut);
        assert_eq!(map_wsa_error(WSANOTINITIALISED), SocketError::NotInitialized);
        assert_eq!(map_wsa_error(WSAEDISCON), SocketError::SocketClosed);
        assert_eq!(map_wsa_error(WSAHOST_NOT_FOUND), SocketError::AddressLookupFailed);
    }

    #[test]
    fn test_unmapped_code_is_system() {
        assert_eq!(map_wsa_error(WSAELOOP), SocketError::System);
        assert_eq!(map_wsa_error(0), SocketError::Unknown);
    }
}
