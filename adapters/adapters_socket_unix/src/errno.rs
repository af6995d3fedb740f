//! POSIX Error Table
//!
//! Maps `errno` values and `getaddrinfo` return codes onto the portable
//! [`SocketError`] taxonomy. Codes without a dedicated mapping become
//! [`SocketError::System`]; the raw value is logged at debug level so it is
//! not lost entirely.

use std::io;

use entities_socket_types::SocketError;
use nix::errno::Errno;

/// Translate one `errno` value
pub fn map_errno(errno: Errno) -> SocketError {
    match errno {
        Errno::EACCES | Errno::EPERM => SocketError::PermissionDenied,
        Errno::EAFNOSUPPORT
        | Errno::EPROTONOSUPPORT
        | Errno::EPROTOTYPE
        | Errno::EOPNOTSUPP
        | Errno::ESOCKTNOSUPPORT
        | Errno::ENOPROTOOPT => SocketError::NotImplemented,
        Errno::ENOMEM | Errno::ENOBUFS | Errno::EMFILE | Errno::ENFILE => SocketError::Memory,
        Errno::EINVAL
        | Errno::EBADF
        | Errno::ENOTSOCK
        | Errno::EFAULT
        | Errno::EISCONN
        | Errno::EMSGSIZE
        | Errno::EADDRINUSE
        | Errno::EADDRNOTAVAIL => SocketError::InvalidArgument,
        Errno::ECONNREFUSED => SocketError::ConnectionRefused,
        Errno::ENOTCONN | Errno::EDESTADDRREQ => SocketError::NotConnected,
        Errno::ECONNRESET | Errno::ECONNABORTED | Errno::EPIPE | Errno::ESHUTDOWN => {
            SocketError::SocketClosed
        }
        Errno::EAGAIN | Errno::EINPROGRESS | Errno::EALREADY => SocketError::WouldBlock,
        Errno::ETIMEDOUT => SocketError::TimedOut,
        Errno::UnknownErrno => SocketError::Unknown,
        other => {
            log::debug!("unmapped errno {} ({})", other as i32, other.desc());
            SocketError::System
        }
    }
}

/// Translate the calling thread's current `errno`
pub(crate) fn last_error() -> SocketError {
    map_errno(Errno::last())
}

/// Translate an `io::Error` carrying an OS code
pub(crate) fn map_io_error(error: io::Error) -> SocketError {
    match error.raw_os_error() {
        Some(code) => map_errno(Errno::from_i32(code)),
        None => SocketError::Unknown,
    }
}

/// Translate a non-zero `getaddrinfo` return code
pub fn map_resolver_error(code: libc::c_int) -> SocketError {
    match code {
        libc::EAI_MEMORY => SocketError::Memory,
        libc::EAI_FAMILY | libc::EAI_SOCKTYPE | libc::EAI_SERVICE => SocketError::NotImplemented,
        libc::EAI_BADFLAGS => SocketError::InvalidArgument,
        libc::EAI_SYSTEM => last_error(),
        _ => SocketError::AddressLookupFailed,
    }
}
