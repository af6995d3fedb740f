//! Native address conversion
//!
//! Winsock has no link layer sockets, so only IP endpoints convert.

use std::mem;
use std::net::SocketAddr;
use std::ptr;

use entities_socket_types::{Address, SocketError, SocketResult};
use socket2::SockAddr;
use windows_sys::Win32::Networking::WinSock::{AF_INET, AF_INET6, SOCKADDR, SOCKADDR_IN, SOCKADDR_IN6};

/// Encode an address for `bind`, `connect` and `sendto`
pub(crate) fn to_native(address: &Address) -> SocketResult<SockAddr> {
    match *address {
        Address::V4 { .. } | Address::V6 { .. } => Ok(SockAddr::from(SocketAddr::try_from(*address)?)),
        Address::LinkLayer { .. } => Err(SocketError::NotImplemented),
        Address::Unspecified => Err(SocketError::InvalidArgument),
    }
}

/// Decode an address filled in by `accept`, `recvfrom` or `getsockname`
pub(crate) fn from_native(addr: &SockAddr) -> Address {
    // SAFETY: SockAddr owns a full SOCKADDR_STORAGE and reports the valid length.
    unsafe { decode_raw(addr.as_ptr().cast(), addr.len() as usize) }
}

/// Decode a raw native address
///
/// # Safety
///
/// `ptr` must be null or point to at least `len` readable bytes.
pub(crate) unsafe fn decode_raw(ptr: *const SOCKADDR, len: usize) -> Address {
    if ptr.is_null() || len < mem::size_of::<u16>() {
        return Address::Unspecified;
    }

    let family = (*ptr).sa_family;
    if family == AF_INET && len >= mem::size_of::<SOCKADDR_IN>() {
        let sin = ptr::read_unaligned(ptr.cast::<SOCKADDR_IN>());
        Address::ipv4(u32::from_be(sin.sin_addr.S_un.S_addr), u16::from_be(sin.sin_port))
    } else if family == AF_INET6 && len >= mem::size_of::<SOCKADDR_IN6>() {
        let sin6 = ptr::read_unaligned(ptr.cast::<SOCKADDR_IN6>());
        Address::ipv6(
            u128::from_be_bytes(sin6.sin6_addr.u.Byte),
            sin6.Anonymous.sin6_scope_id,
            u16::from_be(sin6.sin6_port),
        )
    } else {
        Address::Unspecified
    }
}
