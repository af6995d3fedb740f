//! Native address conversion
//!
//! IP endpoints go through `socket2::SockAddr`. Link layer endpoints use
//! `sockaddr_ll`, which only exists on Linux and Android and is the one
//! layout neither socket2 nor nix builds for us.

use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};

use entities_socket_types::{Address, SocketError, SocketResult};
use nix::sys::socket::SockaddrStorage;
use socket2::SockAddr;

/// Encode an address for `bind`, `connect` and `sendto`
pub(crate) fn to_native(address: &Address) -> SocketResult<SockAddr> {
    match *address {
        Address::V4 { .. } | Address::V6 { .. } => {
            let std_addr = SocketAddr::try_from(*address)?;
            Ok(SockAddr::from(std_addr))
        }
        Address::LinkLayer { mac, interface_id, protocol } => link_layer(mac, interface_id, protocol),
        Address::Unspecified => Err(SocketError::InvalidArgument),
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn link_layer(mac: [u8; 6], interface_id: u32, protocol: u16) -> SocketResult<SockAddr> {
    let interface_id = libc::c_int::try_from(interface_id).map_err(|_| SocketError::InvalidArgument)?;

    // SAFETY: try_init hands out zeroed storage large enough for any
    // sockaddr; sockaddr_ll fits and every field written is in bounds.
    let ((), addr) = unsafe {
        SockAddr::try_init(|storage, len| {
            let ll = &mut *storage.cast::<libc::sockaddr_ll>();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = protocol.to_be();
            ll.sll_ifindex = interface_id;
            ll.sll_halen = 6;
            ll.sll_addr[..6].copy_from_slice(&mac);
            *len = std::mem::size_of::<libc::sockaddr_ll>() as _;
            Ok(())
        })
    }
    .map_err(|_| SocketError::Unknown)?;

    Ok(addr)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn link_layer(_mac: [u8; 6], _interface_id: u32, _protocol: u16) -> SocketResult<SockAddr> {
    Err(SocketError::NotImplemented)
}

/// Decode an address filled in by `accept`, `recvfrom` or `getsockname`
pub(crate) fn from_native(addr: &SockAddr) -> Address {
    if let Some(ip) = addr.as_socket() {
        return Address::from(ip);
    }
    // SAFETY: SockAddr always owns a full sockaddr_storage and reports the
    // valid length.
    unsafe { decode_raw(addr.as_ptr(), addr.len() as usize) }
}

/// Decode an interface address reported by `getifaddrs`
pub(crate) fn from_storage(storage: &SockaddrStorage) -> Address {
    if let Some(v4) = storage.as_sockaddr_in() {
        return Address::from(SocketAddr::V4(SocketAddrV4::from(*v4)));
    }
    if let Some(v6) = storage.as_sockaddr_in6() {
        return Address::from(SocketAddr::V6(SocketAddrV6::from(*v6)));
    }
    link_layer_storage(storage)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn link_layer_storage(storage: &SockaddrStorage) -> Address {
    match storage.as_link_addr().and_then(|link| Some((link.addr()?, link))) {
        Some((mac, link)) => Address::link_layer(mac, link.ifindex() as u32, u16::from_be(link.protocol())),
        None => Address::Unspecified,
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn link_layer_storage(_storage: &SockaddrStorage) -> Address {
    Address::Unspecified
}

/// Decode a raw native address
///
/// Families other than IPv4, IPv6 and (on Linux) packet sockets decode as
/// [`Address::Unspecified`], as does a truncated address.
///
/// # Safety
///
/// `ptr` must be null or point to at least `len` readable bytes.
pub(crate) unsafe fn decode_raw(ptr: *const libc::sockaddr, len: usize) -> Address {
    if ptr.is_null() || len < std::mem::size_of::<libc::sa_family_t>() {
        return Address::Unspecified;
    }

    match libc::c_int::from((*ptr).sa_family) {
        libc::AF_INET if len >= std::mem::size_of::<libc::sockaddr_in>() => {
            let sin = std::ptr::read_unaligned(ptr.cast::<libc::sockaddr_in>());
            Address::ipv4(u32::from_be(sin.sin_addr.s_addr), u16::from_be(sin.sin_port))
        }
        libc::AF_INET6 if len >= std::mem::size_of::<libc::sockaddr_in6>() => {
            let sin6 = std::ptr::read_unaligned(ptr.cast::<libc::sockaddr_in6>());
            Address::ipv6(
                u128::from_be_bytes(sin6.sin6_addr.s6_addr),
                sin6.sin6_scope_id,
                u16::from_be(sin6.sin6_port),
            )
        }
        #[cfg(any(target_os = "linux", target_os = "android"))]
        libc::AF_PACKET if len >= std::mem::size_of::<libc::sockaddr_ll>() => {
            let ll = std::ptr::read_unaligned(ptr.cast::<libc::sockaddr_ll>());
            let mut mac = [0u8; 6];
            mac.copy_from_slice(&ll.sll_addr[..6]);
            Address::link_layer(mac, ll.sll_ifindex as u32, u16::from_be(ll.sll_protocol))
        }
        _ => Address::Unspecified,
    }
}
