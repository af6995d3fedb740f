//! Socket Options Module
//!
//! Portable option levels and names for the generic get/set option
//! primitives, and the byte packing shared by both platforms.
//!
//! Integer and boolean options are a native `int` on every supported platform
//! and IPv4 multicast membership requests share the `ip_mreq` layout, so those
//! are packed here. Layouts that differ per platform (linger, timeouts) are
//! packed by the backend through [`SocketBackend`](crate::backend::SocketBackend).

use crate::status::{SocketError, SocketResult};

/// Option level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionLevel {
    /// Socket level (`SOL_SOCKET`)
    Socket,
    /// IPv4 level (`IPPROTO_IP`)
    Ip,
    /// IPv6 level (`IPPROTO_IPV6`)
    Ipv6,
    /// TCP level (`IPPROTO_TCP`)
    Tcp,
    /// Native level value, passed through untranslated
    Native(i32),
}

/// Option name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketOption {
    /// Permit sending broadcast datagrams
    Broadcast,
    /// Send keep-alive packets
    KeepAlive,
    /// Linger on close while unsent data remains
    Linger,
    /// Allow reuse of local addresses
    ReuseAddress,
    /// Receive buffer size in bytes
    ReceiveBuffer,
    /// Send buffer size in bytes
    SendBuffer,
    /// Receive timeout
    ReceiveTimeout,
    /// Send timeout
    SendTimeout,
    /// Deliver out-of-band data inline
    OutOfBandInline,
    /// Queuing priority of outgoing packets
    Priority,
    /// Disable Nagle's algorithm
    NoDelay,
    /// Join an IPv4 multicast group
    MembershipAdd,
    /// Leave an IPv4 multicast group
    MembershipDrop,
    /// Loop multicast datagrams back to local sockets
    MulticastLoop,
    /// Pending socket error, cleared when read
    Error,
    /// Native option value, passed through untranslated
    Native(i32),
}

/// Linger setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Linger {
    /// Whether close lingers
    pub enabled: bool,
    /// Linger time in seconds
    pub seconds: u16,
}

/// Byte size of a native `int` option value
pub const INT_OPTION_SIZE: usize = 4;

/// Byte size of an IPv4 multicast membership request
pub const MEMBERSHIP_SIZE: usize = 8;

/// Pack an integer option value
pub fn encode_int(value: i32) -> [u8; INT_OPTION_SIZE] {
    value.to_ne_bytes()
}

/// Pack a boolean option value
pub fn encode_bool(value: bool) -> [u8; INT_OPTION_SIZE] {
    encode_int(i32::from(value))
}

/// Unpack an integer option value
///
/// Accepts values shorter than an `int`; some platforms report boolean
/// options as a single byte.
///
/// # Returns
///
/// * `Ok(i32)` - Decoded value
/// * `Err(SocketError::InvalidArgument)` - Empty or oversized value
pub fn decode_int(bytes: &[u8]) -> SocketResult<i32> {
    match bytes.len() {
        1 => Ok(i32::from(bytes[0])),
        2 => Ok(i32::from(i16::from_ne_bytes([bytes[0], bytes[1]]))),
        INT_OPTION_SIZE => Ok(i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        _ => Err(SocketError::InvalidArgument),
    }
}

/// Unpack a boolean option value
pub fn decode_bool(bytes: &[u8]) -> SocketResult<bool> {
    decode_int(bytes).map(|value| value != 0)
}

/// Pack an IPv4 multicast membership request
///
/// # Arguments
///
/// * `group` - Multicast group address, host byte order
/// * `interface` - Local interface address, host byte order (`0` for any)
pub fn encode_membership(group: u32, interface: u32) -> [u8; MEMBERSHIP_SIZE] {
    let mut request = [0u8; MEMBERSHIP_SIZE];
    request[..4].copy_from_slice(&group.to_be_bytes());
    request[4..].copy_from_slice(&interface.to_be_bytes());
    request
}
