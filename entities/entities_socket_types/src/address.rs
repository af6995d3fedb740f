//! Address Module
//!
//! Provides the tagged address value used by every socket operation, together
//! with its text form.
//!
//! ## Text format
//!
//! - IPv4: `a.b.c.d` or `a.b.c.d:port`. Every part may be decimal, `0x` hex or
//!   `0`-prefixed octal, e.g. `0xC0.0250.0.0x01:0x4bc`
//! - MAC: six colon separated hex octets, `XX:XX:XX:XX:XX:XX`, printed in
//!   uppercase
//! - The empty string is the unspecified address
//! - IPv6 text is not supported and reports [`SocketError::NotImplemented`]

use std::fmt::Write as _;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
use std::str::FromStr;

use crate::status::{SocketError, SocketResult};
use crate::types::AddressFamily;

/// IPv4 wildcard address, `0.0.0.0`
pub const IPV4_ANY: u32 = 0x0000_0000;
/// IPv4 loopback address, `127.0.0.1`
pub const IPV4_LOOPBACK: u32 = 0x7f00_0001;
/// IPv4 limited broadcast address, `255.255.255.255`
pub const IPV4_BROADCAST: u32 = 0xffff_ffff;
/// IPv4 "no address" marker
pub const IPV4_NONE: u32 = 0xffff_ffff;

/// Longest text form produced by [`Address::to_text`]
pub const ADDRESS_TEXT_MAX: usize = 40;

/// Compose an IPv4 address from its four dotted parts
///
/// The result is in host byte order, `a` being the most significant byte.
pub const fn ipv4_from_octets(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) << 24 | (b as u32) << 16 | (c as u32) << 8 | d as u32
}

/// Socket endpoint
///
/// Numeric fields are in host byte order; the backends convert to network
/// order at the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Address {
    /// No address
    #[default]
    Unspecified,
    /// IPv4 endpoint
    V4 {
        /// 32-bit address
        address: u32,
        /// Port number
        port: u16,
    },
    /// IPv6 endpoint
    V6 {
        /// 128-bit address
        address: u128,
        /// Scope (interface) id
        scope_id: u32,
        /// Port number
        port: u16,
    },
    /// Link layer endpoint
    LinkLayer {
        /// Hardware address
        mac: [u8; 6],
        /// Interface index
        interface_id: u32,
        /// EtherType
        protocol: u16,
    },
}

impl Address {
    /// Create an IPv4 address
    pub const fn ipv4(address: u32, port: u16) -> Self {
        Address::V4 { address, port }
    }

    /// Create an IPv6 address
    pub const fn ipv6(address: u128, scope_id: u32, port: u16) -> Self {
        Address::V6 { address, scope_id, port }
    }

    /// Create a link layer address
    pub const fn link_layer(mac: [u8; 6], interface_id: u32, protocol: u16) -> Self {
        Address::LinkLayer { mac, interface_id, protocol }
    }

    /// Get the address family
    pub fn family(&self) -> AddressFamily {
        match self {
            Address::Unspecified => AddressFamily::Any,
            Address::V4 { .. } => AddressFamily::Ipv4,
            Address::V6 { .. } => AddressFamily::Ipv6,
            Address::LinkLayer { .. } => AddressFamily::LinkLayer,
        }
    }

    /// Whether this is the unspecified address
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Address::Unspecified)
    }

    /// Get the port, if the family has one
    pub fn port(&self) -> Option<u16> {
        match self {
            Address::V4 { port, .. } | Address::V6 { port, .. } => Some(*port),
            Address::Unspecified | Address::LinkLayer { .. } => None,
        }
    }

    /// Copy of this address with another port
    ///
    /// Families without ports are returned unchanged.
    pub fn with_port(self, new_port: u16) -> Self {
        match self {
            Address::V4 { address, .. } => Address::V4 { address, port: new_port },
            Address::V6 { address, scope_id, .. } => Address::V6 { address, scope_id, port: new_port },
            other => other,
        }
    }

    /// Parse an address from text
    ///
    /// # Arguments
    ///
    /// * `text` - `a.b.c.d`, `a.b.c.d:port`, a MAC address or the empty string
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - Parsed address
    /// * `Err(SocketError::NotImplemented)` - IPv6 text
    /// * `Err(SocketError::InvalidArgument)` - Anything else that does not parse
    pub fn parse(text: &str) -> SocketResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Address::Unspecified);
        }

        if let Some(mac) = parse_mac(text) {
            return Ok(Address::LinkLayer { mac, interface_id: 0, protocol: 0 });
        }

        if text.starts_with('[') || text.matches(':').count() > 1 {
            return Err(SocketError::NotImplemented);
        }

        let (host, port) = match text.split_once(':') {
            Some((host, port)) => (host, parse_number(port, u64::from(u16::MAX))? as u16),
            None => (text, 0),
        };

        let mut address: u32 = 0;
        let mut parts = 0;
        for part in host.split('.') {
            parts += 1;
            if parts > 4 {
                return Err(SocketError::InvalidArgument);
            }
            address = (address << 8) | parse_number(part, 0xff)? as u32;
        }
        if parts != 4 {
            return Err(SocketError::InvalidArgument);
        }

        Ok(Address::V4 { address, port })
    }

    /// Format the address as text
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - `a.b.c.d:port`, `XX:XX:XX:XX:XX:XX` or `""`
    /// * `Err(SocketError::NotImplemented)` - IPv6 addresses
    pub fn to_text(&self) -> SocketResult<String> {
        let mut text = String::with_capacity(ADDRESS_TEXT_MAX);
        match self {
            Address::Unspecified => {}
            Address::V4 { address, port } => {
                let [a, b, c, d] = address.to_be_bytes();
                write!(text, "{}.{}.{}.{}:{}", a, b, c, d, port).map_err(|_| SocketError::Unknown)?;
            }
            Address::V6 { .. } => return Err(SocketError::NotImplemented),
            Address::LinkLayer { mac, .. } => {
                for (i, octet) in mac.iter().enumerate() {
                    if i > 0 {
                        text.push(':');
                    }
                    write!(text, "{:02X}", octet).map_err(|_| SocketError::Unknown)?;
                }
            }
        }
        Ok(text)
    }
}

impl FromStr for Address {
    type Err = SocketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Address::V4 { address: u32::from(*v4.ip()), port: v4.port() },
            SocketAddr::V6(v6) => Address::V6 {
                address: u128::from(*v6.ip()),
                scope_id: v6.scope_id(),
                port: v6.port(),
            },
        }
    }
}

impl TryFrom<Address> for SocketAddr {
    type Error = SocketError;

    fn try_from(address: Address) -> Result<Self, Self::Error> {
        match address {
            Address::V4 { address, port } => Ok(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::from(address), port))),
            Address::V6 { address, scope_id, port } => {
                Ok(SocketAddr::V6(SocketAddrV6::new(Ipv6Addr::from(address), port, 0, scope_id)))
            }
            Address::Unspecified | Address::LinkLayer { .. } => Err(SocketError::InvalidArgument),
        }
    }
}

// Parse one dotted part or a port: decimal, 0x hex or 0-prefixed octal
fn parse_number(text: &str, max: u64) -> SocketResult<u64> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(SocketError::InvalidArgument);
    }

    let value = u64::from_str_radix(digits, radix).map_err(|_| SocketError::InvalidArgument)?;
    if value > max {
        return Err(SocketError::InvalidArgument);
    }
    Ok(value)
}

fn parse_mac(text: &str) -> Option<[u8; 6]> {
    if text.len() != 17 {
        return None;
    }
    let mut mac = [0u8; 6];
    let mut count = 0;
    for (i, part) in text.split(':').enumerate() {
        if i >= 6 || part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        mac[i] = u8::from_str_radix(part, 16).ok()?;
        count += 1;
    }
    (count == 6).then_some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_from_octets() {
        assert_eq!(ipv4_from_octets(127, 0, 0, 1), IPV4_LOOPBACK);
        assert_eq!(ipv4_from_octets(192, 168, 0, 1), 0xc0a8_0001);
    }

    #[test]
    fn test_parse_ipv4_with_port() {
        let addr = Address::parse("127.0.0.1:8080").unwrap();
        assert_eq!(addr, Address::V4 { address: IPV4_LOOPBACK, port: 8080 });
        assert_eq!(addr.to_text().unwrap(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_ipv4_without_port() {
        let addr = Address::parse("192.168.0.1").unwrap();
        assert_eq!(addr, Address::ipv4(0xc0a8_0001, 0));
    }

    #[test]
    fn test_parse_mixed_radix() {
        let addr: Address = "0xC0.0250.0.0x01:0x4bc".parse().unwrap();
        assert_eq!(addr, Address::ipv4(ipv4_from_octets(192, 168, 0, 1), 1212));
    }

    #[test]
    fn test_parse_empty_is_unspecified() {
        assert_eq!(Address::parse("").unwrap(), Address::Unspecified);
        assert_eq!(Address::Unspecified.to_text().unwrap(), "");
    }

    #[test]
    fn test_parse_mac() {
        let addr = Address::parse("0a:1B:2c:3D:4e:5F").unwrap();
        assert_eq!(addr, Address::link_layer([0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f], 0, 0));
        assert_eq!(addr.to_text().unwrap(), "0A:1B:2C:3D:4E:5F");
    }

    #[test]
    fn test_parse_ipv6_not_implemented() {
        assert_eq!(Address::parse("::1"), Err(SocketError::NotImplemented));
        assert_eq!(Address::parse("[::1]:80"), Err(SocketError::NotImplemented));
        assert_eq!(
            Address::ipv6(1, 0, 80).to_text(),
            Err(SocketError::NotImplemented)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["localhost", "1.2.3", "1.2.3.4.5", "256.0.0.1", "1.2.3.4:", "1.2.3.4:70000", "1..3.4", "09.1.1.1"] {
            assert_eq!(Address::parse(text), Err(SocketError::InvalidArgument), "{}", text);
        }
    }

    #[test]
    fn test_equality_per_variant() {
        assert_eq!(Address::Unspecified, Address::default());
        assert_ne!(Address::ipv4(1, 2), Address::ipv4(1, 3));
        assert_ne!(Address::ipv4(0, 0), Address::Unspecified);
    }

    #[test]
    fn test_with_port() {
        assert_eq!(Address::ipv4(1, 0).with_port(9), Address::ipv4(1, 9));
        assert_eq!(Address::Unspecified.with_port(9), Address::Unspecified);
        assert_eq!(Address::ipv6(1, 2, 3).port(), Some(3));
    }

    #[test]
    fn test_std_conversion() {
        let std_addr: SocketAddr = "10.0.0.2:53".parse().unwrap();
        let addr = Address::from(std_addr);
        assert_eq!(addr, Address::ipv4(ipv4_from_octets(10, 0, 0, 2), 53));
        assert_eq!(SocketAddr::try_from(addr).unwrap(), std_addr);
        assert_eq!(SocketAddr::try_from(Address::Unspecified), Err(SocketError::InvalidArgument));

        let v6: SocketAddr = "[::1]:443".parse().unwrap();
        assert_eq!(Address::from(v6), Address::ipv6(1, 0, 443));
    }
}
