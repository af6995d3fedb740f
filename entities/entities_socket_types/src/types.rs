//! Socket Types Module
//!
//! Portable names for socket families, types, protocols, shutdown directions
//! and message flags. The platform backends translate them to native values.

use bitflags::bitflags;
use crate::address::Address;

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressFamily {
    /// Layer 3 agnostic (no filtering when resolving)
    #[default]
    Any,
    /// IPv4
    Ipv4,
    /// IPv6
    Ipv6,
    /// Raw link layer (Linux packet sockets)
    LinkLayer,
}

impl AddressFamily {
    /// Whether an address belongs to this family
    ///
    /// `Any` accepts every address.
    pub fn accepts(self, address: &Address) -> bool {
        match self {
            AddressFamily::Any => true,
            AddressFamily::Ipv4 => matches!(address, Address::V4 { .. }),
            AddressFamily::Ipv6 => matches!(address, Address::V6 { .. }),
            AddressFamily::LinkLayer => matches!(address, Address::LinkLayer { .. }),
        }
    }
}

/// Socket type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketType {
    /// Stream socket (TCP)
    Stream,
    /// Datagram socket (UDP)
    Datagram,
    /// Raw socket
    Raw,
}

/// Protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Let the operating system pick the protocol for the family and type
    #[default]
    Default,
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// EtherType filter for link layer sockets, in host byte order
    EtherType(u16),
}

/// Direction for shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Stop receiving
    Receive,
    /// Stop sending
    Send,
    /// Stop both directions
    Both,
}

bitflags! {
    /// Flags for send and receive calls
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MessageFlags: u32 {
        /// Inspect queued data without removing it
        const PEEK = 1 << 0;
        /// Out-of-band data
        const OUT_OF_BAND = 1 << 1;
        /// Block until the whole buffer is filled
        const WAIT_ALL = 1 << 2;
        /// Keep sending until every byte is written
        const SEND_ALL = 1 << 3;
    }
}

/// Backlog value asking the operating system for its maximum queue length
pub const BACKLOG_MAX: i32 = i32::MAX;

/// Local network interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// Interface name as reported by the operating system
    pub name: String,
    /// One address assigned to the interface
    pub address: Address,
}
