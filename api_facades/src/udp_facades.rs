//! UDP Facades
//!
//! Bound receivers and connected senders in one call.

use adapters_socket::{Address, AddressFamily, Protocol, Socket, SocketResult, SocketType};

use crate::common_facades::first_candidate;

/// Create a UDP socket bound to `address`
pub fn udp_receiver(address: &Address) -> SocketResult<Socket> {
    let socket = Socket::new(address.family(), SocketType::Datagram, Protocol::Udp)?;
    socket.bind(address)?;
    log::debug!("udp receiver bound to {:?}", address);
    Ok(socket)
}

/// Create a UDP receiver on the first address `hostname` resolves to that can
/// be bound
pub fn udp_receiver_str(hostname: &str, port: u16) -> SocketResult<Socket> {
    first_candidate(hostname, port, AddressFamily::Any, udp_receiver)
}

/// Create a UDP socket whose default destination is `address`
///
/// The socket can use `send` without a destination and only receives
/// datagrams from `address`.
pub fn udp_sender(address: &Address) -> SocketResult<Socket> {
    let socket = Socket::new(address.family(), SocketType::Datagram, Protocol::Udp)?;
    socket.connect(address)?;
    Ok(socket)
}

/// Create a UDP sender for the first address `hostname` resolves to
pub fn udp_sender_str(hostname: &str, port: u16) -> SocketResult<Socket> {
    first_candidate(hostname, port, AddressFamily::Any, udp_sender)
}
