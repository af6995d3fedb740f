//! TCP Facades
//!
//! Listening servers and connected clients in one call.

use std::time::Duration;

use adapters_socket::poll::poll;
use adapters_socket::{
    Address, AddressFamily, Interest, PollRequest, Protocol, Socket, SocketError, SocketResult, SocketType,
    BACKLOG_MAX,
};

use crate::common_facades::first_candidate;

/// Configuration for [`tcp_client_str`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpClientConfig {
    /// Limit on each connect attempt; `None` leaves it to the system
    pub connect_timeout: Option<Duration>,
    /// Resolver family, `Any` for all
    pub family: AddressFamily,
}

/// Create a TCP socket listening on `address`
///
/// Address reuse is enabled so a restarted server can bind while old
/// connections linger. The backlog is the system maximum.
pub fn tcp_server(address: &Address) -> SocketResult<Socket> {
    let socket = Socket::new(address.family(), SocketType::Stream, Protocol::Tcp)?;
    socket.set_reuse_address(true)?;
    socket.bind(address)?;
    socket.listen(BACKLOG_MAX)?;
    log::debug!("tcp server listening on {:?}", address);
    Ok(socket)
}

/// Create a TCP server on the first address `hostname` resolves to that can
/// be bound
pub fn tcp_server_str(hostname: &str, port: u16) -> SocketResult<Socket> {
    first_candidate(hostname, port, AddressFamily::Any, tcp_server)
}

/// Create a TCP socket connected to `address`
///
/// # Arguments
///
/// * `address` - Remote endpoint
/// * `timeout` - Limit on the connect; `None` blocks as long as the system
///   does
///
/// # Returns
///
/// * `Ok(Socket)` - Connected, in blocking mode
/// * `Err(SocketError::TimedOut)` - No connection within `timeout`
/// * `Err(SocketError)` - The connect failure, e.g. `ConnectionRefused`
pub fn tcp_client(address: &Address, timeout: Option<Duration>) -> SocketResult<Socket> {
    let socket = Socket::new(address.family(), SocketType::Stream, Protocol::Tcp)?;
    match timeout {
        None => socket.connect(address)?,
        Some(timeout) => connect_within(&socket, address, timeout)?,
    }
    Ok(socket)
}

/// Create a TCP client connected to the first reachable address of
/// `hostname`
///
/// # Returns
///
/// * `Ok(Socket)` - Connected socket
/// * `Err(SocketError)` - Resolver failure, or the failure of the last
///   candidate tried
pub fn tcp_client_str(hostname: &str, port: u16, config: &TcpClientConfig) -> SocketResult<Socket> {
    first_candidate(hostname, port, config.family, |address| {
        tcp_client(address, config.connect_timeout)
    })
}

fn connect_within(socket: &Socket, address: &Address, timeout: Duration) -> SocketResult<()> {
    socket.set_nonblocking(true)?;
    match socket.connect(address) {
        Ok(()) => {}
        Err(SocketError::WouldBlock) => {
            let mut requests = [PollRequest::new(socket.as_raw(), Interest::new(false, true, true))];
            if poll(&mut requests, Some(timeout))? == 0 {
                log::debug!("connect to {:?} timed out after {:?}", address, timeout);
                return Err(SocketError::TimedOut);
            }
            if let Some(error) = socket.pending_error()? {
                return Err(error);
            }
        }
        Err(error) => return Err(error),
    }
    socket.set_nonblocking(false)
}
