//! Subcommand Implementations
//!
//! Each subcommand writes its report to the given writer so it can be run
//! against a buffer in tests. The server commands are split into a setup
//! step and a `serve_*_once` step that takes a ready socket.

use std::io::{self, Write};
use std::net::{Ipv6Addr, SocketAddrV6};

use thiserror::Error;

use adapters_socket::{
    local_interfaces, resolve_hostname, Address, Direction, LibraryGuard, MessageFlags, Socket, SocketError,
    TransferError, MAX_CANDIDATES,
};
use api_facades::{tcp_client_str, tcp_server_str, udp_receiver_str, udp_sender_str, TcpClientConfig};

use crate::args::Command;

/// Reply the servers send back
pub const SERVER_REPLY: &[u8] = b"I hear you loud and clear\n";

/// Largest message the demos receive
pub const RECEIVE_BUFFER_SIZE: usize = 1024;

/// CLI failure
#[derive(Debug, Error)]
pub enum CliError {
    /// A socket operation failed
    #[error("socket error: {0}")]
    Socket(#[from] SocketError),

    /// A whole-buffer transfer stopped early
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Writing the report failed
    #[error("output error: {0}")]
    Io(#[from] io::Error),
}

/// Run one subcommand
pub fn run(command: &Command, out: &mut dyn Write) -> Result<(), CliError> {
    let _library = LibraryGuard::acquire()?;

    match command {
        Command::TcpServer { host, port } => {
            let listener = tcp_server_str(host, *port)?;
            serve_tcp_once(listener, out)
        }
        Command::TcpClient { host, port, message, family, .. } => {
            let config = TcpClientConfig {
                connect_timeout: command.connect_timeout(),
                family: (*family).into(),
            };
            let socket = tcp_client_str(host, *port, &config)?;
            tcp_exchange(&socket, message.as_bytes(), out)
        }
        Command::UdpServer { host, port } => {
            let socket = udp_receiver_str(host, *port)?;
            serve_udp_once(&socket, out)
        }
        Command::UdpClient { host, port, message } => {
            let socket = udp_sender_str(host, *port)?;
            udp_exchange(&socket, message.as_bytes(), out)
        }
        Command::Resolve { hostname, family } => {
            for address in resolve_hostname(hostname, (*family).into(), MAX_CANDIDATES)? {
                writeln!(out, "{}", display_address(&address))?;
            }
            Ok(())
        }
        Command::Interfaces => {
            for interface in local_interfaces()? {
                writeln!(out, "{}\t{}", interface.name, display_address(&interface.address))?;
            }
            Ok(())
        }
    }
}

/// Accept one client on `listener`, print its message and reply
///
/// The listener is closed as soon as the client is accepted.
pub fn serve_tcp_once(mut listener: Socket, out: &mut dyn Write) -> Result<(), CliError> {
    let (mut child, peer) = listener.accept_socket()?;
    listener.close()?;
    log::info!("accepted {}", display_address(&peer));

    let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
    let received = child.receive(&mut buffer, MessageFlags::empty())?;
    writeln!(out, "received: {}", String::from_utf8_lossy(&buffer[..received]))?;

    child.send_all(SERVER_REPLY, MessageFlags::empty())?;
    child.shutdown(Direction::Both)?;
    child.close()?;
    Ok(())
}

/// Receive one datagram on `socket`, print it and reply to its sender
pub fn serve_udp_once(socket: &Socket, out: &mut dyn Write) -> Result<(), CliError> {
    let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
    let (received, source) = socket.receive_from(&mut buffer, MessageFlags::empty())?;
    writeln!(out, "received: {}", String::from_utf8_lossy(&buffer[..received]))?;

    socket.send_to(SERVER_REPLY, MessageFlags::empty(), &source)?;
    Ok(())
}

fn tcp_exchange(socket: &Socket, message: &[u8], out: &mut dyn Write) -> Result<(), CliError> {
    socket.send_all(message, MessageFlags::empty())?;

    let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
    let received = socket.receive(&mut buffer, MessageFlags::empty())?;
    writeln!(out, "received: {}", String::from_utf8_lossy(&buffer[..received]))?;

    socket.shutdown(Direction::Both)?;
    Ok(())
}

fn udp_exchange(socket: &Socket, message: &[u8], out: &mut dyn Write) -> Result<(), CliError> {
    socket.send(message, MessageFlags::empty())?;

    let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
    let received = socket.receive(&mut buffer, MessageFlags::empty())?;
    writeln!(out, "received: {}", String::from_utf8_lossy(&buffer[..received]))?;
    Ok(())
}

/// Printable form of any address, IPv6 included
pub fn display_address(address: &Address) -> String {
    match *address {
        Address::V6 { address, scope_id, port } => {
            SocketAddrV6::new(Ipv6Addr::from(address), port, 0, scope_id).to_string()
        }
        Address::Unspecified => "unspecified".to_string(),
        _ => address.to_text().unwrap_or_else(|_| format!("{:?}", address)),
    }
}
