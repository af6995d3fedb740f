//! Integration tests for frameworks_socket_cli
//!
//! Runs the server halves against clients over loopback and checks the
//! printed reports.

use std::thread;

use adapters_socket::{Address, IPV4_LOOPBACK};
use api_facades::{tcp_server, udp_receiver};
use frameworks_socket_cli::commands::{serve_tcp_once, serve_udp_once, SERVER_REPLY};
use frameworks_socket_cli::{run, Command, FamilyArg};

#[test]
fn test_tcp_server_and_client_commands() {
    let listener = tcp_server(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    let port = listener.local_address().unwrap().port().unwrap();

    let server = thread::spawn(move || {
        let mut out = Vec::new();
        serve_tcp_once(listener, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    });

    let command = Command::TcpClient {
        host: "127.0.0.1".to_string(),
        port,
        message: "hello world\n".to_string(),
        timeout_ms: Some(2000),
        family: FamilyArg::Ipv4,
    };
    let mut out = Vec::new();
    run(&command, &mut out).unwrap();

    let expected = format!("received: {}\n", String::from_utf8_lossy(SERVER_REPLY));
    assert_eq!(String::from_utf8(out).unwrap(), expected);
    assert_eq!(server.join().unwrap(), "received: hello world\n\n");
}

#[test]
fn test_udp_server_and_client_commands() {
    let socket = udp_receiver(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    let port = socket.local_address().unwrap().port().unwrap();

    let server = thread::spawn(move || {
        let mut out = Vec::new();
        serve_udp_once(&socket, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    });

    let command = Command::UdpClient {
        host: "127.0.0.1".to_string(),
        port,
        message: "ping".to_string(),
    };
    let mut out = Vec::new();
    run(&command, &mut out).unwrap();

    assert!(String::from_utf8(out).unwrap().starts_with("received: I hear you"));
    assert_eq!(server.join().unwrap(), "received: ping\n");
}

#[test]
fn test_interfaces_command_lists_something() {
    let mut out = Vec::new();
    run(&Command::Interfaces, &mut out).unwrap();
    assert!(!out.is_empty());
}
