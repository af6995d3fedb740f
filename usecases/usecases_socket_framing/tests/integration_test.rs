//! Integration tests for usecases_socket_framing crate
//!
//! Line and netstring framing over real TCP connections on loopback.

use adapters_socket::*;
use std::thread;
use std::time::Duration;
use usecases_socket_framing::*;

fn connected_pair() -> (Socket, Socket) {
    let listener = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
    listener.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    listener.listen(1).unwrap();
    let address = listener.local_address().unwrap();

    let client = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
    client.connect(&address).unwrap();
    let (server, _) = listener.accept_socket().unwrap();
    (client, server)
}

#[test]
fn test_netstring_round_trip() {
    let (client, server) = connected_pair();

    let sender = thread::spawn(move || {
        send_netstring(&client, b"hello").unwrap();
        send_netstring(&client, b"world!").unwrap();
        client
    });

    let mut buffer = [0u8; 32];
    assert_eq!(receive_netstring(&server, &mut buffer).unwrap(), 5);
    assert_eq!(&buffer[..5], b"hello");
    assert_eq!(receive_netstring(&server, &mut buffer).unwrap(), 6);
    assert_eq!(&buffer[..6], b"world!");

    sender.join().unwrap();
}

#[test]
fn test_lines_arriving_in_pieces() {
    let (client, server) = connected_pair();

    let sender = thread::spawn(move || {
        for piece in [&b"GET /"[..], b"index\r", b"\nHost: x\n", b"tail"] {
            client.send_all(piece, MessageFlags::empty()).unwrap();
            thread::sleep(Duration::from_millis(20));
        }
        client
    });

    let mut buffer = [0u8; 64];
    let first = receive_line(&server, &mut buffer, b'\n').unwrap();
    assert_eq!(first, LineRead::Line(12));
    assert_eq!(&buffer[..12], b"GET /index\r\n");

    let second = receive_line(&server, &mut buffer, b'\n').unwrap();
    assert_eq!(&buffer[..second.len()], b"Host: x\n");

    let client = sender.join().unwrap();
    drop(client);

    let error = receive_line(&server, &mut buffer, b'\n').unwrap_err();
    assert_eq!(error.error, SocketError::NotConnected);
    assert_eq!(&buffer[..error.transferred], b"tail");
}

#[test]
fn test_line_then_netstring_on_same_stream() {
    let (client, server) = connected_pair();
    client.send_all(b"HELLO\n3:abc,", MessageFlags::empty()).unwrap();

    let mut buffer = [0u8; 16];
    assert_eq!(receive_line(&server, &mut buffer, b'\n').unwrap(), LineRead::Line(6));
    assert_eq!(receive_netstring(&server, &mut buffer).unwrap(), 3);
    assert_eq!(&buffer[..3], b"abc");
}

#[test]
fn test_oversized_netstring_leaves_body_queued() {
    let (client, server) = connected_pair();
    client.send_all(b"8:too long,", MessageFlags::empty()).unwrap();

    let mut small = [0u8; 4];
    let error = receive_netstring(&server, &mut small).unwrap_err();
    assert_eq!(error.error, SocketError::Memory);

    let mut rest = [0u8; 9];
    server.receive_all(&mut rest, MessageFlags::empty()).unwrap();
    assert_eq!(&rest, b"too long,");
}
