//! Integration tests for adapters_socket crate
//!
//! These tests run end-to-end TCP and UDP exchanges over the loopback
//! interface through the public API.

use adapters_socket::*;
use std::thread;
use std::time::Duration;

#[test]
fn test_udp_hello_world_on_port_1212() {
    let _library = LibraryGuard::acquire().unwrap();

    let receiver = Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
    receiver.set_reuse_address(true).unwrap();
    receiver.bind(&Address::ipv4(IPV4_LOOPBACK, 1212)).unwrap();

    let sender = Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
    sender.connect(&Address::ipv4(IPV4_LOOPBACK, 1212)).unwrap();

    let message = b"hello world\n\0";
    assert_eq!(message.len(), 13);
    assert_eq!(sender.send(message, MessageFlags::empty()).unwrap(), 13);

    let mut buffer = [0u8; 64];
    let (received, source) = receiver.receive_from(&mut buffer, MessageFlags::empty()).unwrap();
    assert_eq!(received, 13);
    assert_eq!(&buffer[..received], message);
    assert_eq!(source, sender.local_address().unwrap());
}

#[test]
fn test_tcp_send_all_large_payload() {
    let listener = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
    listener.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    listener.listen(BACKLOG_MAX).unwrap();
    let address = listener.local_address().unwrap();

    let payload: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let client = thread::spawn(move || {
        let socket = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
        socket.connect(&address).unwrap();
        socket.send_all(&payload, MessageFlags::empty()).unwrap();
    });

    let (child, _) = listener.accept_socket().unwrap();
    let mut buffer = vec![0u8; expected.len()];
    child.receive_all(&mut buffer, MessageFlags::empty()).unwrap();
    assert_eq!(buffer, expected);

    client.join().unwrap();
}

#[test]
fn test_shutdown_unblocks_receive() {
    let listener = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
    listener.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    listener.listen(1).unwrap();
    let address = listener.local_address().unwrap();

    let client = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
    client.connect(&address).unwrap();
    let (_child, _) = listener.accept_socket().unwrap();

    let client = std::sync::Arc::new(client);
    let reader = {
        let client = client.clone();
        thread::spawn(move || {
            let mut buffer = [0u8; 8];
            client.receive(&mut buffer, MessageFlags::empty())
        })
    };

    thread::sleep(Duration::from_millis(100));
    client.shutdown(Direction::Receive).unwrap();

    assert_eq!(reader.join().unwrap(), Err(SocketError::NotConnected));
}

#[test]
fn test_peek_does_not_consume() {
    let receiver = Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
    receiver.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    let destination = receiver.local_address().unwrap();

    let sender = Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
    sender.send_to(b"peekaboo", MessageFlags::empty(), &destination).unwrap();

    let mut buffer = [0u8; 16];
    let peeked = receiver.receive(&mut buffer, MessageFlags::PEEK).unwrap();
    assert_eq!(&buffer[..peeked], b"peekaboo");

    let (received, _) = receiver.receive_from(&mut buffer, MessageFlags::empty()).unwrap();
    assert_eq!(&buffer[..received], b"peekaboo");
}

#[test]
fn test_nonblocking_accept_would_block() {
    let listener = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
    listener.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    listener.listen(1).unwrap();
    listener.set_nonblocking(true).unwrap();

    let mut child = Socket::invalid();
    assert_eq!(listener.accept(&mut child), Err(SocketError::WouldBlock));
    assert!(!child.is_valid());
}

#[test]
fn test_local_interfaces_include_loopback() {
    let interfaces = local_interfaces().unwrap();
    assert!(!interfaces.is_empty());
    #[cfg(unix)]
    assert!(interfaces
        .iter()
        .any(|interface| interface.address == Address::ipv4(IPV4_LOOPBACK, 0)));
}
