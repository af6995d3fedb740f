//! Integration tests for usecases_socket_pool crate
//!
//! These tests poll real loopback sockets.

use std::thread;
use std::time::Duration;

use adapters_socket::*;
use usecases_socket_pool::{Pool, PoolConfig};

fn bound_udp() -> (Socket, Address) {
    let socket = Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
    socket.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    let address = socket.local_address().unwrap();
    (socket, address)
}

#[test]
fn test_single_ready_socket_yields_one_event() {
    let receivers: Vec<_> = (0..5).map(|_| bound_udp()).collect();
    let mut pool = Pool::with_config(PoolConfig { initial_capacity: 2 });
    for (index, (socket, _)) in receivers.iter().enumerate() {
        pool.add(socket, index, true, false, false).unwrap();
    }

    let (sender, _) = bound_udp();
    sender.send_to(b"ping", MessageFlags::empty(), &receivers[3].1).unwrap();

    let mut events = Vec::new();
    let count = pool.poll(&mut events, 8, Some(Duration::from_secs(2))).unwrap();
    assert_eq!(count, 1);
    assert_eq!(events[0].user_data, 3);
    assert_eq!(events[0].socket, receivers[3].0.as_raw());
    assert!(events[0].can_read);

    let mut buffer = [0u8; 8];
    let (received, _) = receivers[3].0.receive_from(&mut buffer, MessageFlags::empty()).unwrap();
    assert_eq!(&buffer[..received], b"ping");

    assert_eq!(pool.poll(&mut events, 8, Some(Duration::ZERO)).unwrap(), 0);
}

#[test]
fn test_unread_data_is_reported_again() {
    let (receiver, address) = bound_udp();
    let mut pool = Pool::new();
    pool.add(&receiver, "receiver", true, false, true).unwrap();

    let (sender, _) = bound_udp();
    sender.send_to(b"data", MessageFlags::empty(), &address).unwrap();

    let mut events = Vec::new();
    for _ in 0..3 {
        assert_eq!(pool.poll(&mut events, 1, Some(Duration::from_secs(2))).unwrap(), 1);
        assert_eq!(events[0].user_data, "receiver");
        assert_eq!(events[0].error, None);
    }
}

#[test]
fn test_poll_wakes_for_accept() {
    let listener = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
    listener.bind(&Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
    listener.listen(BACKLOG_MAX).unwrap();
    let address = listener.local_address().unwrap();

    let mut pool = Pool::new();
    pool.add(&listener, (), true, false, false).unwrap();

    let client = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        let socket = Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
        socket.connect(&address).unwrap();
        socket
    });

    let mut events = Vec::new();
    assert_eq!(pool.poll(&mut events, 1, None).unwrap(), 1);
    let (_child, _) = listener.accept_socket().unwrap();
    client.join().unwrap();
}

/// Datagram socket connected to a port nobody listens on, with the ICMP
/// refusal of its first datagram already queued as a pending error
#[cfg(target_os = "linux")]
fn refused_udp() -> Socket {
    let (closed, address) = bound_udp();
    drop(closed);

    let socket = Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
    socket.connect(&address).unwrap();
    socket.send(b"anyone?", MessageFlags::empty()).unwrap();
    thread::sleep(Duration::from_millis(50));
    socket
}

#[cfg(target_os = "linux")]
#[test]
fn test_unrequested_error_does_not_end_the_wait() {
    let socket = refused_udp();
    let mut pool = Pool::new();
    pool.add(&socket, (), true, false, false).unwrap();

    let mut events = Vec::new();
    let started = std::time::Instant::now();
    assert_eq!(pool.poll(&mut events, 4, Some(Duration::from_millis(1000))).unwrap(), 0);
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert!(events.is_empty());

    pool.remove(&socket).unwrap();
    pool.add(&socket, (), true, false, true).unwrap();
    assert_eq!(pool.poll(&mut events, 4, Some(Duration::from_secs(1))).unwrap(), 1);
    assert_eq!(events[0].error, Some(SocketError::ConnectionRefused));
}

#[cfg(target_os = "linux")]
#[test]
fn test_unrequested_error_does_not_hide_other_sockets() {
    let errored = refused_udp();
    let (receiver, address) = bound_udp();
    let mut pool = Pool::new();
    pool.add(&errored, "errored", true, false, false).unwrap();
    pool.add(&receiver, "receiver", true, false, false).unwrap();

    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        let (socket, _) = bound_udp();
        socket.send_to(b"late", MessageFlags::empty(), &address).unwrap();
    });

    let mut events = Vec::new();
    let started = std::time::Instant::now();
    assert_eq!(pool.poll(&mut events, 4, Some(Duration::from_secs(5))).unwrap(), 1);
    assert_eq!(events[0].user_data, "receiver");
    assert!(started.elapsed() < Duration::from_secs(4));
    sender.join().unwrap();
}
