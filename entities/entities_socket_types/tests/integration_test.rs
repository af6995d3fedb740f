//! Integration tests for entities_socket_types crate
//!
//! These tests exercise the public vocabulary the way the upper layers use it.

use entities_socket_types::*;
use std::net::SocketAddr;

#[test]
fn test_address_text_round_trip() {
    for text in ["127.0.0.1:8080", "10.1.2.3:0", "255.255.255.255:65535"] {
        let addr = Address::parse(text).unwrap();
        assert_eq!(addr.to_text().unwrap(), text);
    }
}

#[test]
fn test_address_family_of_parsed_values() {
    assert_eq!(Address::parse("").unwrap().family(), AddressFamily::Any);
    assert_eq!(Address::parse("1.2.3.4").unwrap().family(), AddressFamily::Ipv4);
    assert_eq!(
        Address::parse("AA:BB:CC:DD:EE:FF").unwrap().family(),
        AddressFamily::LinkLayer
    );
}

#[test]
fn test_loopback_constant_matches_std() {
    let std_addr: SocketAddr = "127.0.0.1:1212".parse().unwrap();
    assert_eq!(Address::from(std_addr), Address::ipv4(IPV4_LOOPBACK, 1212));
}

#[test]
fn test_status_codes_match_errors() {
    let errors = [
        SocketError::Unknown,
        SocketError::Memory,
        SocketError::InvalidArgument,
        SocketError::System,
        SocketError::PermissionDenied,
        SocketError::NotImplemented,
        SocketError::AddressLookupFailed,
        SocketError::ConnectionRefused,
        SocketError::NotConnected,
        SocketError::SocketClosed,
        SocketError::WouldBlock,
        SocketError::TimedOut,
        SocketError::NotInitialized,
        SocketError::IllFormedMessage,
    ];

    for error in errors {
        let status = StatusCode::from(error);
        assert!(status.is_error());
        assert_eq!(SocketError::try_from(status), Ok(error));
        assert!(!error.to_string().is_empty());
    }
}

#[test]
fn test_transfer_error_from_socket_error() {
    let err: TransferError = SocketError::TimedOut.into();
    assert_eq!(err.transferred, 0);
    assert_eq!(err.error, SocketError::TimedOut);
}
