//! API Facades Layer
//!
//! One-call constructors for the common socket setups: a listening TCP
//! server, a connected TCP client, a bound UDP receiver and a connected UDP
//! sender. Each comes in an address form and a `_str` form that resolves a
//! hostname and tries the candidates in resolver order.
//!
//! All facades call the core operations in `adapters_socket`; none of them
//! touches native APIs.

pub mod common_facades;
pub mod tcp_facades;
pub mod udp_facades;

pub use common_facades::first_candidate;
pub use tcp_facades::{tcp_client, tcp_client_str, tcp_server, tcp_server_str, TcpClientConfig};
pub use udp_facades::{udp_receiver, udp_receiver_str, udp_sender, udp_sender_str};
