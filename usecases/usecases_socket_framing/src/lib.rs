//! Use Cases Layer: Stream Framing
//!
//! Message framing on top of a byte stream:
//! - **Line framing**: messages end with a single delimiter byte; nothing past
//!   the delimiter is consumed
//! - **Netstrings**: `<decimal length>:<payload>,`
//!
//! Framing talks to the stream through the [`Transport`] trait, which
//! [`Socket`](adapters_socket::Socket) implements. All failures carry the
//! number of bytes already moved as a [`TransferError`](entities_socket_types::TransferError).
//!
//! ## See Also
//!
//! - [`adapters_socket`](../adapters_socket/index.html): Core socket operations

pub mod line;
pub mod netstring;
pub mod transport;

#[cfg(test)]
mod memory_stream;

pub use line::{receive_line, LineRead};
pub use netstring::{receive_netstring, send_netstring, NETSTRING_HEADER_MAX};
pub use transport::Transport;
