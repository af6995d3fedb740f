//! Transport Module
//!
//! The two stream primitives framing needs. Implementations must honor
//! [`MessageFlags::PEEK`] (leave data queued) and [`MessageFlags::WAIT_ALL`]
//! (fill the buffer unless the stream fails or ends), and report the end of
//! the stream as an error or a zero-byte read.

use adapters_socket::Socket;
use entities_socket_types::{MessageFlags, SocketError, SocketResult, TransferError};

/// Byte stream used by the framing operations
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Send bytes, returning how many were written
    fn send(&self, buffer: &[u8], flags: MessageFlags) -> SocketResult<usize>;

    /// Receive bytes, returning how many were read
    fn receive(&self, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<usize>;
}

impl Transport for Socket {
    fn send(&self, buffer: &[u8], flags: MessageFlags) -> SocketResult<usize> {
        Socket::send(self, buffer, flags)
    }

    fn receive(&self, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<usize> {
        Socket::receive(self, buffer, flags)
    }
}

/// Send every byte with the send-all flag
///
/// `offset` is added to the transfer count of an error so callers sending a
/// message in pieces report the total.
pub(crate) fn send_exact<T: Transport + ?Sized>(transport: &T, buffer: &[u8], offset: usize) -> Result<(), TransferError> {
    let mut sent = 0;
    while sent < buffer.len() {
        match transport.send(&buffer[sent..], MessageFlags::SEND_ALL) {
            Ok(0) => return Err(TransferError::new(SocketError::SocketClosed, offset + sent)),
            Ok(n) => sent += n,
            Err(error) => return Err(TransferError::new(error, offset + sent)),
        }
    }
    Ok(())
}

/// Fill `buffer` with wait-all reads
pub(crate) fn receive_exact<T: Transport + ?Sized>(transport: &T, buffer: &mut [u8], offset: usize) -> Result<(), TransferError> {
    let mut filled = 0;
    while filled < buffer.len() {
        match transport.receive(&mut buffer[filled..], MessageFlags::WAIT_ALL) {
            Ok(0) => return Err(TransferError::new(SocketError::NotConnected, offset + filled)),
            Ok(n) => filled += n,
            Err(error) => return Err(TransferError::new(error, offset + filled)),
        }
    }
    Ok(())
}
