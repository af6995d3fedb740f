//! Netstring Module
//!
//! Length-prefixed messages in the form `<decimal length>:<payload>,`, e.g.
//! `5:hello,`. The header is at most [`NETSTRING_HEADER_MAX`] bytes including
//! the colon, which bounds how long a receiver reads before rejecting a
//! malformed stream.

use std::io::{Cursor, Write};

use entities_socket_types::{SocketError, TransferError};

use crate::transport::{receive_exact, send_exact, Transport};

/// Longest accepted header, digits plus `:`
pub const NETSTRING_HEADER_MAX: usize = 21;

const SEPARATOR: u8 = b':';
const TERMINATOR: u8 = b',';

/// Send `payload` as one netstring
///
/// # Returns
///
/// * `Ok(())` - The whole netstring was sent
/// * `Err(TransferError)` - `InvalidArgument` for an empty payload, otherwise
///   the transport failure and the bytes of the netstring sent before it
pub fn send_netstring<T: Transport + ?Sized>(transport: &T, payload: &[u8]) -> Result<(), TransferError> {
    if payload.is_empty() {
        return Err(SocketError::InvalidArgument.into());
    }

    let mut header = Cursor::new([0u8; NETSTRING_HEADER_MAX]);
    write!(header, "{}:", payload.len()).map_err(|_| SocketError::InvalidArgument)?;
    let header_len = header.position() as usize;
    let header = &header.get_ref()[..header_len];

    send_exact(transport, header, 0)?;
    send_exact(transport, payload, header_len)?;
    send_exact(transport, &[TERMINATOR], header_len + payload.len())?;
    log::trace!("sent netstring with {} byte payload", payload.len());
    Ok(())
}

/// Receive one netstring into `buffer`
///
/// The header is read one byte at a time so nothing past the payload and its
/// terminator is consumed.
///
/// # Returns
///
/// * `Ok(usize)` - Payload length; the payload is `buffer[..len]`
/// * `Err(TransferError)` with
///   - `InvalidArgument` - `buffer` is empty
///   - `IllFormedMessage` - a non-digit in the header, a header longer than
///     [`NETSTRING_HEADER_MAX`], a length that overflows, or a missing `,`
///   - `Memory` - the declared length exceeds `buffer.len()`; no payload
///     byte has been read
///   - any transport error, with the payload bytes received before it
pub fn receive_netstring<T: Transport + ?Sized>(transport: &T, buffer: &mut [u8]) -> Result<usize, TransferError> {
    if buffer.is_empty() {
        return Err(SocketError::InvalidArgument.into());
    }

    let length = receive_header(transport)?;
    if length > buffer.len() {
        log::debug!("netstring of {} bytes does not fit in {} byte buffer", length, buffer.len());
        return Err(SocketError::Memory.into());
    }

    receive_exact(transport, &mut buffer[..length], 0)?;

    let mut terminator = [0u8; 1];
    receive_exact(transport, &mut terminator, length)?;
    if terminator[0] != TERMINATOR {
        return Err(TransferError::new(SocketError::IllFormedMessage, length));
    }
    Ok(length)
}

fn receive_header<T: Transport + ?Sized>(transport: &T) -> Result<usize, TransferError> {
    let mut length: usize = 0;
    let mut byte = [0u8; 1];

    for _ in 0..NETSTRING_HEADER_MAX {
        receive_exact(transport, &mut byte, 0)?;
        match byte[0] {
            SEPARATOR => return Ok(length),
            digit @ b'0'..=b'9' => {
                length = length
                    .checked_mul(10)
                    .and_then(|value| value.checked_add(usize::from(digit - b'0')))
                    .ok_or(SocketError::IllFormedMessage)?;
            }
            _ => return Err(SocketError::IllFormedMessage.into()),
        }
    }
    Err(SocketError::IllFormedMessage.into())
}
