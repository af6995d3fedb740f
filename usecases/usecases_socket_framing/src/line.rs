//! Line Framing Module
//!
//! Reads one delimiter-terminated line without consuming anything after the
//! delimiter, so the next read starts exactly at the following line.
//!
//! ## Algorithm
//!
//! 1. Peek into the unfilled part of the buffer
//! 2. Look for the delimiter in the peeked bytes
//! 3. Consume with a wait-all read: through the delimiter if found, otherwise
//!    everything peeked, or a single byte if the peek returned nothing (this
//!    blocks instead of spinning on empty peeks)
//! 4. Repeat until the delimiter is consumed or the buffer is full
//!
//! Timeouts apply to each underlying read, not to the whole call.

use entities_socket_types::{MessageFlags, SocketError, StatusCode, TransferError};

use crate::transport::{receive_exact, Transport};

/// Outcome of a line read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A complete line; the count includes the delimiter
    Line(usize),
    /// The buffer filled up before a delimiter arrived; the count is the
    /// buffer length
    BufferFull(usize),
}

impl LineRead {
    /// Bytes written into the buffer
    pub fn len(&self) -> usize {
        match *self {
            LineRead::Line(n) | LineRead::BufferFull(n) => n,
        }
    }

    /// Whether nothing was written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Success` for a complete line, `Again` for a partial one
    pub fn status(&self) -> StatusCode {
        match self {
            LineRead::Line(_) => StatusCode::Success,
            LineRead::BufferFull(_) => StatusCode::Again,
        }
    }
}

/// Receive bytes up to and including `delimiter`
///
/// # Arguments
///
/// * `transport` - Stream to read from
/// * `buffer` - Destination; its length bounds the line
/// * `delimiter` - Line terminator byte
///
/// # Returns
///
/// * `Ok(LineRead::Line(n))` - `buffer[..n]` ends with the delimiter
/// * `Ok(LineRead::BufferFull(n))` - No delimiter within `buffer.len()` bytes;
///   call again to continue the line
/// * `Err(TransferError)` - Transport failure and the bytes written before it;
///   `InvalidArgument` for an empty buffer
pub fn receive_line<T: Transport + ?Sized>(
    transport: &T,
    buffer: &mut [u8],
    delimiter: u8,
) -> Result<LineRead, TransferError> {
    if buffer.is_empty() {
        return Err(SocketError::InvalidArgument.into());
    }

    let mut filled = 0;
    while filled < buffer.len() {
        let peeked = transport
            .receive(&mut buffer[filled..], MessageFlags::PEEK)
            .map_err(|error| TransferError::new(error, filled))?;
        let peeked = peeked.min(buffer.len() - filled);

        let found = buffer[filled..filled + peeked].iter().position(|&byte| byte == delimiter);
        let consume = match found {
            Some(index) => index + 1,
            None if peeked == 0 => 1,
            None => peeked,
        };
        log::trace!("line read: peeked {} byte(s), consuming {}", peeked, consume);

        receive_exact(transport, &mut buffer[filled..filled + consume], filled)?;
        filled += consume;

        if found.is_some() {
            return Ok(LineRead::Line(filled));
        }
        // A one byte consume after an empty peek may itself be the delimiter.
        if peeked == 0 && buffer[filled - 1] == delimiter {
            return Ok(LineRead::Line(filled));
        }
    }

    Ok(LineRead::BufferFull(filled))
}
