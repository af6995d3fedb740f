//! In-memory stream transport for unit tests

use std::cell::RefCell;
use std::collections::VecDeque;

use entities_socket_types::{MessageFlags, SocketResult};

use crate::transport::Transport;

/// Stream with queued input and captured output
///
/// `chunk` caps how many bytes one plain or peeking read returns, to exercise
/// short reads. A read from an empty stream returns zero, like a closed peer.
pub(crate) struct MemoryStream {
    incoming: RefCell<VecDeque<u8>>,
    outgoing: RefCell<Vec<u8>>,
    chunk: usize,
}

impl MemoryStream {
    pub(crate) fn new(input: &[u8]) -> Self {
        Self::with_chunk(input, usize::MAX)
    }

    pub(crate) fn with_chunk(input: &[u8], chunk: usize) -> Self {
        Self {
            incoming: RefCell::new(input.iter().copied().collect()),
            outgoing: RefCell::new(Vec::new()),
            chunk,
        }
    }

    pub(crate) fn remaining(&self) -> Vec<u8> {
        self.incoming.borrow().iter().copied().collect()
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.outgoing.borrow().clone()
    }
}

impl Transport for MemoryStream {
    fn send(&self, buffer: &[u8], _flags: MessageFlags) -> SocketResult<usize> {
        self.outgoing.borrow_mut().extend_from_slice(buffer);
        Ok(buffer.len())
    }

    fn receive(&self, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<usize> {
        let mut incoming = self.incoming.borrow_mut();
        let limit = if flags.contains(MessageFlags::WAIT_ALL) && !flags.contains(MessageFlags::PEEK) {
            buffer.len()
        } else {
            buffer.len().min(self.chunk)
        };
        let count = limit.min(incoming.len());

        for (slot, byte) in buffer.iter_mut().zip(incoming.iter()).take(count) {
            *slot = *byte;
        }
        if !flags.contains(MessageFlags::PEEK) {
            incoming.drain(..count);
        }
        Ok(count)
    }
}
