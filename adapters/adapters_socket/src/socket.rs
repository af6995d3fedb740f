//! Socket Module
//!
//! Provides the owned socket handle and the core socket operations. Every
//! operation rejects the sentinel handle with [`SocketError::InvalidArgument`]
//! before any native call is made.
//!
//! ## Ownership
//!
//! A [`Socket`] is either valid (it owns one native handle) or the sentinel.
//! `close` releases the handle and resets the socket to the sentinel, so a
//! second `close` fails instead of releasing a recycled handle. Dropping a
//! valid socket closes it.

use std::io::{self, Read, Write};

use entities_socket_types::{
    Address, AddressFamily, Direction, MessageFlags, Protocol, SocketBackend, SocketError, SocketResult,
    SocketType, TransferError,
};

use crate::native::{Native, RawSocket, INVALID_SOCKET};
use crate::poll;
use crate::resolve::{resolve_hostname, ConnectConfig};

/// Owned native socket
///
/// `Socket` is `Send` and `Sync`: different threads may use the same socket,
/// for example one blocked in `receive` while another calls `shutdown`.
#[derive(Debug)]
pub struct Socket {
    raw: RawSocket,
    family: AddressFamily,
    socket_type: SocketType,
    protocol: Protocol,
}

impl Default for Socket {
    fn default() -> Self {
        Self::invalid()
    }
}

impl Socket {
    /// The sentinel socket, owning no handle
    pub const fn invalid() -> Self {
        Self {
            raw: INVALID_SOCKET,
            family: AddressFamily::Any,
            socket_type: SocketType::Stream,
            protocol: Protocol::Default,
        }
    }

    /// Create a new socket
    ///
    /// # Arguments
    ///
    /// * `family` - Address family
    /// * `socket_type` - Stream, datagram or raw
    /// * `protocol` - Protocol, `Protocol::Default` lets the system choose
    ///
    /// # Returns
    ///
    /// * `Ok(Socket)` - Created socket
    /// * `Err(SocketError)` - Native failure, e.g. `NotImplemented` for an
    ///   unsupported family or `PermissionDenied` for raw sockets
    pub fn new(family: AddressFamily, socket_type: SocketType, protocol: Protocol) -> SocketResult<Self> {
        let mut socket = Self::invalid();
        socket.create(family, socket_type, protocol)?;
        Ok(socket)
    }

    /// Create a native socket in place
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The socket now owns a new handle
    /// * `Err(SocketError::InvalidArgument)` - The socket already owns a handle
    /// * `Err(SocketError)` - Native failure
    pub fn create(&mut self, family: AddressFamily, socket_type: SocketType, protocol: Protocol) -> SocketResult<()> {
        if self.is_valid() {
            return Err(SocketError::InvalidArgument);
        }
        let raw = Native::create(family, socket_type, protocol)?;
        log::debug!("socket {:?} created ({:?}, {:?}, {:?})", raw, family, socket_type, protocol);
        *self = Self { raw, family, socket_type, protocol };
        Ok(())
    }

    /// Whether the socket owns a native handle
    pub fn is_valid(&self) -> bool {
        self.raw != INVALID_SOCKET
    }

    /// Native handle, the sentinel if the socket is closed
    pub fn as_raw(&self) -> RawSocket {
        self.raw
    }

    /// Address family given at creation
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Socket type given at creation
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Protocol given at creation
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn raw_checked(&self) -> SocketResult<RawSocket> {
        if self.is_valid() {
            Ok(self.raw)
        } else {
            Err(SocketError::InvalidArgument)
        }
    }

    /// Bind to a local address
    pub fn bind(&self, address: &Address) -> SocketResult<()> {
        Native::bind(self.raw_checked()?, address)
    }

    /// Connect to a remote address
    pub fn connect(&self, address: &Address) -> SocketResult<()> {
        let raw = self.raw_checked()?;
        log::debug!("socket {:?} connecting to {:?}", raw, address);
        Native::connect(raw, address)
    }

    /// Connect to a hostname with the default [`ConnectConfig`]
    pub fn connect_str(&mut self, hostname: &str, port: u16) -> SocketResult<()> {
        self.connect_hostname(hostname, port, &ConnectConfig::default()).map(drop)
    }

    /// Connect to the first reachable address of a hostname
    ///
    /// The hostname is resolved to at most `config.max_candidates` addresses,
    /// which are tried in resolver order. Candidates of another family than
    /// the socket's are skipped. A failed attempt leaves a stream socket in an
    /// unspecified state, so the socket is recreated before the next one.
    ///
    /// # Arguments
    ///
    /// * `hostname` - Host name or numeric address
    /// * `port` - Remote port
    /// * `config` - Candidate limit and resolver family
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - The address the socket connected to
    /// * `Err(SocketError::ConnectionRefused)` - Every candidate failed
    /// * `Err(SocketError)` - Resolver failure, reported as is
    pub fn connect_hostname(&mut self, hostname: &str, port: u16, config: &ConnectConfig) -> SocketResult<Address> {
        self.raw_checked()?;
        let family = match config.family {
            AddressFamily::Any => self.family,
            family => family,
        };
        let candidates = resolve_hostname(hostname, family, config.max_candidates)?;

        let (socket_family, socket_type, protocol) = (self.family, self.socket_type, self.protocol);
        for candidate in candidates.iter().filter(|candidate| socket_family.accepts(candidate)) {
            if !self.is_valid() {
                self.create(socket_family, socket_type, protocol)?;
            }
            let target = candidate.with_port(port);
            match self.connect(&target) {
                Ok(()) => return Ok(target),
                Err(error) => {
                    log::debug!("connect to {:?} ({}) failed: {}", target, hostname, error);
                    self.close()?;
                }
            }
        }

        if !self.is_valid() {
            self.create(socket_family, socket_type, protocol)?;
        }
        Err(SocketError::ConnectionRefused)
    }

    /// Start listening for connections
    ///
    /// Use [`BACKLOG_MAX`](entities_socket_types::BACKLOG_MAX) for the
    /// system maximum.
    pub fn listen(&self, backlog: i32) -> SocketResult<()> {
        Native::listen(self.raw_checked()?, backlog)
    }

    /// Accept one queued connection into `child`
    ///
    /// # Arguments
    ///
    /// * `child` - Receives the accepted connection; must be the sentinel
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - Address of the peer
    /// * `Err(SocketError::InvalidArgument)` - `self` is the sentinel or
    ///   `child` already owns a handle
    pub fn accept(&self, child: &mut Socket) -> SocketResult<Address> {
        let raw = self.raw_checked()?;
        if child.is_valid() {
            return Err(SocketError::InvalidArgument);
        }
        let (accepted, peer) = Native::accept(raw)?;
        log::debug!("socket {:?} accepted {:?} from {:?}", raw, accepted, peer);
        *child = Self {
            raw: accepted,
            family: self.family,
            socket_type: self.socket_type,
            protocol: self.protocol,
        };
        Ok(peer)
    }

    /// Accept one queued connection as a new socket
    pub fn accept_socket(&self) -> SocketResult<(Socket, Address)> {
        let mut child = Socket::invalid();
        let peer = self.accept(&mut child)?;
        Ok((child, peer))
    }

    /// Send on a connected socket
    ///
    /// Returns the bytes written, which may be fewer than `buffer.len()`.
    /// With [`MessageFlags::SEND_ALL`] the call loops until everything is
    /// written. A failure on that path loses the count of bytes already
    /// sent; callers that need it use [`send_all`](Self::send_all), whose
    /// [`TransferError`] carries it.
    pub fn send(&self, buffer: &[u8], flags: MessageFlags) -> SocketResult<usize> {
        let raw = self.raw_checked()?;
        if flags.contains(MessageFlags::SEND_ALL) {
            return self.send_all(buffer, flags).map(|()| buffer.len()).map_err(SocketError::from);
        }
        Native::send(raw, buffer, flags)
    }

    /// Send every byte of `buffer`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All bytes written
    /// * `Err(TransferError)` - The failure and the bytes written before it; a
    ///   send that writes nothing is reported as `SocketClosed`
    pub fn send_all(&self, buffer: &[u8], flags: MessageFlags) -> Result<(), TransferError> {
        let raw = self.raw_checked()?;
        let flags = flags.difference(MessageFlags::SEND_ALL);

        let mut sent = 0;
        while sent < buffer.len() {
            match Native::send(raw, &buffer[sent..], flags) {
                Ok(0) => return Err(TransferError::new(SocketError::SocketClosed, sent)),
                Ok(n) => sent += n,
                Err(error) => return Err(TransferError::new(error, sent)),
            }
        }
        Ok(())
    }

    /// Send one datagram to `destination`
    pub fn send_to(&self, buffer: &[u8], flags: MessageFlags, destination: &Address) -> SocketResult<usize> {
        let raw = self.raw_checked()?;
        Native::send_to(raw, buffer, flags.difference(MessageFlags::SEND_ALL), destination)
    }

    /// Receive on a connected socket
    ///
    /// Blocks until at least one byte is available unless the socket is
    /// non-blocking. On a stream socket [`MessageFlags::WAIT_ALL`] (without
    /// `PEEK`) tops short reads up until the buffer is full. Datagram sockets
    /// always return one datagram.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes received; `0` only for an empty buffer or an
    ///   empty datagram
    /// * `Err(SocketError::NotConnected)` - The stream peer closed the
    ///   connection
    pub fn receive(&self, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<usize> {
        let raw = self.raw_checked()?;
        if buffer.is_empty() {
            return Ok(0);
        }
        if self.socket_type == SocketType::Stream
            && flags.contains(MessageFlags::WAIT_ALL)
            && !flags.contains(MessageFlags::PEEK)
        {
            return self.receive_all(buffer, flags).map(|()| buffer.len()).map_err(SocketError::from);
        }

        let received = Native::receive(raw, buffer, flags)?;
        if received == 0 && self.socket_type == SocketType::Stream {
            return Err(SocketError::NotConnected);
        }
        Ok(received)
    }

    /// Fill the whole of `buffer`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Buffer filled
    /// * `Err(TransferError)` - The failure and the bytes received before it;
    ///   a closed peer is reported as `NotConnected`
    pub fn receive_all(&self, buffer: &mut [u8], flags: MessageFlags) -> Result<(), TransferError> {
        let raw = self.raw_checked()?;
        let flags = flags.difference(MessageFlags::PEEK) | MessageFlags::WAIT_ALL;

        let mut filled = 0;
        while filled < buffer.len() {
            match Native::receive(raw, &mut buffer[filled..], flags) {
                Ok(0) => return Err(TransferError::new(SocketError::NotConnected, filled)),
                Ok(n) => filled += n,
                Err(error) => return Err(TransferError::new(error, filled)),
            }
        }
        Ok(())
    }

    /// Receive one datagram and report its sender
    pub fn receive_from(&self, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<(usize, Address)> {
        let raw = self.raw_checked()?;
        let (received, source) = Native::receive_from(raw, buffer, flags)?;
        if received == 0 && self.socket_type == SocketType::Stream && !buffer.is_empty() {
            return Err(SocketError::NotConnected);
        }
        Ok((received, source))
    }

    /// Shut down one or both directions
    ///
    /// Shutting down `Receive` from another thread unblocks a pending receive.
    pub fn shutdown(&self, direction: Direction) -> SocketResult<()> {
        Native::shutdown(self.raw_checked()?, direction)
    }

    /// Release the native handle
    ///
    /// On success the socket becomes the sentinel.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Handle released
    /// * `Err(SocketError::InvalidArgument)` - The socket is already closed
    pub fn close(&mut self) -> SocketResult<()> {
        let raw = self.raw_checked()?;
        Native::close(raw)?;
        log::debug!("socket {:?} closed", raw);
        self.raw = INVALID_SOCKET;
        Ok(())
    }

    /// Local address the socket is bound to
    pub fn local_address(&self) -> SocketResult<Address> {
        Native::local_address(self.raw_checked()?)
    }

    /// Switch between blocking and non-blocking mode
    pub fn set_nonblocking(&self, nonblocking: bool) -> SocketResult<()> {
        Native::set_nonblocking(self.raw_checked()?, nonblocking)
    }

    /// Read and clear the pending error
    pub fn pending_error(&self) -> SocketResult<Option<SocketError>> {
        poll::pending_error(self.raw_checked()?)
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        if self.is_valid() {
            if let Err(error) = Native::close(self.raw) {
                log::warn!("failed to close socket {:?} on drop: {}", self.raw, error);
            }
        }
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.receive(buf, MessageFlags::empty()) {
            Ok(n) => Ok(n),
            // std::io reports end of stream as a zero read.
            Err(SocketError::NotConnected) => Ok(0),
            Err(error) => Err(error.into()),
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.send(buf, MessageFlags::empty()).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
