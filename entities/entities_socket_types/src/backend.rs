//! Native Backend Contract
//!
//! The capability set every platform backend provides. Exactly one
//! implementation is compiled into a build (`cfg(unix)` or `cfg(windows)`), and
//! the core socket layer calls it through static dispatch.
//!
//! Every method is a direct lift of one native call: arguments are translated
//! to native form, and failures are mapped into [`SocketError`] through the
//! backend's own error table. Handles passed in are never the sentinel; the
//! core layer rejects the sentinel before calling into the backend.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use crate::address::Address;
use crate::options::{Linger, OptionLevel, SocketOption};
use crate::poll::PollRequest;
use crate::status::{SocketError, SocketResult};
use crate::types::{AddressFamily, Direction, Interface, MessageFlags, Protocol, SocketType};

/// Native socket operations of one platform
pub trait SocketBackend {
    /// Native socket handle
    type Raw: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Handle value meaning "no socket"
    const INVALID: Self::Raw;

    /// Start the native socket subsystem
    fn startup() -> SocketResult<()>;

    /// Stop the native socket subsystem
    fn cleanup() -> SocketResult<()>;

    /// Create a socket
    fn create(family: AddressFamily, socket_type: SocketType, protocol: Protocol) -> SocketResult<Self::Raw>;

    /// Bind to a local address
    fn bind(raw: Self::Raw, address: &Address) -> SocketResult<()>;

    /// Connect to a remote address
    fn connect(raw: Self::Raw, address: &Address) -> SocketResult<()>;

    /// Start listening for connections
    fn listen(raw: Self::Raw, backlog: i32) -> SocketResult<()>;

    /// Accept one queued connection
    fn accept(raw: Self::Raw) -> SocketResult<(Self::Raw, Address)>;

    /// Send on a connected socket, returning the bytes written
    fn send(raw: Self::Raw, buffer: &[u8], flags: MessageFlags) -> SocketResult<usize>;

    /// Send to an explicit destination, returning the bytes written
    fn send_to(raw: Self::Raw, buffer: &[u8], flags: MessageFlags, destination: &Address) -> SocketResult<usize>;

    /// Receive on a connected socket, returning the bytes read
    ///
    /// A return of zero is passed through untranslated.
    fn receive(raw: Self::Raw, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<usize>;

    /// Receive and report the sender
    fn receive_from(raw: Self::Raw, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<(usize, Address)>;

    /// Shut down one or both directions
    fn shutdown(raw: Self::Raw, direction: Direction) -> SocketResult<()>;

    /// Release the handle
    fn close(raw: Self::Raw) -> SocketResult<()>;

    /// Set an option from its native byte representation
    fn set_option(raw: Self::Raw, level: OptionLevel, option: SocketOption, value: &[u8]) -> SocketResult<()>;

    /// Read an option into `value`, returning the bytes written
    fn get_option(raw: Self::Raw, level: OptionLevel, option: SocketOption, value: &mut [u8]) -> SocketResult<usize>;

    /// Local address the socket is bound to
    fn local_address(raw: Self::Raw) -> SocketResult<Address>;

    /// Switch between blocking and non-blocking mode
    fn set_nonblocking(raw: Self::Raw, nonblocking: bool) -> SocketResult<()>;

    /// Read and clear the pending socket error
    fn pending_error(raw: Self::Raw) -> SocketResult<Option<SocketError>>;

    /// Wait for readiness on a set of handles
    ///
    /// Fills in `readiness` for every request and returns how many requests
    /// reported at least one condition. `None` waits forever.
    fn poll(requests: &mut [PollRequest<Self::Raw>], timeout: Option<Duration>) -> SocketResult<usize>;

    /// Resolve a hostname into at most `max_results` addresses, in resolver order
    fn resolve(hostname: &str, family: AddressFamily, max_results: usize) -> SocketResult<Vec<Address>>;

    /// List the addresses of the local interfaces
    fn local_interfaces() -> SocketResult<Vec<Interface>>;

    /// Pack a linger setting in the native layout
    fn encode_linger(linger: Linger) -> Vec<u8>;

    /// Unpack a linger setting from the native layout
    fn decode_linger(bytes: &[u8]) -> SocketResult<Linger>;

    /// Pack a send/receive timeout in the native layout (`None` disables it)
    fn encode_timeout(timeout: Option<Duration>) -> Vec<u8>;

    /// Unpack a send/receive timeout from the native layout
    fn decode_timeout(bytes: &[u8]) -> SocketResult<Option<Duration>>;

    /// Largest native value for the linger and timeout layouts, in bytes
    const OPTION_BUFFER_SIZE: usize = 16;
}
