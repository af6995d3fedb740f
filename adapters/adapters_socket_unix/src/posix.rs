//! POSIX Backend Module
//!
//! [`PosixSockets`] lifts each BSD socket call one to one. Handles are plain
//! file descriptors and `-1` is the sentinel.
//!
//! Calls go through `socket2::SockRef` borrowed over the descriptor, and
//! polling through `nix::poll`. Raw libc calls remain only where neither
//! crate reaches: untyped socket options, `getaddrinfo` and `sockaddr_ll`.
//!
//! ## Platform notes
//!
//! - Sockets are created close-on-exec
//! - Sends never raise `SIGPIPE`: `MSG_NOSIGNAL` on Linux and Android,
//!   `SO_NOSIGPIPE` on Apple targets
//! - Packet sockets and `SO_PRIORITY` exist only on Linux and Android; other
//!   targets report [`SocketError::NotImplemented`]

use std::ffi::CString;
use std::io;
use std::mem::{self, MaybeUninit};
use std::net::{Ipv4Addr, Shutdown};
use std::os::unix::io::{BorrowedFd, IntoRawFd, RawFd};
use std::ptr;
use std::time::Duration;

use entities_socket_types::options::{decode_bool, decode_int, encode_bool, encode_int, MEMBERSHIP_SIZE};
use entities_socket_types::{
    timeout_to_millis, Address, AddressFamily, Direction, Interest, Interface, Linger, MessageFlags,
    OptionLevel, PollRequest, Protocol, Readiness, SocketBackend, SocketError, SocketOption, SocketResult,
    SocketType,
};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags};
use socket2::{Domain, SockRef, Socket, Type};

use crate::errno::{last_error, map_errno, map_io_error, map_resolver_error};
use crate::sockaddr::{decode_raw, from_native, from_storage, to_native};

#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: libc::c_int = 0;

const SECONDS_SIZE: usize = mem::size_of::<libc::time_t>();
const MICROS_SIZE: usize = mem::size_of::<libc::suseconds_t>();

/// BSD socket backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PosixSockets;

/// Run `op` on a socket borrowed over `raw`, translating its OS error
fn with_socket<T>(raw: RawFd, op: impl FnOnce(&SockRef<'_>) -> io::Result<T>) -> SocketResult<T> {
    try_with_socket(raw, |socket| op(socket).map_err(map_io_error))
}

fn try_with_socket<T>(raw: RawFd, op: impl FnOnce(&SockRef<'_>) -> SocketResult<T>) -> SocketResult<T> {
    if raw < 0 {
        return Err(SocketError::InvalidArgument);
    }
    // SAFETY: the core layer only passes descriptors it owns and keeps them
    // open for the duration of the call.
    let fd = unsafe { BorrowedFd::borrow_raw(raw) };
    op(&SockRef::from(&fd))
}

/// View an initialised buffer as receive storage
fn as_uninit(buffer: &mut [u8]) -> &mut [MaybeUninit<u8>] {
    // SAFETY: MaybeUninit<u8> has the layout of u8, and a receive only ever
    // writes initialised bytes into it.
    unsafe { &mut *(buffer as *mut [u8] as *mut [MaybeUninit<u8>]) }
}

fn native_family(family: AddressFamily) -> SocketResult<Domain> {
    match family {
        AddressFamily::Any => Ok(Domain::from(libc::AF_UNSPEC)),
        AddressFamily::Ipv4 => Ok(Domain::IPV4),
        AddressFamily::Ipv6 => Ok(Domain::IPV6),
        #[cfg(any(target_os = "linux", target_os = "android"))]
        AddressFamily::LinkLayer => Ok(Domain::PACKET),
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        AddressFamily::LinkLayer => Err(SocketError::NotImplemented),
    }
}

fn native_type(socket_type: SocketType) -> Type {
    match socket_type {
        SocketType::Stream => Type::STREAM,
        SocketType::Datagram => Type::DGRAM,
        SocketType::Raw => Type::RAW,
    }
}

fn native_protocol(protocol: Protocol) -> Option<socket2::Protocol> {
    match protocol {
        Protocol::Default => None,
        Protocol::Tcp => Some(socket2::Protocol::TCP),
        Protocol::Udp => Some(socket2::Protocol::UDP),
        Protocol::EtherType(ether_type) => Some(socket2::Protocol::from(libc::c_int::from(ether_type.to_be()))),
    }
}

fn native_flags(flags: MessageFlags) -> libc::c_int {
    let mut native = 0;
    if flags.contains(MessageFlags::PEEK) {
        native |= libc::MSG_PEEK;
    }
    if flags.contains(MessageFlags::OUT_OF_BAND) {
        native |= libc::MSG_OOB;
    }
    if flags.contains(MessageFlags::WAIT_ALL) {
        native |= libc::MSG_WAITALL;
    }
    native
}

fn native_direction(direction: Direction) -> Shutdown {
    match direction {
        Direction::Receive => Shutdown::Read,
        Direction::Send => Shutdown::Write,
        Direction::Both => Shutdown::Both,
    }
}

fn native_level(level: OptionLevel) -> libc::c_int {
    match level {
        OptionLevel::Socket => libc::SOL_SOCKET,
        OptionLevel::Ip => libc::IPPROTO_IP,
        OptionLevel::Ipv6 => libc::IPPROTO_IPV6,
        OptionLevel::Tcp => libc::IPPROTO_TCP,
        OptionLevel::Native(level) => level,
    }
}

fn native_option(option: SocketOption) -> SocketResult<libc::c_int> {
    let name = match option {
        SocketOption::Broadcast => libc::SO_BROADCAST,
        SocketOption::KeepAlive => libc::SO_KEEPALIVE,
        SocketOption::Linger => libc::SO_LINGER,
        SocketOption::ReuseAddress => libc::SO_REUSEADDR,
        SocketOption::ReceiveBuffer => libc::SO_RCVBUF,
        SocketOption::SendBuffer => libc::SO_SNDBUF,
        SocketOption::ReceiveTimeout => libc::SO_RCVTIMEO,
        SocketOption::SendTimeout => libc::SO_SNDTIMEO,
        SocketOption::OutOfBandInline => libc::SO_OOBINLINE,
        #[cfg(any(target_os = "linux", target_os = "android"))]
        SocketOption::Priority => libc::SO_PRIORITY,
        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        SocketOption::Priority => return Err(SocketError::NotImplemented),
        SocketOption::NoDelay => libc::TCP_NODELAY,
        SocketOption::MembershipAdd => libc::IP_ADD_MEMBERSHIP,
        SocketOption::MembershipDrop => libc::IP_DROP_MEMBERSHIP,
        SocketOption::MulticastLoop => libc::IP_MULTICAST_LOOP,
        SocketOption::Error => libc::SO_ERROR,
        SocketOption::Native(name) => name,
    };
    Ok(name)
}

fn decode_size(value: &[u8]) -> SocketResult<usize> {
    usize::try_from(decode_int(value)?).map_err(|_| SocketError::InvalidArgument)
}

fn size_bytes(size: usize) -> Vec<u8> {
    encode_int(i32::try_from(size).unwrap_or(i32::MAX)).to_vec()
}

fn flag_bytes(flag: bool) -> Vec<u8> {
    encode_bool(flag).to_vec()
}

/// Split a membership request into group and interface
fn decode_membership(value: &[u8]) -> SocketResult<(Ipv4Addr, Ipv4Addr)> {
    if value.len() != MEMBERSHIP_SIZE {
        return Err(SocketError::InvalidArgument);
    }
    let group = Ipv4Addr::new(value[0], value[1], value[2], value[3]);
    let interface = Ipv4Addr::new(value[4], value[5], value[6], value[7]);
    Ok((group, interface))
}

fn linger_duration(linger: Linger) -> Option<Duration> {
    linger.enabled.then(|| Duration::from_secs(u64::from(linger.seconds)))
}

fn linger_setting(duration: Option<Duration>) -> Linger {
    Linger {
        enabled: duration.is_some(),
        seconds: duration.map_or(0, |duration| u16::try_from(duration.as_secs()).unwrap_or(u16::MAX)),
    }
}

fn set_raw_option(raw: RawFd, level: OptionLevel, option: SocketOption, value: &[u8]) -> SocketResult<()> {
    let name = native_option(option)?;
    let len = libc::socklen_t::try_from(value.len()).map_err(|_| SocketError::InvalidArgument)?;
    // SAFETY: value is valid for reads of len bytes.
    if unsafe { libc::setsockopt(raw, native_level(level), name, value.as_ptr().cast(), len) } < 0 {
        return Err(last_error());
    }
    Ok(())
}

fn get_raw_option(raw: RawFd, level: OptionLevel, option: SocketOption, value: &mut [u8]) -> SocketResult<usize> {
    let name = native_option(option)?;
    let mut len = libc::socklen_t::try_from(value.len()).map_err(|_| SocketError::InvalidArgument)?;
    // SAFETY: value is valid for writes of len bytes and the kernel never
    // writes more than len.
    if unsafe { libc::getsockopt(raw, native_level(level), name, value.as_mut_ptr().cast(), &mut len) } < 0 {
        return Err(last_error());
    }
    Ok((len as usize).min(value.len()))
}

fn poll_flags(interest: Interest) -> PollFlags {
    let mut flags = PollFlags::empty();
    if interest.read {
        flags |= PollFlags::POLLIN;
    }
    if interest.write {
        flags |= PollFlags::POLLOUT;
    }
    flags
}

fn to_timeval(timeout: Option<Duration>) -> libc::timeval {
    let duration = timeout.unwrap_or(Duration::ZERO);
    let mut tv = libc::timeval {
        tv_sec: duration.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_usec: duration.subsec_micros() as libc::suseconds_t,
    };
    // A sub-microsecond timeout must not collapse into "no timeout".
    if timeout.is_some() && tv.tv_sec == 0 && tv.tv_usec == 0 && !duration.is_zero() {
        tv.tv_usec = 1;
    }
    tv
}

impl SocketBackend for PosixSockets {
    type Raw = RawFd;

    const INVALID: RawFd = -1;

    const OPTION_BUFFER_SIZE: usize = mem::size_of::<libc::timeval>();

    fn startup() -> SocketResult<()> {
        Ok(())
    }

    fn cleanup() -> SocketResult<()> {
        Ok(())
    }

    fn create(family: AddressFamily, socket_type: SocketType, protocol: Protocol) -> SocketResult<RawFd> {
        let domain = native_family(family)?;
        let socket =
            Socket::new(domain, native_type(socket_type), native_protocol(protocol)).map_err(map_io_error)?;
        let fd = socket.into_raw_fd();
        log::trace!("created fd {} ({:?}, {:?}, {:?})", fd, family, socket_type, protocol);
        Ok(fd)
    }

    fn bind(raw: RawFd, address: &Address) -> SocketResult<()> {
        let addr = to_native(address)?;
        with_socket(raw, |socket| socket.bind(&addr))
    }

    fn connect(raw: RawFd, address: &Address) -> SocketResult<()> {
        let addr = to_native(address)?;
        with_socket(raw, |socket| socket.connect(&addr))
    }

    fn listen(raw: RawFd, backlog: i32) -> SocketResult<()> {
        with_socket(raw, |socket| socket.listen(backlog))
    }

    fn accept(raw: RawFd) -> SocketResult<(RawFd, Address)> {
        let (accepted, addr) = with_socket(raw, |socket| socket.accept())?;
        Ok((accepted.into_raw_fd(), from_native(&addr)))
    }

    fn send(raw: RawFd, buffer: &[u8], flags: MessageFlags) -> SocketResult<usize> {
        let flags = native_flags(flags) | SEND_FLAGS;
        with_socket(raw, |socket| socket.send_with_flags(buffer, flags))
    }

    fn send_to(raw: RawFd, buffer: &[u8], flags: MessageFlags, destination: &Address) -> SocketResult<usize> {
        let addr = to_native(destination)?;
        let flags = native_flags(flags) | SEND_FLAGS;
        with_socket(raw, |socket| socket.send_to_with_flags(buffer, &addr, flags))
    }

    fn receive(raw: RawFd, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<usize> {
        with_socket(raw, |socket| socket.recv_with_flags(as_uninit(buffer), native_flags(flags)))
    }

    fn receive_from(raw: RawFd, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<(usize, Address)> {
        let (received, addr) =
            with_socket(raw, |socket| socket.recv_from_with_flags(as_uninit(buffer), native_flags(flags)))?;
        Ok((received, from_native(&addr)))
    }

    fn shutdown(raw: RawFd, direction: Direction) -> SocketResult<()> {
        with_socket(raw, |socket| socket.shutdown(native_direction(direction)))
    }

    fn close(raw: RawFd) -> SocketResult<()> {
        match nix::unistd::close(raw) {
            // The descriptor is released even when close is interrupted.
            Ok(()) | Err(Errno::EINTR) => Ok(()),
            Err(errno) => Err(map_errno(errno)),
        }
    }

    fn set_option(raw: RawFd, level: OptionLevel, option: SocketOption, value: &[u8]) -> SocketResult<()> {
        try_with_socket(raw, |socket| {
            let applied = match (level, option) {
                (OptionLevel::Socket, SocketOption::Broadcast) => socket.set_broadcast(decode_bool(value)?),
                (OptionLevel::Socket, SocketOption::KeepAlive) => socket.set_keepalive(decode_bool(value)?),
                (OptionLevel::Socket, SocketOption::ReuseAddress) => socket.set_reuse_address(decode_bool(value)?),
                (OptionLevel::Socket, SocketOption::OutOfBandInline) => {
                    socket.set_out_of_band_inline(decode_bool(value)?)
                }
                (OptionLevel::Socket, SocketOption::ReceiveBuffer) => socket.set_recv_buffer_size(decode_size(value)?),
                (OptionLevel::Socket, SocketOption::SendBuffer) => socket.set_send_buffer_size(decode_size(value)?),
                (OptionLevel::Socket, SocketOption::Linger) => {
                    let linger = Self::decode_linger(value)?;
                    if !linger.enabled && linger.seconds != 0 {
                        // socket2 cannot keep a time on a disabled linger.
                        return set_raw_option(raw, level, option, value);
                    }
                    socket.set_linger(linger_duration(linger))
                }
                (OptionLevel::Socket, SocketOption::ReceiveTimeout) => {
                    socket.set_read_timeout(Self::decode_timeout(value)?)
                }
                (OptionLevel::Socket, SocketOption::SendTimeout) => {
                    socket.set_write_timeout(Self::decode_timeout(value)?)
                }
                (OptionLevel::Tcp, SocketOption::NoDelay) => socket.set_nodelay(decode_bool(value)?),
                (OptionLevel::Ip, SocketOption::MulticastLoop) => socket.set_multicast_loop_v4(decode_bool(value)?),
                (OptionLevel::Ip, SocketOption::MembershipAdd) => {
                    let (group, interface) = decode_membership(value)?;
                    socket.join_multicast_v4(&group, &interface)
                }
                (OptionLevel::Ip, SocketOption::MembershipDrop) => {
                    let (group, interface) = decode_membership(value)?;
                    socket.leave_multicast_v4(&group, &interface)
                }
                _ => return set_raw_option(raw, level, option, value),
            };
            applied.map_err(map_io_error)
        })
    }

    fn get_option(raw: RawFd, level: OptionLevel, option: SocketOption, value: &mut [u8]) -> SocketResult<usize> {
        let bytes = try_with_socket(raw, |socket| {
            let bytes = match (level, option) {
                (OptionLevel::Socket, SocketOption::Broadcast) => socket.broadcast().map(flag_bytes),
                (OptionLevel::Socket, SocketOption::KeepAlive) => socket.keepalive().map(flag_bytes),
                (OptionLevel::Socket, SocketOption::ReuseAddress) => socket.reuse_address().map(flag_bytes),
                (OptionLevel::Socket, SocketOption::OutOfBandInline) => socket.out_of_band_inline().map(flag_bytes),
                (OptionLevel::Socket, SocketOption::ReceiveBuffer) => socket.recv_buffer_size().map(size_bytes),
                (OptionLevel::Socket, SocketOption::SendBuffer) => socket.send_buffer_size().map(size_bytes),
                (OptionLevel::Socket, SocketOption::Linger) => {
                    socket.linger().map(|linger| Self::encode_linger(linger_setting(linger)))
                }
                (OptionLevel::Socket, SocketOption::ReceiveTimeout) => socket.read_timeout().map(Self::encode_timeout),
                (OptionLevel::Socket, SocketOption::SendTimeout) => socket.write_timeout().map(Self::encode_timeout),
                (OptionLevel::Socket, SocketOption::Error) => socket.take_error().map(|error| {
                    let code = error.and_then(|error| error.raw_os_error()).unwrap_or(0);
                    encode_int(code).to_vec()
                }),
                (OptionLevel::Tcp, SocketOption::NoDelay) => socket.nodelay().map(flag_bytes),
                (OptionLevel::Ip, SocketOption::MulticastLoop) => socket.multicast_loop_v4().map(flag_bytes),
                _ => return Ok(None),
            };
            bytes.map(Some).map_err(map_io_error)
        })?;

        let Some(bytes) = bytes else {
            return get_raw_option(raw, level, option, value);
        };
        if value.len() < bytes.len() {
            return Err(SocketError::InvalidArgument);
        }
        value[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    fn local_address(raw: RawFd) -> SocketResult<Address> {
        let addr = with_socket(raw, |socket| socket.local_addr())?;
        Ok(from_native(&addr))
    }

    fn set_nonblocking(raw: RawFd, nonblocking: bool) -> SocketResult<()> {
        with_socket(raw, |socket| socket.set_nonblocking(nonblocking))
    }

    fn pending_error(raw: RawFd) -> SocketResult<Option<SocketError>> {
        let pending = with_socket(raw, |socket| socket.take_error())?;
        Ok(pending.map(map_io_error))
    }

    fn poll(requests: &mut [PollRequest<RawFd>], timeout: Option<Duration>) -> SocketResult<usize> {
        if requests.iter().any(|request| request.raw < 0) {
            return Err(SocketError::InvalidArgument);
        }
        // SAFETY: the caller keeps every polled descriptor open for the call.
        let fds: Vec<BorrowedFd<'_>> =
            requests.iter().map(|request| unsafe { BorrowedFd::borrow_raw(request.raw) }).collect();
        let mut poll_fds: Vec<PollFd<'_>> = requests
            .iter()
            .zip(&fds)
            .map(|(request, fd)| PollFd::new(fd, poll_flags(request.interest)))
            .collect();

        match nix::poll::poll(&mut poll_fds, timeout_to_millis(timeout)) {
            Ok(_) => {}
            Err(Errno::EINTR) => {
                log::trace!("poll interrupted by a signal");
                for request in requests.iter_mut() {
                    request.readiness = Readiness::default();
                }
                return Ok(0);
            }
            Err(errno) => return Err(map_errno(errno)),
        }

        let mut ready = 0;
        for (request, fd) in requests.iter_mut().zip(&poll_fds) {
            let revents = fd.revents().unwrap_or(PollFlags::empty());
            request.readiness = Readiness {
                readable: revents.intersects(PollFlags::POLLIN | PollFlags::POLLPRI),
                writable: revents.contains(PollFlags::POLLOUT),
                errored: revents.contains(PollFlags::POLLERR),
                hung_up: revents.contains(PollFlags::POLLHUP),
                invalid: revents.contains(PollFlags::POLLNVAL),
            };
            if request.readiness.any() {
                ready += 1;
            }
        }
        Ok(ready)
    }

    fn resolve(hostname: &str, family: AddressFamily, max_results: usize) -> SocketResult<Vec<Address>> {
        let host = CString::new(hostname).map_err(|_| SocketError::InvalidArgument)?;

        // SAFETY: an all-zero addrinfo is a valid "no hints" value.
        let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
        hints.ai_family = match family {
            AddressFamily::Any => libc::AF_UNSPEC,
            AddressFamily::Ipv4 => libc::AF_INET,
            AddressFamily::Ipv6 => libc::AF_INET6,
            AddressFamily::LinkLayer => return Err(SocketError::NotImplemented),
        };
        // One entry per address instead of one per socket type.
        hints.ai_socktype = libc::SOCK_STREAM;

        let mut list: *mut libc::addrinfo = ptr::null_mut();
        // SAFETY: host is NUL terminated, hints and list are valid for the call.
        let code = unsafe { libc::getaddrinfo(host.as_ptr(), ptr::null(), &hints, &mut list) };
        if code != 0 {
            log::debug!("getaddrinfo({}) failed with code {}", hostname, code);
            return Err(map_resolver_error(code));
        }

        let mut addresses = Vec::new();
        let mut cursor = list;
        while !cursor.is_null() && addresses.len() < max_results {
            // SAFETY: cursor walks the list getaddrinfo returned.
            let info = unsafe { &*cursor };
            let address = unsafe { decode_raw(info.ai_addr, info.ai_addrlen as usize) };
            if !address.is_unspecified() {
                addresses.push(address);
            }
            cursor = info.ai_next;
        }
        // SAFETY: list came from a successful getaddrinfo and is freed once.
        unsafe { libc::freeaddrinfo(list) };

        if addresses.is_empty() && max_results > 0 {
            return Err(SocketError::AddressLookupFailed);
        }
        Ok(addresses)
    }

    fn local_interfaces() -> SocketResult<Vec<Interface>> {
        let entries = nix::ifaddrs::getifaddrs().map_err(map_errno)?;

        let mut interfaces = Vec::new();
        for entry in entries {
            let Some(storage) = entry.address else {
                continue;
            };
            let address = from_storage(&storage);
            if address.is_unspecified() {
                continue;
            }
            interfaces.push(Interface { name: entry.interface_name, address });
        }
        Ok(interfaces)
    }

    fn encode_linger(linger: Linger) -> Vec<u8> {
        let native = libc::linger {
            l_onoff: libc::c_int::from(linger.enabled),
            l_linger: libc::c_int::from(linger.seconds),
        };
        let mut bytes = Vec::with_capacity(mem::size_of::<libc::linger>());
        bytes.extend_from_slice(&native.l_onoff.to_ne_bytes());
        bytes.extend_from_slice(&native.l_linger.to_ne_bytes());
        bytes
    }

    fn decode_linger(bytes: &[u8]) -> SocketResult<Linger> {
        if bytes.len() != mem::size_of::<libc::linger>() {
            return Err(SocketError::InvalidArgument);
        }
        let onoff = libc::c_int::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let seconds = libc::c_int::from_ne_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(Linger {
            enabled: onoff != 0,
            seconds: u16::try_from(seconds.max(0)).unwrap_or(u16::MAX),
        })
    }

    fn encode_timeout(timeout: Option<Duration>) -> Vec<u8> {
        let tv = to_timeval(timeout);
        let mut bytes = vec![0u8; mem::size_of::<libc::timeval>()];
        bytes[..SECONDS_SIZE].copy_from_slice(&tv.tv_sec.to_ne_bytes());
        bytes[SECONDS_SIZE..SECONDS_SIZE + MICROS_SIZE].copy_from_slice(&tv.tv_usec.to_ne_bytes());
        bytes
    }

    fn decode_timeout(bytes: &[u8]) -> SocketResult<Option<Duration>> {
        if bytes.len() != mem::size_of::<libc::timeval>() {
            return Err(SocketError::InvalidArgument);
        }
        let mut seconds = [0u8; SECONDS_SIZE];
        seconds.copy_from_slice(&bytes[..SECONDS_SIZE]);
        let mut micros = [0u8; MICROS_SIZE];
        micros.copy_from_slice(&bytes[SECONDS_SIZE..SECONDS_SIZE + MICROS_SIZE]);
        let tv_sec = libc::time_t::from_ne_bytes(seconds);
        let tv_usec = libc::suseconds_t::from_ne_bytes(micros);

        if tv_sec <= 0 && tv_usec <= 0 {
            return Ok(None);
        }
        let duration = Duration::from_secs(tv_sec.max(0) as u64) + Duration::from_micros(tv_usec.max(0) as u64);
        Ok(Some(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_socket_types::{Interest, IPV4_LOOPBACK};

    fn udp_loopback() -> (RawFd, Address) {
        let fd = PosixSockets::create(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap();
        PosixSockets::bind(fd, &Address::ipv4(IPV4_LOOPBACK, 0)).unwrap();
        let local = PosixSockets::local_address(fd).unwrap();
        (fd, local)
    }

    #[test]
    fn test_create_and_close() {
        let fd = PosixSockets::create(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
        assert!(fd >= 0);
        PosixSockets::close(fd).unwrap();
    }

    #[test]
    fn test_create_without_family_fails() {
        let result = PosixSockets::create(AddressFamily::Any, SocketType::Stream, Protocol::Default);
        assert!(result.is_err());
    }

    #[test]
    fn test_bound_port_is_reported() {
        let (fd, local) = udp_loopback();
        match local {
            Address::V4 { address, port } => {
                assert_eq!(address, IPV4_LOOPBACK);
                assert_ne!(port, 0);
            }
            other => panic!("unexpected address {:?}", other),
        }
        PosixSockets::close(fd).unwrap();
    }

    #[test]
    fn test_datagram_round_trip() {
        let (receiver, destination) = udp_loopback();
        let (sender, source) = udp_loopback();

        let sent = PosixSockets::send_to(sender, b"ping", MessageFlags::empty(), &destination).unwrap();
        assert_eq!(sent, 4);

        let mut buffer = [0u8; 16];
        let (received, from) = PosixSockets::receive_from(receiver, &mut buffer, MessageFlags::empty()).unwrap();
        assert_eq!(&buffer[..received], b"ping");
        assert_eq!(from, source);

        PosixSockets::close(sender).unwrap();
        PosixSockets::close(receiver).unwrap();
    }

    #[test]
    fn test_nonblocking_receive_would_block() {
        let (fd, _) = udp_loopback();
        PosixSockets::set_nonblocking(fd, true).unwrap();

        let mut buffer = [0u8; 4];
        let result = PosixSockets::receive(fd, &mut buffer, MessageFlags::empty());
        assert_eq!(result, Err(SocketError::WouldBlock));

        PosixSockets::close(fd).unwrap();
    }

    #[test]
    fn test_poll_reports_readable_datagram() {
        let (receiver, destination) = udp_loopback();
        let (sender, _) = udp_loopback();

        let mut requests = [PollRequest::new(receiver, Interest::new(true, false, true))];
        assert_eq!(PosixSockets::poll(&mut requests, Some(Duration::from_millis(10))).unwrap(), 0);

        PosixSockets::send_to(sender, b"x", MessageFlags::empty(), &destination).unwrap();
        assert_eq!(PosixSockets::poll(&mut requests, Some(Duration::from_secs(2))).unwrap(), 1);
        assert!(requests[0].readiness.readable);

        PosixSockets::close(sender).unwrap();
        PosixSockets::close(receiver).unwrap();
    }

    #[test]
    fn test_linger_layout_round_trip() {
        let linger = Linger { enabled: true, seconds: 7 };
        let bytes = PosixSockets::encode_linger(linger);
        assert_eq!(PosixSockets::decode_linger(&bytes).unwrap(), linger);
    }

    #[test]
    fn test_timeout_layout() {
        let bytes = PosixSockets::encode_timeout(Some(Duration::from_millis(1500)));
        assert_eq!(PosixSockets::decode_timeout(&bytes).unwrap(), Some(Duration::from_millis(1500)));

        let disabled = PosixSockets::encode_timeout(None);
        assert_eq!(PosixSockets::decode_timeout(&disabled).unwrap(), None);
    }

    #[test]
    fn test_fresh_socket_has_no_pending_error() {
        let (fd, _) = udp_loopback();
        assert_eq!(PosixSockets::pending_error(fd).unwrap(), None);
        PosixSockets::close(fd).unwrap();
    }

    #[test]
    fn test_options_round_trip_through_socket2() {
        let (fd, _) = udp_loopback();

        PosixSockets::set_option(fd, OptionLevel::Socket, SocketOption::Broadcast, &encode_bool(true)).unwrap();
        let mut value = [0u8; 4];
        let len = PosixSockets::get_option(fd, OptionLevel::Socket, SocketOption::Broadcast, &mut value).unwrap();
        assert!(decode_bool(&value[..len]).unwrap());

        let timeout = PosixSockets::encode_timeout(Some(Duration::from_millis(250)));
        PosixSockets::set_option(fd, OptionLevel::Socket, SocketOption::ReceiveTimeout, &timeout).unwrap();
        let mut value = [0u8; PosixSockets::OPTION_BUFFER_SIZE];
        let len = PosixSockets::get_option(fd, OptionLevel::Socket, SocketOption::ReceiveTimeout, &mut value).unwrap();
        assert_eq!(PosixSockets::decode_timeout(&value[..len]).unwrap(), Some(Duration::from_millis(250)));

        let mut short = [0u8; 2];
        let result = PosixSockets::get_option(fd, OptionLevel::Socket, SocketOption::ReceiveTimeout, &mut short);
        assert_eq!(result, Err(SocketError::InvalidArgument));

        PosixSockets::close(fd).unwrap();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_untyped_option_uses_native_call() {
        let (fd, _) = udp_loopback();
        PosixSockets::set_option(fd, OptionLevel::Socket, SocketOption::Priority, &encode_int(3)).unwrap();
        let mut value = [0u8; 4];
        let len = PosixSockets::get_option(fd, OptionLevel::Socket, SocketOption::Priority, &mut value).unwrap();
        assert_eq!(decode_int(&value[..len]).unwrap(), 3);
        PosixSockets::close(fd).unwrap();
    }

    #[test]
    fn test_disabled_linger_keeps_its_time() {
        let fd = PosixSockets::create(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap();
        let linger = Linger { enabled: false, seconds: 9 };
        let bytes = PosixSockets::encode_linger(linger);
        PosixSockets::set_option(fd, OptionLevel::Socket, SocketOption::Linger, &bytes).unwrap();

        let mut value = [0u8; 8];
        PosixSockets::get_option(fd, OptionLevel::Socket, SocketOption::Linger, &mut value).unwrap();
        assert!(!PosixSockets::decode_linger(&value).unwrap().enabled);
        PosixSockets::close(fd).unwrap();
    }

    #[test]
    fn test_membership_request_layout() {
        let request = entities_socket_types::options::encode_membership(0xE000_00FB, 0x7F00_0001);
        let (group, interface) = decode_membership(&request).unwrap();
        assert_eq!(group, Ipv4Addr::new(224, 0, 0, 251));
        assert_eq!(interface, Ipv4Addr::LOCALHOST);
        assert_eq!(decode_membership(&request[..4]), Err(SocketError::InvalidArgument));
    }

    #[test]
    fn test_sentinel_descriptor_is_rejected() {
        assert_eq!(PosixSockets::listen(-1, 1), Err(SocketError::InvalidArgument));
        let mut requests = [PollRequest::new(-1, Interest::new(true, false, false))];
        assert_eq!(PosixSockets::poll(&mut requests, Some(Duration::ZERO)), Err(SocketError::InvalidArgument));
    }

    #[test]
    fn test_resolve_numeric_host() {
        let addresses = PosixSockets::resolve("127.0.0.1", AddressFamily::Ipv4, 32).unwrap();
        assert_eq!(addresses, vec![Address::ipv4(IPV4_LOOPBACK, 0)]);
    }
}
