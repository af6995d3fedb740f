//! Winsock Backend Module
//!
//! [`WinsockSockets`] lifts each Winsock 2 call one to one. Handles are
//! `SOCKET` values and `INVALID_SOCKET` is the sentinel.
//!
//! ## Platform notes
//!
//! - `startup` and `cleanup` wrap `WSAStartup(2.2)` and `WSACleanup`; the core
//!   layer reference counts them
//! - Polling uses `WSAPoll`
//! - Receive and send timeouts are a `DWORD` in milliseconds
//! - There are no link layer sockets and no `SO_PRIORITY`
//! - Interfaces are listed by resolving the local host name

use std::ffi::CString;
use std::io;
use std::mem;
use std::ptr;
use std::time::Duration;

use entities_socket_types::{
    timeout_to_millis, Address, AddressFamily, Direction, Interface, Linger, MessageFlags, OptionLevel,
    PollRequest, Protocol, Readiness, SocketBackend, SocketError, SocketOption, SocketResult, SocketType,
};
use socket2::SockAddr;
use windows_sys::Win32::Networking::WinSock::{
    self, ADDRINFOA, AF_INET, AF_INET6, AF_UNSPEC, FIONBIO, INVALID_SOCKET, IPPROTO_IP, IPPROTO_IPV6,
    IPPROTO_TCP, IPPROTO_UDP, IP_ADD_MEMBERSHIP, IP_DROP_MEMBERSHIP, IP_MULTICAST_LOOP, LINGER, MSG_OOB,
    MSG_PEEK, MSG_WAITALL, POLLERR, POLLHUP, POLLNVAL, POLLRDNORM, POLLWRNORM, SD_BOTH, SD_RECEIVE, SD_SEND,
    SOCKET, SOCKET_ERROR, SOCK_DGRAM, SOCK_RAW, SOCK_STREAM, SOL_SOCKET, SO_BROADCAST, SO_ERROR,
    SO_KEEPALIVE, SO_LINGER, SO_OOBINLINE, SO_RCVBUF, SO_RCVTIMEO, SO_REUSEADDR, SO_SNDBUF, SO_SNDTIMEO,
    TCP_NODELAY, WSADATA, WSAPOLLFD,
};

use crate::sockaddr::{decode_raw, from_native, to_native};
use crate::wsa_error::{last_error, map_io_error, map_wsa_error};

const WINSOCK_VERSION: u16 = 0x0202;

const HOSTNAME_MAX: usize = 256;

/// Winsock 2 backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WinsockSockets;

fn check(result: i32) -> SocketResult<i32> {
    if result == SOCKET_ERROR {
        Err(last_error())
    } else {
        Ok(result)
    }
}

fn buffer_len(len: usize) -> SocketResult<i32> {
    i32::try_from(len).map_err(|_| SocketError::InvalidArgument)
}

fn native_family(family: AddressFamily) -> SocketResult<i32> {
    match family {
        AddressFamily::Any => Ok(AF_UNSPEC as i32),
        AddressFamily::Ipv4 => Ok(AF_INET as i32),
        AddressFamily::Ipv6 => Ok(AF_INET6 as i32),
        AddressFamily::LinkLayer => Err(SocketError::NotImplemented),
    }
}

fn native_type(socket_type: SocketType) -> i32 {
    match socket_type {
        SocketType::Stream => SOCK_STREAM as i32,
        SocketType::Datagram => SOCK_DGRAM as i32,
        SocketType::Raw => SOCK_RAW as i32,
    }
}

fn native_protocol(protocol: Protocol) -> SocketResult<i32> {
    match protocol {
        Protocol::Default => Ok(0),
        Protocol::Tcp => Ok(IPPROTO_TCP as i32),
        Protocol::Udp => Ok(IPPROTO_UDP as i32),
        Protocol::EtherType(_) => Err(SocketError::NotImplemented),
    }
}

fn native_flags(flags: MessageFlags) -> i32 {
    let mut native = 0;
    if flags.contains(MessageFlags::PEEK) {
        native |= MSG_PEEK as i32;
    }
    if flags.contains(MessageFlags::OUT_OF_BAND) {
        native |= MSG_OOB as i32;
    }
    if flags.contains(MessageFlags::WAIT_ALL) {
        native |= MSG_WAITALL as i32;
    }
    native
}

fn native_level(level: OptionLevel) -> i32 {
    match level {
        OptionLevel::Socket => SOL_SOCKET as i32,
        OptionLevel::Ip => IPPROTO_IP as i32,
        OptionLevel::Ipv6 => IPPROTO_IPV6 as i32,
        OptionLevel::Tcp => IPPROTO_TCP as i32,
        OptionLevel::Native(level) => level,
    }
}

fn native_option(option: SocketOption) -> SocketResult<i32> {
    let name = match option {
        SocketOption::Broadcast => SO_BROADCAST,
        SocketOption::KeepAlive => SO_KEEPALIVE,
        SocketOption::Linger => SO_LINGER,
        SocketOption::ReuseAddress => SO_REUSEADDR,
        SocketOption::ReceiveBuffer => SO_RCVBUF,
        SocketOption::SendBuffer => SO_SNDBUF,
        SocketOption::ReceiveTimeout => SO_RCVTIMEO,
        SocketOption::SendTimeout => SO_SNDTIMEO,
        SocketOption::OutOfBandInline => SO_OOBINLINE,
        SocketOption::Priority => return Err(SocketError::NotImplemented),
        SocketOption::NoDelay => TCP_NODELAY as _,
        SocketOption::MembershipAdd => IP_ADD_MEMBERSHIP as _,
        SocketOption::MembershipDrop => IP_DROP_MEMBERSHIP as _,
        SocketOption::MulticastLoop => IP_MULTICAST_LOOP as _,
        SocketOption::Error => SO_ERROR,
        SocketOption::Native(name) => name,
    };
    Ok(name as i32)
}

fn timeout_millis(timeout: Option<Duration>) -> u32 {
    match timeout {
        // Zero disables the timeout, so any real timeout is at least 1 ms.
        Some(duration) => u32::try_from(timeout_to_millis(Some(duration)).max(1)).unwrap_or(u32::MAX),
        None => 0,
    }
}

impl SocketBackend for WinsockSockets {
    type Raw = SOCKET;

    const INVALID: SOCKET = INVALID_SOCKET;

    const OPTION_BUFFER_SIZE: usize = mem::size_of::<LINGER>();

    fn startup() -> SocketResult<()> {
        // SAFETY: an all-zero WSADATA is valid output storage.
        let mut data: WSADATA = unsafe { mem::zeroed() };
        let code = unsafe { WinSock::WSAStartup(WINSOCK_VERSION, &mut data) };
        if code != 0 {
            log::warn!("WSAStartup failed with code {}", code);
            return Err(map_wsa_error(code));
        }
        Ok(())
    }

    fn cleanup() -> SocketResult<()> {
        // SAFETY: balanced against a successful startup by the caller.
        check(unsafe { WinSock::WSACleanup() }).map(drop)
    }

    fn create(family: AddressFamily, socket_type: SocketType, protocol: Protocol) -> SocketResult<SOCKET> {
        let domain = native_family(family)?;
        let protocol_value = native_protocol(protocol)?;
        // SAFETY: plain call with integer arguments.
        let raw = unsafe { WinSock::socket(domain, native_type(socket_type) as _, protocol_value as _) };
        if raw == INVALID_SOCKET {
            return Err(last_error());
        }
        log::trace!("created socket {} ({:?}, {:?}, {:?})", raw, family, socket_type, protocol);
        Ok(raw)
    }

    fn bind(raw: SOCKET, address: &Address) -> SocketResult<()> {
        let addr = to_native(address)?;
        // SAFETY: addr owns a valid sockaddr of the reported length.
        check(unsafe { WinSock::bind(raw, addr.as_ptr().cast(), addr.len() as i32) }).map(drop)
    }

    fn connect(raw: SOCKET, address: &Address) -> SocketResult<()> {
        let addr = to_native(address)?;
        // SAFETY: addr owns a valid sockaddr of the reported length.
        check(unsafe { WinSock::connect(raw, addr.as_ptr().cast(), addr.len() as i32) }).map(drop)
    }

    fn listen(raw: SOCKET, backlog: i32) -> SocketResult<()> {
        // SAFETY: plain call with integer arguments.
        check(unsafe { WinSock::listen(raw, backlog) }).map(drop)
    }

    fn accept(raw: SOCKET) -> SocketResult<(SOCKET, Address)> {
        // SAFETY: storage and len come from try_init and stay valid for the call.
        let (child, addr) = unsafe {
            SockAddr::try_init(|storage, len| {
                let child = WinSock::accept(raw, storage.cast(), len.cast());
                if child == INVALID_SOCKET {
                    Err(io::Error::from_raw_os_error(WinSock::WSAGetLastError()))
                } else {
                    Ok(child)
                }
            })
        }
        .map_err(map_io_error)?;
        Ok((child, from_native(&addr)))
    }

    fn send(raw: SOCKET, buffer: &[u8], flags: MessageFlags) -> SocketResult<usize> {
        let len = buffer_len(buffer.len())?;
        // SAFETY: buffer is valid for reads of len bytes.
        let sent = check(unsafe { WinSock::send(raw, buffer.as_ptr(), len, native_flags(flags) as _) })?;
        Ok(sent as usize)
    }

    fn send_to(raw: SOCKET, buffer: &[u8], flags: MessageFlags, destination: &Address) -> SocketResult<usize> {
        let addr = to_native(destination)?;
        let len = buffer_len(buffer.len())?;
        // SAFETY: buffer and addr are valid for the lengths passed.
        let sent = check(unsafe {
            WinSock::sendto(
                raw,
                buffer.as_ptr(),
                len,
                native_flags(flags) as _,
                addr.as_ptr().cast(),
                addr.len() as i32,
            )
        })?;
        Ok(sent as usize)
    }

    fn receive(raw: SOCKET, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<usize> {
        let len = buffer_len(buffer.len())?;
        // SAFETY: buffer is valid for writes of len bytes.
        let received = check(unsafe { WinSock::recv(raw, buffer.as_mut_ptr(), len, native_flags(flags) as _) })?;
        Ok(received as usize)
    }

    fn receive_from(raw: SOCKET, buffer: &mut [u8], flags: MessageFlags) -> SocketResult<(usize, Address)> {
        let len = buffer_len(buffer.len())?;
        let native = native_flags(flags);
        // SAFETY: buffer is valid for writes of len bytes; storage and addr_len
        // come from try_init.
        let (received, addr) = unsafe {
            SockAddr::try_init(|storage, addr_len| {
                let n = WinSock::recvfrom(
                    raw,
                    buffer.as_mut_ptr(),
                    len,
                    native as _,
                    storage.cast(),
                    addr_len.cast(),
                );
                if n == SOCKET_ERROR {
                    Err(io::Error::from_raw_os_error(WinSock::WSAGetLastError()))
                } else {
                    Ok(n as usize)
                }
            })
        }
        .map_err(map_io_error)?;
        Ok((received, from_native(&addr)))
    }

    fn shutdown(raw: SOCKET, direction: Direction) -> SocketResult<()> {
        let how = match direction {
            Direction::Receive => SD_RECEIVE,
            Direction::Send => SD_SEND,
            Direction::Both => SD_BOTH,
        };
        // SAFETY: plain call with integer arguments.
        check(unsafe { WinSock::shutdown(raw, how) }).map(drop)
    }

    fn close(raw: SOCKET) -> SocketResult<()> {
        // SAFETY: the caller gives up the handle.
        check(unsafe { WinSock::closesocket(raw) }).map(drop)
    }

    fn set_option(raw: SOCKET, level: OptionLevel, option: SocketOption, value: &[u8]) -> SocketResult<()> {
        let name = native_option(option)?;
        let len = buffer_len(value.len())?;
        // SAFETY: value is valid for reads of len bytes.
        check(unsafe { WinSock::setsockopt(raw, native_level(level), name, value.as_ptr(), len) }).map(drop)
    }

    fn get_option(raw: SOCKET, level: OptionLevel, option: SocketOption, value: &mut [u8]) -> SocketResult<usize> {
        let name = native_option(option)?;
        let mut len = buffer_len(value.len())?;
        // SAFETY: value is valid for writes of len bytes.
        check(unsafe { WinSock::getsockopt(raw, native_level(level), name, value.as_mut_ptr(), &mut len) })?;
        Ok((len.max(0) as usize).min(value.len()))
    }

    fn local_address(raw: SOCKET) -> SocketResult<Address> {
        // SAFETY: storage and len come from try_init.
        let ((), addr) = unsafe {
            SockAddr::try_init(|storage, len| {
                if WinSock::getsockname(raw, storage.cast(), len.cast()) == SOCKET_ERROR {
                    Err(io::Error::from_raw_os_error(WinSock::WSAGetLastError()))
                } else {
                    Ok(())
                }
            })
        }
        .map_err(map_io_error)?;
        Ok(from_native(&addr))
    }

    fn set_nonblocking(raw: SOCKET, nonblocking: bool) -> SocketResult<()> {
        let mut mode = u32::from(nonblocking);
        // SAFETY: mode outlives the call.
        check(unsafe { WinSock::ioctlsocket(raw, FIONBIO as _, &mut mode) }).map(drop)
    }

    fn pending_error(raw: SOCKET) -> SocketResult<Option<SocketError>> {
        let mut value = [0u8; 4];
        let len = Self::get_option(raw, OptionLevel::Socket, SocketOption::Error, &mut value)?;
        let code = entities_socket_types::options::decode_int(&value[..len])?;
        if code == 0 {
            Ok(None)
        } else {
            Ok(Some(map_wsa_error(code)))
        }
    }

    fn poll(requests: &mut [PollRequest<SOCKET>], timeout: Option<Duration>) -> SocketResult<usize> {
        let mut fds: Vec<WSAPOLLFD> = requests
            .iter()
            .map(|request| {
                let mut events = 0;
                if request.interest.read {
                    events |= POLLRDNORM;
                }
                if request.interest.write {
                    events |= POLLWRNORM;
                }
                WSAPOLLFD { fd: request.raw, events, revents: 0 }
            })
            .collect();

        let count = u32::try_from(fds.len()).map_err(|_| SocketError::InvalidArgument)?;
        // SAFETY: fds is a valid array of count entries.
        check(unsafe { WinSock::WSAPoll(fds.as_mut_ptr(), count, timeout_to_millis(timeout)) })?;

        let mut ready = 0;
        for (request, fd) in requests.iter_mut().zip(&fds) {
            let revents = fd.revents;
            request.readiness = Readiness {
                readable: revents & POLLRDNORM != 0,
                writable: revents & POLLWRNORM != 0,
                errored: revents & POLLERR != 0,
                hung_up: revents & POLLHUP != 0,
                invalid: revents & POLLNVAL != 0,
            };
            if request.readiness.any() {
                ready += 1;
            }
        }
        Ok(ready)
    }

    fn resolve(hostname: &str, family: AddressFamily, max_results: usize) -> SocketResult<Vec<Address>> {
        let host = CString::new(hostname).map_err(|_| SocketError::InvalidArgument)?;

        // SAFETY: an all-zero ADDRINFOA is a valid "no hints" value.
        let mut hints: ADDRINFOA = unsafe { mem::zeroed() };
        hints.ai_family = match family {
            AddressFamily::LinkLayer => return Err(SocketError::NotImplemented),
            other => native_family(other)?,
        };
        hints.ai_socktype = SOCK_STREAM as _;

        let mut list: *mut ADDRINFOA = ptr::null_mut();
        // SAFETY: host is NUL terminated, hints and list are valid for the call.
        let code = unsafe { WinSock::getaddrinfo(host.as_ptr().cast(), ptr::null(), &hints, &mut list) };
        if code != 0 {
            log::debug!("getaddrinfo({}) failed with code {}", hostname, code);
            return Err(map_wsa_error(code));
        }

        let mut addresses = Vec::new();
        let mut cursor = list;
        while !cursor.is_null() && addresses.len() < max_results {
            // SAFETY: cursor walks the list getaddrinfo returned.
            let info = unsafe { &*cursor };
            let address = unsafe { decode_raw(info.ai_addr, info.ai_addrlen) };
            if !address.is_unspecified() {
                addresses.push(address);
            }
            cursor = info.ai_next;
        }
        // SAFETY: list came from a successful getaddrinfo and is freed once.
        unsafe { WinSock::freeaddrinfo(list) };

        if addresses.is_empty() && max_results > 0 {
            return Err(SocketError::AddressLookupFailed);
        }
        Ok(addresses)
    }

    fn local_interfaces() -> SocketResult<Vec<Interface>> {
        let mut name = [0u8; HOSTNAME_MAX];
        // SAFETY: name is valid for writes of its length.
        check(unsafe { WinSock::gethostname(name.as_mut_ptr(), HOSTNAME_MAX as i32) })?;
        let end = name.iter().position(|&byte| byte == 0).unwrap_or(name.len());
        let hostname = String::from_utf8_lossy(&name[..end]).into_owned();

        let addresses = Self::resolve(&hostname, AddressFamily::Any, usize::MAX)?;
        Ok(addresses
            .into_iter()
            .map(|address| Interface { name: hostname.clone(), address })
            .collect())
    }

    fn encode_linger(linger: Linger) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(mem::size_of::<LINGER>());
        bytes.extend_from_slice(&u16::from(linger.enabled).to_ne_bytes());
        bytes.extend_from_slice(&linger.seconds.to_ne_bytes());
        bytes
    }

    fn decode_linger(bytes: &[u8]) -> SocketResult<Linger> {
        if bytes.len() != mem::size_of::<LINGER>() {
            return Err(SocketError::InvalidArgument);
        }
        Ok(Linger {
            enabled: u16::from_ne_bytes([bytes[0], bytes[1]]) != 0,
            seconds: u16::from_ne_bytes([bytes[2], bytes[3]]),
        })
    }

    fn encode_timeout(timeout: Option<Duration>) -> Vec<u8> {
        timeout_millis(timeout).to_ne_bytes().to_vec()
    }

    fn decode_timeout(bytes: &[u8]) -> SocketResult<Option<Duration>> {
        let millis: [u8; 4] = bytes.try_into().map_err(|_| SocketError::InvalidArgument)?;
        match u32::from_ne_bytes(millis) {
            0 => Ok(None),
            millis => Ok(Some(Duration::from_millis(u64::from(millis)))),
        }
    }
}
