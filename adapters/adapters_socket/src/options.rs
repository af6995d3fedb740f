//! Socket Options Module
//!
//! Generic option access plus typed wrappers for the options applications
//! touch most. Values travel as native bytes: integers and booleans as an
//! `int`, linger and timeouts in the backend's own layout.
//!
//! Buffer sizes read back may differ from what was set; operating systems
//! clamp them and Linux reports double the requested value.

use std::time::Duration;

use entities_socket_types::options::{decode_bool, decode_int, encode_bool, encode_int, encode_membership};
use entities_socket_types::{Linger, OptionLevel, SocketBackend, SocketError, SocketOption, SocketResult};

use crate::native::Native;
use crate::socket::Socket;

impl Socket {
    /// Set an option from its native byte representation
    ///
    /// # Arguments
    ///
    /// * `level` - Option level
    /// * `option` - Option name
    /// * `value` - Native value bytes
    pub fn set_option(&self, level: OptionLevel, option: SocketOption, value: &[u8]) -> SocketResult<()> {
        if !self.is_valid() {
            return Err(SocketError::InvalidArgument);
        }
        Native::set_option(self.as_raw(), level, option, value)
    }

    /// Read an option into `value`
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of bytes the native layer wrote
    /// * `Err(SocketError)` - Error reading the option
    pub fn get_option(&self, level: OptionLevel, option: SocketOption, value: &mut [u8]) -> SocketResult<usize> {
        if !self.is_valid() {
            return Err(SocketError::InvalidArgument);
        }
        Native::get_option(self.as_raw(), level, option, value)
    }

    fn set_int_option(&self, level: OptionLevel, option: SocketOption, value: i32) -> SocketResult<()> {
        self.set_option(level, option, &encode_int(value))
    }

    fn int_option(&self, level: OptionLevel, option: SocketOption) -> SocketResult<i32> {
        let mut value = [0u8; 4];
        let len = self.get_option(level, option, &mut value)?;
        decode_int(&value[..len])
    }

    fn set_bool_option(&self, level: OptionLevel, option: SocketOption, value: bool) -> SocketResult<()> {
        self.set_option(level, option, &encode_bool(value))
    }

    fn bool_option(&self, level: OptionLevel, option: SocketOption) -> SocketResult<bool> {
        let mut value = [0u8; 4];
        let len = self.get_option(level, option, &mut value)?;
        decode_bool(&value[..len])
    }

    fn native_option(&self, option: SocketOption) -> SocketResult<Vec<u8>> {
        let mut value = vec![0u8; <Native as SocketBackend>::OPTION_BUFFER_SIZE];
        let len = self.get_option(OptionLevel::Socket, option, &mut value)?;
        value.truncate(len);
        Ok(value)
    }

    /// Permit sending broadcast datagrams
    pub fn set_broadcast(&self, enable: bool) -> SocketResult<()> {
        self.set_bool_option(OptionLevel::Socket, SocketOption::Broadcast, enable)
    }

    /// Whether broadcast datagrams are permitted
    pub fn broadcast(&self) -> SocketResult<bool> {
        self.bool_option(OptionLevel::Socket, SocketOption::Broadcast)
    }

    /// Send keep-alive packets on an idle connection
    pub fn set_keep_alive(&self, enable: bool) -> SocketResult<()> {
        self.set_bool_option(OptionLevel::Socket, SocketOption::KeepAlive, enable)
    }

    /// Whether keep-alive packets are sent
    pub fn keep_alive(&self) -> SocketResult<bool> {
        self.bool_option(OptionLevel::Socket, SocketOption::KeepAlive)
    }

    /// Allow binding to an address in `TIME_WAIT`
    pub fn set_reuse_address(&self, reuse: bool) -> SocketResult<()> {
        self.set_bool_option(OptionLevel::Socket, SocketOption::ReuseAddress, reuse)
    }

    /// Whether address reuse is enabled
    pub fn reuse_address(&self) -> SocketResult<bool> {
        self.bool_option(OptionLevel::Socket, SocketOption::ReuseAddress)
    }

    /// Set the send buffer size in bytes
    pub fn set_send_buffer_size(&self, size: usize) -> SocketResult<()> {
        let size = i32::try_from(size).map_err(|_| SocketError::InvalidArgument)?;
        self.set_int_option(OptionLevel::Socket, SocketOption::SendBuffer, size)
    }

    /// Send buffer size in bytes
    pub fn send_buffer_size(&self) -> SocketResult<usize> {
        let size = self.int_option(OptionLevel::Socket, SocketOption::SendBuffer)?;
        usize::try_from(size).map_err(|_| SocketError::Unknown)
    }

    /// Set the receive buffer size in bytes
    pub fn set_receive_buffer_size(&self, size: usize) -> SocketResult<()> {
        let size = i32::try_from(size).map_err(|_| SocketError::InvalidArgument)?;
        self.set_int_option(OptionLevel::Socket, SocketOption::ReceiveBuffer, size)
    }

    /// Receive buffer size in bytes
    pub fn receive_buffer_size(&self) -> SocketResult<usize> {
        let size = self.int_option(OptionLevel::Socket, SocketOption::ReceiveBuffer)?;
        usize::try_from(size).map_err(|_| SocketError::Unknown)
    }

    /// Disable Nagle's algorithm
    pub fn set_no_delay(&self, enable: bool) -> SocketResult<()> {
        self.set_bool_option(OptionLevel::Tcp, SocketOption::NoDelay, enable)
    }

    /// Whether Nagle's algorithm is disabled
    pub fn no_delay(&self) -> SocketResult<bool> {
        self.bool_option(OptionLevel::Tcp, SocketOption::NoDelay)
    }

    /// Deliver out-of-band data inline with normal data
    pub fn set_out_of_band_inline(&self, enable: bool) -> SocketResult<()> {
        self.set_bool_option(OptionLevel::Socket, SocketOption::OutOfBandInline, enable)
    }

    /// Whether out-of-band data is delivered inline
    pub fn out_of_band_inline(&self) -> SocketResult<bool> {
        self.bool_option(OptionLevel::Socket, SocketOption::OutOfBandInline)
    }

    /// Set the queuing priority of outgoing packets
    ///
    /// Only available on Linux; elsewhere this reports `NotImplemented`.
    pub fn set_priority(&self, priority: i32) -> SocketResult<()> {
        self.set_int_option(OptionLevel::Socket, SocketOption::Priority, priority)
    }

    /// Queuing priority of outgoing packets
    pub fn priority(&self) -> SocketResult<i32> {
        self.int_option(OptionLevel::Socket, SocketOption::Priority)
    }

    /// Configure lingering on close
    pub fn set_linger(&self, linger: Linger) -> SocketResult<()> {
        self.set_option(OptionLevel::Socket, SocketOption::Linger, &Native::encode_linger(linger))
    }

    /// Current linger setting
    pub fn linger(&self) -> SocketResult<Linger> {
        let value = self.native_option(SocketOption::Linger)?;
        Native::decode_linger(&value)
    }

    /// Bound blocking receives; `None` waits forever
    ///
    /// A receive that times out reports `WouldBlock` on POSIX and `TimedOut`
    /// on Windows.
    pub fn set_receive_timeout(&self, timeout: Option<Duration>) -> SocketResult<()> {
        self.set_option(OptionLevel::Socket, SocketOption::ReceiveTimeout, &Native::encode_timeout(timeout))
    }

    /// Current receive timeout
    pub fn receive_timeout(&self) -> SocketResult<Option<Duration>> {
        let value = self.native_option(SocketOption::ReceiveTimeout)?;
        Native::decode_timeout(&value)
    }

    /// Bound blocking sends; `None` waits forever
    pub fn set_send_timeout(&self, timeout: Option<Duration>) -> SocketResult<()> {
        self.set_option(OptionLevel::Socket, SocketOption::SendTimeout, &Native::encode_timeout(timeout))
    }

    /// Current send timeout
    pub fn send_timeout(&self) -> SocketResult<Option<Duration>> {
        let value = self.native_option(SocketOption::SendTimeout)?;
        Native::decode_timeout(&value)
    }

    /// Join an IPv4 multicast group
    ///
    /// # Arguments
    ///
    /// * `group` - Multicast group address, host byte order
    /// * `interface` - Local interface address, `IPV4_ANY` for the default
    pub fn join_multicast(&self, group: u32, interface: u32) -> SocketResult<()> {
        self.set_option(OptionLevel::Ip, SocketOption::MembershipAdd, &encode_membership(group, interface))
    }

    /// Leave an IPv4 multicast group
    pub fn leave_multicast(&self, group: u32, interface: u32) -> SocketResult<()> {
        self.set_option(OptionLevel::Ip, SocketOption::MembershipDrop, &encode_membership(group, interface))
    }

    /// Loop sent multicast datagrams back to local listeners
    pub fn set_multicast_loop(&self, enable: bool) -> SocketResult<()> {
        self.set_bool_option(OptionLevel::Ip, SocketOption::MulticastLoop, enable)
    }

    /// Whether multicast datagrams are looped back
    pub fn multicast_loop(&self) -> SocketResult<bool> {
        self.bool_option(OptionLevel::Ip, SocketOption::MulticastLoop)
    }
}

#[cfg(test)]
mod tests {
    use entities_socket_types::{AddressFamily, Protocol, SocketType};

    use super::*;

    fn tcp() -> Socket {
        Socket::new(AddressFamily::Ipv4, SocketType::Stream, Protocol::Tcp).unwrap()
    }

    fn udp() -> Socket {
        Socket::new(AddressFamily::Ipv4, SocketType::Datagram, Protocol::Udp).unwrap()
    }

    #[test]
    fn test_boolean_options_round_trip() {
        let socket = tcp();
        for value in [true, false] {
            socket.set_keep_alive(value).unwrap();
            assert_eq!(socket.keep_alive().unwrap(), value);
            socket.set_reuse_address(value).unwrap();
            assert_eq!(socket.reuse_address().unwrap(), value);
            socket.set_no_delay(value).unwrap();
            assert_eq!(socket.no_delay().unwrap(), value);
            socket.set_out_of_band_inline(value).unwrap();
            assert_eq!(socket.out_of_band_inline().unwrap(), value);
        }
    }

    #[test]
    fn test_broadcast_round_trip() {
        let socket = udp();
        socket.set_broadcast(true).unwrap();
        assert!(socket.broadcast().unwrap());
        socket.set_broadcast(false).unwrap();
        assert!(!socket.broadcast().unwrap());
    }

    #[test]
    fn test_buffer_sizes_are_at_least_requested_minimum() {
        let socket = tcp();
        socket.set_receive_buffer_size(16 * 1024).unwrap();
        assert!(socket.receive_buffer_size().unwrap() >= 2048);
        socket.set_send_buffer_size(16 * 1024).unwrap();
        assert!(socket.send_buffer_size().unwrap() >= 2048);
    }

    #[test]
    fn test_linger_round_trip() {
        let socket = tcp();
        let linger = Linger { enabled: true, seconds: 5 };
        socket.set_linger(linger).unwrap();
        assert_eq!(socket.linger().unwrap(), linger);
    }

    #[test]
    fn test_receive_timeout_round_trip() {
        let socket = udp();
        assert_eq!(socket.receive_timeout().unwrap(), None);
        socket.set_receive_timeout(Some(Duration::from_secs(2))).unwrap();
        assert_eq!(socket.receive_timeout().unwrap(), Some(Duration::from_secs(2)));
        socket.set_receive_timeout(None).unwrap();
        assert_eq!(socket.receive_timeout().unwrap(), None);
    }

    #[test]
    fn test_receive_times_out() {
        let socket = udp();
        socket.bind(&entities_socket_types::Address::ipv4(entities_socket_types::IPV4_LOOPBACK, 0)).unwrap();
        socket.set_receive_timeout(Some(Duration::from_millis(50))).unwrap();

        let mut buffer = [0u8; 8];
        let error = socket.receive(&mut buffer, entities_socket_types::MessageFlags::empty()).unwrap_err();
        assert!(matches!(error, SocketError::WouldBlock | SocketError::TimedOut));
    }

    #[test]
    fn test_multicast_loop_round_trip() {
        let socket = udp();
        socket.set_multicast_loop(false).unwrap();
        assert!(!socket.multicast_loop().unwrap());
        socket.set_multicast_loop(true).unwrap();
        assert!(socket.multicast_loop().unwrap());
    }

    #[test]
    fn test_options_on_closed_socket() {
        let socket = Socket::invalid();
        assert_eq!(socket.set_no_delay(true), Err(SocketError::InvalidArgument));
        assert_eq!(socket.keep_alive(), Err(SocketError::InvalidArgument));
    }
}
