//! Resolution Module
//!
//! Hostname lookup and interface listing. Resolution is delegated to the
//! system resolver; results come back in resolver order.

use entities_socket_types::{Address, AddressFamily, Interface, SocketBackend, SocketError, SocketResult};

use crate::native::Native;

/// Default number of resolved candidates tried by a connect by name
pub const MAX_CANDIDATES: usize = 32;

/// Configuration for connecting by hostname
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Upper bound on resolved addresses to try
    pub max_candidates: usize,
    /// Resolver family; `Any` uses the socket's own family
    pub family: AddressFamily,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            max_candidates: MAX_CANDIDATES,
            family: AddressFamily::Any,
        }
    }
}

/// Resolve a hostname
///
/// # Arguments
///
/// * `hostname` - Host name or numeric address
/// * `family` - Restrict results to one family, `Any` for all
/// * `max_results` - Upper bound on returned addresses
///
/// # Returns
///
/// * `Ok(Vec<Address>)` - Addresses in resolver order, port zero
/// * `Err(SocketError::InvalidArgument)` - Empty hostname
/// * `Err(SocketError::AddressLookupFailed)` - Name did not resolve
pub fn resolve_hostname(hostname: &str, family: AddressFamily, max_results: usize) -> SocketResult<Vec<Address>> {
    if hostname.is_empty() {
        return Err(SocketError::InvalidArgument);
    }
    let addresses = Native::resolve(hostname, family, max_results)?;
    log::debug!("resolved {} to {} address(es)", hostname, addresses.len());
    Ok(addresses)
}

/// List the addresses assigned to local interfaces
pub fn local_interfaces() -> SocketResult<Vec<Interface>> {
    Native::local_interfaces()
}

#[cfg(test)]
mod tests {
    use super::*;
    use entities_socket_types::IPV4_LOOPBACK;

    #[test]
    fn test_resolve_numeric_ipv4() {
        let addresses = resolve_hostname("127.0.0.1", AddressFamily::Ipv4, MAX_CANDIDATES).unwrap();
        assert_eq!(addresses.first(), Some(&Address::ipv4(IPV4_LOOPBACK, 0)));
    }

    #[test]
    fn test_resolve_respects_limit() {
        let addresses = resolve_hostname("localhost", AddressFamily::Any, 1).unwrap();
        assert_eq!(addresses.len(), 1);
    }

    #[test]
    fn test_resolve_empty_hostname() {
        assert_eq!(
            resolve_hostname("", AddressFamily::Any, MAX_CANDIDATES),
            Err(SocketError::InvalidArgument)
        );
    }

    #[test]
    fn test_resolve_unknown_host() {
        let result = resolve_hostname("name.that.does.not.exist.invalid", AddressFamily::Any, MAX_CANDIDATES);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_connect_config() {
        let config = ConnectConfig::default();
        assert_eq!(config.max_candidates, 32);
        assert_eq!(config.family, AddressFamily::Any);
    }
}
