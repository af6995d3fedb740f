//! Common Facades
//!
//! Candidate iteration shared by the hostname based constructors.

use adapters_socket::{resolve_hostname, Address, AddressFamily, SocketError, SocketResult, MAX_CANDIDATES};

/// Build something from the first resolved address that works
///
/// # Arguments
///
/// * `hostname` - Host name or numeric address
/// * `port` - Port applied to every candidate
/// * `family` - Resolver family, `Any` for all
/// * `attempt` - Called with each candidate until it succeeds
///
/// # Returns
///
/// * `Ok(T)` - Result of the first successful attempt
/// * `Err(SocketError)` - Resolver failure, or the error of the last attempt
pub fn first_candidate<T, F>(hostname: &str, port: u16, family: AddressFamily, mut attempt: F) -> SocketResult<T>
where
    F: FnMut(&Address) -> SocketResult<T>,
{
    let candidates = resolve_hostname(hostname, family, MAX_CANDIDATES)?;

    let mut last_error = SocketError::AddressLookupFailed;
    for candidate in candidates {
        let target = candidate.with_port(port);
        match attempt(&target) {
            Ok(value) => return Ok(value),
            Err(error) => {
                log::debug!("{} ({:?}) failed: {}", hostname, target, error);
                last_error = error;
            }
        }
    }
    Err(last_error)
}
