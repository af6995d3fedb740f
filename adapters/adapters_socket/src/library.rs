//! Library Lifetime Module
//!
//! Reference counted start and stop of the native socket subsystem. Winsock
//! must be started before any socket call; on POSIX both steps are no-ops but
//! the count is still kept so `free` without `init` is reported the same way
//! everywhere.

use std::sync::{Mutex, PoisonError};

use entities_socket_types::{SocketBackend, SocketError, SocketResult};

use crate::native::Native;

static INIT_COUNT: Mutex<usize> = Mutex::new(0);

/// Start the native subsystem on the first call
///
/// # Returns
///
/// * `Ok(())` - Subsystem available
/// * `Err(SocketError)` - Native startup failed; the count is unchanged
pub fn init() -> SocketResult<()> {
    let mut count = INIT_COUNT.lock().unwrap_or_else(PoisonError::into_inner);
    if *count == 0 {
        Native::startup()?;
        log::debug!("native socket subsystem started");
    }
    *count += 1;
    Ok(())
}

/// Release one `init`, stopping the native subsystem with the last one
///
/// # Returns
///
/// * `Ok(())` - Reference released
/// * `Err(SocketError::NotInitialized)` - No matching `init`
pub fn free() -> SocketResult<()> {
    let mut count = INIT_COUNT.lock().unwrap_or_else(PoisonError::into_inner);
    match *count {
        0 => {
            log::warn!("socket library freed more times than initialized");
            Err(SocketError::NotInitialized)
        }
        1 => {
            Native::cleanup()?;
            *count = 0;
            log::debug!("native socket subsystem stopped");
            Ok(())
        }
        _ => {
            *count -= 1;
            Ok(())
        }
    }
}

/// Number of outstanding `init` calls
pub fn init_count() -> usize {
    *INIT_COUNT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds one `init` for its lifetime
#[derive(Debug)]
pub struct LibraryGuard {
    _private: (),
}

impl LibraryGuard {
    /// Call `init` and release it when the guard drops
    pub fn acquire() -> SocketResult<Self> {
        init()?;
        Ok(Self { _private: () })
    }
}

impl Drop for LibraryGuard {
    fn drop(&mut self) {
        if let Err(error) = free() {
            log::warn!("failed to release socket library: {}", error);
        }
    }
}
