//! Status Module
//!
//! Provides the closed set of outcomes every socket operation reports.
//!
//! Three views of the same set are exposed:
//! - [`StatusCode`]: every outcome, including `Success` and the framing-only
//!   `Again`, with a stable numeric code
//! - [`SocketError`]: the error subset, used as the `Err` side of [`SocketResult`]
//! - [`TransferError`]: an error together with how many bytes were moved
//!   before it happened

use std::io;
use thiserror::Error;

/// Result type of every fallible socket operation
pub type SocketResult<T> = Result<T, SocketError>;

/// Category of a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    /// Success
    Success,
    /// Non-fatal retry signal
    Retry,
    /// Generic errors (argument, memory, system, permission)
    Generic,
    /// Network condition errors
    Network,
    /// Library configuration errors
    Configuration,
    /// Peer protocol violations
    Protocol,
}

/// Closed set of operation outcomes
///
/// The numeric values are stable: `0` is success, `1` is the retry signal and
/// every error is negative.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Operation completed
    Success = 0,
    /// Valid partial progress, the caller may retry with more buffer
    Again = 1,
    /// Unknown error
    Unknown = -1,
    /// Out of memory, or a destination buffer too small for the message
    Memory = -2,
    /// Invalid argument
    InvalidArgument = -3,
    /// Unmapped error reported by the operating system
    System = -4,
    /// Permission denied
    PermissionDenied = -5,
    /// Not implemented on this platform
    NotImplemented = -6,
    /// Hostname resolution failed
    AddressLookupFailed = -7,
    /// Connection refused
    ConnectionRefused = -8,
    /// Socket is not connected, or the peer closed the stream
    NotConnected = -9,
    /// Socket was closed or reset
    SocketClosed = -10,
    /// Operation would block on a non-blocking socket
    WouldBlock = -11,
    /// Operation timed out
    TimedOut = -12,
    /// Library not initialized
    NotInitialized = -13,
    /// Peer sent a message that violates the framing format
    IllFormedMessage = -14,
}

impl StatusCode {
    /// Every status code, in numeric order from success downwards
    pub const ALL: [StatusCode; 16] = [
        StatusCode::Success,
        StatusCode::Again,
        StatusCode::Unknown,
        StatusCode::Memory,
        StatusCode::InvalidArgument,
        StatusCode::System,
        StatusCode::PermissionDenied,
        StatusCode::NotImplemented,
        StatusCode::AddressLookupFailed,
        StatusCode::ConnectionRefused,
        StatusCode::NotConnected,
        StatusCode::SocketClosed,
        StatusCode::WouldBlock,
        StatusCode::TimedOut,
        StatusCode::NotInitialized,
        StatusCode::IllFormedMessage,
    ];

    /// Get the numeric code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a status code from its numeric value
    ///
    /// # Returns
    ///
    /// * `Some(StatusCode)` - Matching status
    /// * `None` - The value is not part of the closed set
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|status| status.code() == code)
    }

    /// Whether this status is an error (neither success nor retry)
    pub fn is_error(self) -> bool {
        self.code() < 0
    }

    /// Get the category of this status
    pub fn category(self) -> StatusCategory {
        match self {
            StatusCode::Success => StatusCategory::Success,
            StatusCode::Again => StatusCategory::Retry,
            StatusCode::Unknown
            | StatusCode::Memory
            | StatusCode::InvalidArgument
            | StatusCode::System
            | StatusCode::PermissionDenied
            | StatusCode::NotImplemented => StatusCategory::Generic,
            StatusCode::AddressLookupFailed
            | StatusCode::ConnectionRefused
            | StatusCode::NotConnected
            | StatusCode::SocketClosed
            | StatusCode::WouldBlock
            | StatusCode::TimedOut => StatusCategory::Network,
            StatusCode::NotInitialized => StatusCategory::Configuration,
            StatusCode::IllFormedMessage => StatusCategory::Protocol,
        }
    }

    /// Convert to a `Result`, treating `Success` and `Again` as `Ok`
    pub fn into_result(self) -> SocketResult<StatusCode> {
        match SocketError::try_from(self) {
            Ok(error) => Err(error),
            Err(status) => Ok(status),
        }
    }
}

impl<T> From<&SocketResult<T>> for StatusCode {
    fn from(result: &SocketResult<T>) -> Self {
        match result {
            Ok(_) => StatusCode::Success,
            Err(error) => (*error).into(),
        }
    }
}

/// Socket error types
///
/// The error subset of [`StatusCode`]. Native error codes are translated into
/// one of these by the platform backends; codes without a dedicated variant
/// become [`SocketError::System`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SocketError {
    /// Unknown error
    #[error("unknown error")]
    Unknown,
    /// Out of memory, or a destination buffer too small for the message
    #[error("out of memory or buffer too small")]
    Memory,
    /// Invalid argument
    #[error("invalid argument")]
    InvalidArgument,
    /// Unmapped operating system error
    #[error("operating system error")]
    System,
    /// Permission denied
    #[error("permission denied")]
    PermissionDenied,
    /// Not implemented on this platform
    #[error("not implemented")]
    NotImplemented,
    /// Hostname resolution failed
    #[error("address lookup failed")]
    AddressLookupFailed,
    /// Connection refused
    #[error("connection refused")]
    ConnectionRefused,
    /// Not connected, or the peer closed the stream
    #[error("not connected")]
    NotConnected,
    /// Socket closed or reset
    #[error("socket closed")]
    SocketClosed,
    /// Operation would block
    #[error("operation would block")]
    WouldBlock,
    /// Timed out
    #[error("timed out")]
    TimedOut,
    /// Library not initialized
    #[error("library not initialized")]
    NotInitialized,
    /// Ill-formed message from the peer
    #[error("ill-formed message")]
    IllFormedMessage,
}

impl From<SocketError> for StatusCode {
    fn from(error: SocketError) -> Self {
        match error {
            SocketError::Unknown => StatusCode::Unknown,
            SocketError::Memory => StatusCode::Memory,
            SocketError::InvalidArgument => StatusCode::InvalidArgument,
            SocketError::System => StatusCode::System,
            SocketError::PermissionDenied => StatusCode::PermissionDenied,
            SocketError::NotImplemented => StatusCode::NotImplemented,
            SocketError::AddressLookupFailed => StatusCode::AddressLookupFailed,
            SocketError::ConnectionRefused => StatusCode::ConnectionRefused,
            SocketError::NotConnected => StatusCode::NotConnected,
            SocketError::SocketClosed => StatusCode::SocketClosed,
            SocketError::WouldBlock => StatusCode::WouldBlock,
            SocketError::TimedOut => StatusCode::TimedOut,
            SocketError::NotInitialized => StatusCode::NotInitialized,
            SocketError::IllFormedMessage => StatusCode::IllFormedMessage,
        }
    }
}

impl TryFrom<StatusCode> for SocketError {
    /// Non-error statuses are handed back unchanged
    type Error = StatusCode;

    fn try_from(status: StatusCode) -> Result<Self, Self::Error> {
        match status {
            StatusCode::Success | StatusCode::Again => Err(status),
            StatusCode::Unknown => Ok(SocketError::Unknown),
            StatusCode::Memory => Ok(SocketError::Memory),
            StatusCode::InvalidArgument => Ok(SocketError::InvalidArgument),
            StatusCode::System => Ok(SocketError::System),
            StatusCode::PermissionDenied => Ok(SocketError::PermissionDenied),
            StatusCode::NotImplemented => Ok(SocketError::NotImplemented),
            StatusCode::AddressLookupFailed => Ok(SocketError::AddressLookupFailed),
            StatusCode::ConnectionRefused => Ok(SocketError::ConnectionRefused),
            StatusCode::NotConnected => Ok(SocketError::NotConnected),
            StatusCode::SocketClosed => Ok(SocketError::SocketClosed),
            StatusCode::WouldBlock => Ok(SocketError::WouldBlock),
            StatusCode::TimedOut => Ok(SocketError::TimedOut),
            StatusCode::NotInitialized => Ok(SocketError::NotInitialized),
            StatusCode::IllFormedMessage => Ok(SocketError::IllFormedMessage),
        }
    }
}

impl From<SocketError> for io::Error {
    fn from(error: SocketError) -> Self {
        let kind = match error {
            SocketError::Memory => io::ErrorKind::OutOfMemory,
            SocketError::InvalidArgument => io::ErrorKind::InvalidInput,
            SocketError::PermissionDenied => io::ErrorKind::PermissionDenied,
            SocketError::NotImplemented => io::ErrorKind::Unsupported,
            SocketError::ConnectionRefused => io::ErrorKind::ConnectionRefused,
            SocketError::NotConnected => io::ErrorKind::NotConnected,
            SocketError::SocketClosed => io::ErrorKind::ConnectionReset,
            SocketError::WouldBlock => io::ErrorKind::WouldBlock,
            SocketError::TimedOut => io::ErrorKind::TimedOut,
            SocketError::IllFormedMessage => io::ErrorKind::InvalidData,
            SocketError::Unknown
            | SocketError::System
            | SocketError::AddressLookupFailed
            | SocketError::NotInitialized => io::ErrorKind::Other,
        };
        io::Error::new(kind, error)
    }
}

/// Error raised part-way through a multi-step transfer
///
/// Carries how many bytes were moved before the failure so callers can decide
/// whether the partial data is usable or where to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{error} after {transferred} bytes")]
pub struct TransferError {
    /// Underlying error
    pub error: SocketError,
    /// Bytes transferred before the error
    pub transferred: usize,
}

impl TransferError {
    /// Create a new transfer error
    pub fn new(error: SocketError, transferred: usize) -> Self {
        Self { error, transferred }
    }
}

impl From<SocketError> for TransferError {
    fn from(error: SocketError) -> Self {
        Self::new(error, 0)
    }
}

impl From<TransferError> for SocketError {
    fn from(error: TransferError) -> Self {
        error.error
    }
}
