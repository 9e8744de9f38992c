//! # Error Types
//!
//! This module defines the error taxonomy used throughout the printing core.
//!
//! | Variant | Raised by | Fallback? |
//! |---------|-----------|-----------|
//! | `UnsupportedTransport` | host lacks the capability | local print if a surface exists, else no |
//! | `ConnectionTimeout` / `ConnectionRefused` | Bluetooth handshake | no |
//! | `NotConnected` | write while not connected | no |
//! | `WriteInProgress` | concurrent write guard | no, retry later |
//! | `WriteFailure` | mid-stream write | no |
//! | `RelayFailure` | network relay | local print |
//! | `HostPrintUnavailable` | local print surface | emergency print once |

use thiserror::Error;

/// Main error type for printing operations
#[derive(Debug, Error)]
pub enum PrintError {
    /// The host environment lacks the capability this transport needs
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// Device handshake did not finish in time
    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    /// Device or host refused the connection
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    /// Write attempted while the connection is not established
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Another write already owns the connection
    #[error("Write in progress: retry once the current job finishes")]
    WriteInProgress,

    /// Write failed or timed out mid-stream
    #[error("Write failed: {0}")]
    WriteFailure(String),

    /// The backend relay did not accept the job
    #[error("Relay failure: {0}")]
    RelayFailure(String),

    /// The host print surface could not be used
    #[error("Host print unavailable: {0}")]
    HostPrintUnavailable(String),

    /// Invalid printer profile or settings
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrintError {
    /// Whether this failure should trigger the local print fallback.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PrintError::RelayFailure(_))
    }
}

/// Result type for printing operations
pub type PrintResult<T> = Result<T, PrintError>;
