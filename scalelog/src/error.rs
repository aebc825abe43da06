//! Error types for scalelog.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Result type for scalelog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for scalelog operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the serial session.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[cfg(feature = "native")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The host platform has no known serial device naming scheme.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Probing found no serial device that could be opened.
    #[error(
        "No available ports found, make sure everything is connected and you have permission to use the port"
    )]
    NoPortsFound,

    /// The scale's serial device could not be opened.
    #[error("Failed to open {port}: {reason}")]
    DeviceOpen {
        /// Device path that failed to open.
        port: String,
        /// Reason reported by the serial backend.
        reason: String,
    },

    /// The scale replied with bytes that are not valid UTF-8.
    #[error("Invalid response from scale: {0}")]
    Decode(#[from] FromUtf8Error),

    /// A reading could not be appended to the log file.
    #[error("Failed to write log file {}: {source}", path.display())]
    LogWrite {
        /// Log file path.
        path: PathBuf,
        /// Underlying filesystem error.
        source: io::Error,
    },

    /// The interval string does not match `<integer><s|m|h>`.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// The operation was stopped by a cancellation request.
    #[error("Cancelled")]
    Cancelled,
}
