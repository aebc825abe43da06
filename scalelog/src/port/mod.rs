//! Port abstraction for the scale's serial session.
//!
//! The protocol driver talks to a [`Port`] rather than to the `serialport`
//! crate directly, so the request/response exchange can be exercised against
//! an in-memory device in tests.
//!
//! ```text
//! +------------------+
//! |   ScaleDriver    |   POH / P commands, line decoding
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |   Port trait     |   write, clear input, bytes waiting, read
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |    NativePort    |
//! |   (serialport)   |
//! +------------------+
//! ```

#[cfg(feature = "native")]
pub mod native;

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Baud rate the scale firmware talks at.
pub const SCALE_BAUD_RATE: u32 = 9600;

/// Per-read timeout of the serial session.
pub const SCALE_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial session parameters.
///
/// The scale always talks 8 data bits, no parity, one stop bit and no flow
/// control; only the device, baud rate and read timeout are carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialConfig {
    /// Scale session parameters (9600 8N1, 1 s timeout, no flow control) for `port_name`.
    pub fn scale(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: SCALE_BAUD_RATE,
            timeout: SCALE_READ_TIMEOUT,
        }
    }

    /// Port name/path (e.g., "/dev/ttyUSB0", "COM3").
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Per-read timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Serial session used by the scale driver.
pub trait Port: Read + Write + Send {
    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Discard everything received but not yet read.
    fn clear_input(&mut self) -> Result<()>;

    /// Number of received bytes waiting to be read.
    fn bytes_to_read(&mut self) -> Result<u32>;

    /// Write all bytes and flush, blocking until complete.
    fn write_all_bytes(&mut self, buf: &[u8]) -> Result<()> {
        std::io::Write::write_all(self, buf)?;
        std::io::Write::flush(self)?;
        Ok(())
    }
}

#[cfg(feature = "native")]
pub use native::NativePort;
