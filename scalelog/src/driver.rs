//! Scale protocol driver.
//!
//! The firmware speaks a line-oriented ASCII protocol over 9600 8N1:
//!
//! | Command   | Meaning                    | Response                      |
//! |-----------|----------------------------|-------------------------------|
//! | `POH\r\n` | reset / initialise         | none                          |
//! | `P\r\n`   | print the current weight   | one line, e.g. `  12.345 kg`  |
//!
//! The reset command is fire-and-forget: nothing is read back, so a reset
//! the firmware ignored looks exactly like one it accepted. The only contract
//! is the settle delay before the next command.

use std::io::ErrorKind;
use std::time::Duration;

use log::{debug, info, trace};

use crate::CancelToken;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::port::Port;
use crate::reading::WeightReading;

/// Reset / initialise command.
pub const RESET_COMMAND: &[u8] = b"POH\r\n";

/// Report-current-weight command.
pub const POLL_COMMAND: &[u8] = b"P\r\n";

/// Pause after the reset command before anything else is sent.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Interval between checks of the input buffer while waiting for a reply.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A reply is read once more than this many bytes are waiting.
pub const RESPONSE_THRESHOLD: u32 = 3;

/// Owns the serial session and runs the request/response exchange.
pub struct ScaleDriver<P: Port, C: Clock = SystemClock> {
    port: P,
    clock: C,
    cancel: CancelToken,
}

#[cfg(feature = "native")]
impl ScaleDriver<crate::port::NativePort, SystemClock> {
    /// Open `port_name` with the scale's fixed serial parameters.
    pub fn open(port_name: &str, cancel: CancelToken) -> Result<Self> {
        let port =
            crate::port::NativePort::connect(crate::port::SerialConfig::scale(port_name))?;
        info!("Opened scale on {port_name}");
        Ok(Self::new(port, SystemClock, cancel))
    }
}

impl<P: Port, C: Clock> ScaleDriver<P, C> {
    /// Create a driver over an already-open port.
    pub fn new(port: P, clock: C, cancel: CancelToken) -> Self {
        Self {
            port,
            clock,
            cancel,
        }
    }

    /// Reset the scale: clear pending input, send `POH`, wait the settle delay.
    pub fn initialize(&mut self) -> Result<()> {
        info!("Initialising scale on {}", self.port.name());
        self.port.clear_input()?;
        trace!("TX {:?}", String::from_utf8_lossy(RESET_COMMAND));
        self.port.write_all_bytes(RESET_COMMAND)?;
        self.clock.sleep(SETTLE_DELAY);
        info!("Scale initialised");
        Ok(())
    }

    /// Ask the scale for the current weight and wait for its reply.
    ///
    /// The input buffer is cleared *after* the poll command is written, so a
    /// reply that arrives before the clear is discarded and this call keeps
    /// waiting. There is no overall timeout; only cancellation ends the wait
    /// early, with [`Error::Cancelled`].
    pub fn request_weight(&mut self) -> Result<WeightReading> {
        trace!("TX {:?}", String::from_utf8_lossy(POLL_COMMAND));
        self.port.write_all_bytes(POLL_COMMAND)?;
        self.port.clear_input()?;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let waiting = self.port.bytes_to_read()?;
            if waiting > RESPONSE_THRESHOLD {
                trace!("{waiting} bytes waiting");
                break;
            }
            self.clock.sleep(POLL_INTERVAL);
        }

        let raw = self.read_line()?;
        trace!("RX {:?}", String::from_utf8_lossy(&raw));
        let payload = String::from_utf8(raw)?;
        let reading = WeightReading::new(self.clock.now(), payload.trim());
        debug!("Reading: {reading}");
        Ok(reading)
    }

    /// Read up to and including the next `\n`. A read timeout ends the line
    /// with whatever has arrived.
    fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                },
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Ok(line)
    }

    /// The serial session.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// The clock used for timestamps and waits.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The token that interrupts waits.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}
