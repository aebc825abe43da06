//! # scalelog
//!
//! Polls a laboratory scale over a serial link and appends every reading,
//! timestamped, to a log file.
//!
//! This crate provides the pieces the `scalelog` CLI is built from:
//!
//! - Serial port discovery and probing ([`probe`])
//! - The scale's ASCII request/response protocol ([`driver`])
//! - The append-only reading log ([`logger`])
//! - The fixed-cadence acquisition loop ([`scheduler`])
//!
//! ## Features
//!
//! - `native` (default): Native serial port support via the `serialport` crate
//! - `serde`: Serialization support for data types
//!
//! ## Example
//!
//! ```rust,no_run
//! use scalelog::{AcquisitionConfig, CancelToken, IntervalSpec, ScaleDriver, Scheduler};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AcquisitionConfig {
//!         port: "/dev/ttyUSB0".to_string(),
//!         interval: IntervalSpec::parse("30m")?,
//!         log_path: "weights.log".into(),
//!     };
//!
//!     let cancel = CancelToken::new();
//!     let driver = ScaleDriver::open(&config.port, cancel.clone())?;
//!     let mut scheduler = Scheduler::new(driver, &config);
//!     scheduler.run(|reading| println!("{reading}"))?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod clock;
pub mod driver;
pub mod error;
pub mod interval;
pub mod logger;
pub mod port;
pub mod probe;
pub mod reading;
pub mod scheduler;

/// Shared stop flag checked by long-running waits.
///
/// Clones share the same flag, so a signal handler can hold one clone while
/// the acquisition loop holds another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the current operation stop.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether a stop was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// Re-exports for convenience
#[cfg(feature = "native")]
pub use port::NativePort;
#[cfg(feature = "native")]
pub use probe::{NativeProbe, confirmed_ports};
pub use {
    clock::{Clock, SystemClock},
    driver::ScaleDriver,
    error::{Error, Result},
    interval::IntervalSpec,
    logger::ReadingLog,
    port::{Port, SerialConfig},
    probe::{
        CandidateSource, PlatformKind, PortProbe, confirm_ports, discover_candidates,
        discover_candidates_for,
    },
    reading::{LogRecord, WeightReading},
    scheduler::{AcquisitionConfig, RunSummary, Scheduler, SchedulerState},
};
