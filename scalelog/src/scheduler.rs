//! Fixed-cadence acquisition loop.
//!
//! Each tick requests a reading, hands it to the caller for display, appends
//! it to the log and then sleeps for the configured interval. The period is
//! therefore `time spent waiting for the scale + interval`; late ticks are not
//! caught up.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::CancelToken;
use crate::clock::Clock;
use crate::driver::ScaleDriver;
use crate::error::{Error, Result};
use crate::interval::IntervalSpec;
use crate::logger::ReadingLog;
use crate::port::Port;
use crate::reading::WeightReading;

/// Longest uninterrupted sleep; cancellation is noticed within this slice.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Settings for one acquisition run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Serial device the scale is attached to.
    pub port: String,
    /// Time between the end of one reading and the next request.
    pub interval: IntervalSpec,
    /// File readings are appended to.
    pub log_path: PathBuf,
}

/// Lifecycle of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, scale not yet initialised.
    Idle,
    /// Scale initialised, ticking.
    Running,
    /// Stopped by cancellation.
    Stopped,
    /// Stopped by an unrecovered driver or log error.
    Terminated,
}

/// Outcome of a run that ended through cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Readings written to the log.
    pub readings: u64,
}

/// Drives a [`ScaleDriver`] and a [`ReadingLog`] at a fixed cadence.
pub struct Scheduler<P: Port, C: Clock> {
    driver: ScaleDriver<P, C>,
    log: ReadingLog,
    interval: Duration,
    cancel: CancelToken,
    state: SchedulerState,
    readings: u64,
}

impl<P: Port, C: Clock> Scheduler<P, C> {
    /// Create an idle scheduler. The driver's cancellation token stops the loop.
    pub fn new(driver: ScaleDriver<P, C>, config: &AcquisitionConfig) -> Self {
        let cancel = driver.cancel_token().clone();
        Self {
            driver,
            log: ReadingLog::new(&config.log_path),
            interval: config.interval.as_duration(),
            cancel,
            state: SchedulerState::Idle,
            readings: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Readings written so far.
    pub fn readings(&self) -> u64 {
        self.readings
    }

    /// The driver this scheduler polls.
    pub fn driver(&self) -> &ScaleDriver<P, C> {
        &self.driver
    }

    /// Initialise the scale and enter `Running`.
    pub fn start(&mut self) -> Result<()> {
        if let Err(e) = self.driver.initialize() {
            self.state = SchedulerState::Terminated;
            return Err(e);
        }
        self.state = SchedulerState::Running;
        info!(
            "Weighing every {:?}, logging to {}",
            self.interval,
            self.log.path().display()
        );
        Ok(())
    }

    /// Tick until cancelled or an error occurs.
    ///
    /// `on_reading` sees every reading before it is logged. Cancellation ends
    /// the run with `Ok`; the reading in progress, if any, is dropped. Any
    /// other error moves the scheduler to `Terminated` and is returned.
    pub fn run<F>(&mut self, mut on_reading: F) -> Result<RunSummary>
    where
        F: FnMut(&WeightReading),
    {
        if self.state == SchedulerState::Idle {
            self.start()?;
        }

        loop {
            match self.tick(&mut on_reading) {
                Ok(()) => {},
                Err(Error::Cancelled) => break,
                Err(e) => {
                    debug!("Acquisition stopped: {e}");
                    self.state = SchedulerState::Terminated;
                    return Err(e);
                },
            }
        }

        self.state = SchedulerState::Stopped;
        info!("Stopped after {} readings", self.readings);
        Ok(RunSummary {
            readings: self.readings,
        })
    }

    fn tick<F>(&mut self, on_reading: &mut F) -> Result<()>
    where
        F: FnMut(&WeightReading),
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let reading = self.driver.request_weight()?;
        on_reading(&reading);
        self.log.append(&reading.to_record())?;
        self.readings += 1;
        debug!("Tick {} logged", self.readings);

        self.sleep_interval()
    }

    /// Sleep exactly one interval in slices, returning early on cancellation.
    fn sleep_interval(&self) -> Result<()> {
        let mut remaining = self.interval;
        while !remaining.is_zero() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let slice = remaining.min(SLEEP_SLICE);
            self.driver.clock().sleep(slice);
            remaining -= slice;
        }
        Ok(())
    }
}
