//! Wall clock and sleep primitives used by the driver and scheduler.

use chrono::{Local, NaiveDateTime};
use std::thread;
use std::time::Duration;

/// Source of wall-clock time and blocking sleeps.
///
/// Production code uses [`SystemClock`]; tests substitute a virtual clock so
/// polling and interval waits run without real delays.
pub trait Clock {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// The host's local clock and `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    /// Virtual clock: `sleep` advances `now` instantly and records the request.
    pub(crate) struct VirtualClock {
        now: Cell<NaiveDateTime>,
        sleeps: RefCell<Vec<Duration>>,
    }

    impl VirtualClock {
        pub(crate) fn new() -> Self {
            let start = NaiveDate::from_ymd_opt(2024, 3, 7)
                .and_then(|d| d.and_hms_opt(9, 15, 0))
                .unwrap();
            Self {
                now: Cell::new(start),
                sleeps: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.borrow().clone()
        }

        pub(crate) fn total_slept(&self) -> Duration {
            self.sleeps.borrow().iter().sum()
        }
    }

    impl Clock for VirtualClock {
        fn now(&self) -> NaiveDateTime {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            let delta = TimeDelta::from_std(duration).unwrap();
            self.now.set(self.now.get() + delta);
            self.sleeps.borrow_mut().push(duration);
        }
    }
}
