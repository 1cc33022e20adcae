//! Time source for the kernel.
//!
//! Fatigue levels, the score's fatigue factor and archive hour windows all
//! depend on "now". The kernel reads it through this trait so tests can pin
//! and advance time deterministically.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for the store and lifecycle.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}


/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}


/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    /// Jump to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}


/// Reduce a timestamp to its hour window, e.g. `14:00-14:59`.
///
/// Archive records never carry anything finer than this.
pub fn hour_window(at: DateTime<Utc>) -> String {
    let hour = at.format("%H");
    format!("{hour}:00-{hour}:59")
}
