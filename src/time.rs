//! Clock collaborator used to stamp container timestamps.
//!
//! The storage never relies on the clock for its own correctness; it only records the instants
//! it is handed. Tests that assert on timestamps inject a [`ManualClock`].

use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Reads the host wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, time: SystemTime) {
        *self.now.lock() = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::default();
        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH);

        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH + Duration::from_secs(5));

        let later = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
