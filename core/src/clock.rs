//! Monotonic time sources
//!
//! The engine never reads wall-clock time. It asks a [`Clock`] for the time
//! elapsed since that clock's origin, which is immune to system clock
//! adjustments and can be driven manually in tests and replays.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic time
pub trait Clock {
    /// Time elapsed since this clock's origin
    fn now(&self) -> Duration;
}

/// Production clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// The `Instant` corresponding to a reading of this clock
    pub fn instant_at(&self, at: Duration) -> Instant {
        self.origin + at
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock for deterministic tests and replays.
///
/// Clones share the same underlying time, so a test can keep one handle while
/// the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<Duration>>,
}

impl VirtualClock {
    /// Create a clock reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock reading `at`
    pub fn at(at: Duration) -> Self {
        Self {
            now: Rc::new(Cell::new(at)),
        }
    }

    /// Move the clock to `at`. Moving backwards is ignored.
    pub fn set(&self, at: Duration) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }

    /// Move the clock to `ms` milliseconds after its origin
    pub fn set_ms(&self, ms: u64) {
        self.set(Duration::from_millis(ms));
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    /// Current reading in whole milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now.get().as_millis() as u64
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_clock_is_shared_between_clones() {
        let clock = VirtualClock::new();
        let engine_side = clock.clone();

        clock.set_ms(1_500);
        assert_eq!(engine_side.now(), Duration::from_millis(1_500));

        engine_side.advance(Duration::from_millis(250));
        assert_eq!(clock.now_ms(), 1_750);
    }

    #[test]
    fn virtual_clock_never_moves_backwards() {
        let clock = VirtualClock::at(Duration::from_secs(10));
        clock.set(Duration::from_secs(3));
        assert_eq!(clock.now(), Duration::from_secs(10));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
