//! Deadline clock
//!
//! A running phase is stored as an absolute deadline on the monotonic clock,
//! a paused phase as the remaining time captured at pause. Resume always
//! rebuilds a fresh absolute deadline from that snapshot, so no amount of
//! pause/resume cycling or irregular ticking accumulates drift.

use std::time::Duration;

/// Countdown state for the current phase instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Countdown {
    #[default]
    Stopped,
    /// Absolute end-of-phase time on the engine clock
    Running { deadline: Duration },
    /// Time left when the phase was paused
    Paused { remaining: Duration },
}

impl Countdown {
    /// Start counting `duration` down from `now`
    pub fn running(now: Duration, duration: Duration) -> Self {
        Countdown::Running {
            deadline: now + duration,
        }
    }

    /// Remaining time, never negative
    pub fn remaining(&self, now: Duration) -> Duration {
        match *self {
            Countdown::Stopped => Duration::ZERO,
            Countdown::Running { deadline } => deadline.saturating_sub(now),
            Countdown::Paused { remaining } => remaining,
        }
    }

    /// Remaining time rounded to the nearest millisecond
    pub fn remaining_ms(&self, now: Duration) -> u64 {
        round_ms(self.remaining(now))
    }

    /// Snapshot the remaining time. Returns false unless running.
    pub fn pause(&mut self, now: Duration) -> bool {
        match *self {
            Countdown::Running { deadline } => {
                *self = Countdown::Paused {
                    remaining: deadline.saturating_sub(now),
                };
                true
            }
            _ => false,
        }
    }

    /// Rebuild the deadline from the snapshot. Returns false unless paused.
    pub fn resume(&mut self, now: Duration) -> bool {
        match *self {
            Countdown::Paused { remaining } => {
                *self = Countdown::running(now, remaining);
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Countdown::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Countdown::Paused { .. })
    }
}

/// Round a duration to whole milliseconds, half up
pub fn round_ms(d: Duration) -> u64 {
    ((d.as_nanos() + 500_000) / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let countdown = Countdown::running(ms(100), ms(1_000));
        assert_eq!(countdown.remaining_ms(ms(600)), 500);
        assert_eq!(countdown.remaining_ms(ms(1_100)), 0);
        assert_eq!(countdown.remaining_ms(ms(9_999)), 0);
    }

    #[test]
    fn remaining_rounds_to_nearest_millisecond() {
        let countdown = Countdown::running(Duration::ZERO, ms(1_000));
        assert_eq!(countdown.remaining_ms(Duration::from_micros(400)), 1_000);
        assert_eq!(countdown.remaining_ms(Duration::from_micros(600)), 999);
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let mut countdown = Countdown::running(Duration::ZERO, ms(10_000));
        assert!(countdown.pause(ms(4_000)));
        assert_eq!(countdown.remaining_ms(ms(4_000)), 6_000);
        assert_eq!(countdown.remaining_ms(ms(60_000)), 6_000);
    }

    #[test]
    fn resume_builds_fresh_deadline() {
        let mut countdown = Countdown::running(Duration::ZERO, ms(10_000));
        countdown.pause(ms(4_000));
        assert!(countdown.resume(ms(50_000)));
        assert_eq!(countdown, Countdown::Running { deadline: ms(56_000) });
    }

    #[test]
    fn many_cycles_do_not_drift() {
        let mut countdown = Countdown::running(Duration::ZERO, ms(30_000));
        let mut now = Duration::ZERO;
        for i in 0..1_000u64 {
            now += Duration::from_micros(1_337);
            countdown.pause(now);
            now += ms(i % 7);
            countdown.resume(now);
        }
        let elapsed_running = Duration::from_micros(1_337) * 1_000;
        assert_eq!(countdown.remaining(now), ms(30_000) - elapsed_running);
    }

    #[test]
    fn mismatched_operations_are_rejected() {
        let mut countdown = Countdown::Stopped;
        assert!(!countdown.pause(ms(1)));
        assert!(!countdown.resume(ms(1)));

        let mut running = Countdown::running(Duration::ZERO, ms(5));
        assert!(!running.resume(ms(1)));
    }
}
