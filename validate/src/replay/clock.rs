//! Replay clock
//!
//! Wraps the engine's virtual clock. In accelerated mode time jumps straight
//! to the next step; in realtime mode the replay sleeps for the gap first so
//! the countdown can be watched at 1x.

use std::time::Duration;

use belay_core::VirtualClock;

#[derive(Debug, Clone)]
pub struct ReplayClock {
    clock: VirtualClock,
    realtime: bool,
}

impl ReplayClock {
    pub fn new(realtime: bool) -> Self {
        Self {
            clock: VirtualClock::new(),
            realtime,
        }
    }

    /// Create a clock for instant (accelerated) replay
    pub fn instant() -> Self {
        Self::new(false)
    }

    /// Handle the engine reads time from
    pub fn engine_clock(&self) -> VirtualClock {
        self.clock.clone()
    }

    /// Advance to `at_ms`, sleeping first in realtime mode
    pub fn advance_to(&mut self, at_ms: u64) {
        let now = self.clock.now_ms();
        if at_ms <= now {
            return;
        }
        if self.realtime {
            std::thread::sleep(Duration::from_millis(at_ms - now));
        }
        self.clock.set_ms(at_ms);
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn is_realtime(&self) -> bool {
        self.realtime
    }
}

/// Format replay time as MM:SS.ss
pub fn format_replay_time(ms: u64) -> String {
    let mins = ms / 60_000;
    let secs = (ms % 60_000) as f32 / 1000.0;
    format!("{:02}:{:05.2}", mins, secs)
}
