//! When the simulated host delivers frames

use super::lag::LagSimulator;

/// Frame delivery schedule: nominal interval, lag, and periodic suspensions
#[derive(Debug, Clone)]
pub struct FramePlan {
    frame_ms: u64,
    lag: LagSimulator,
    gap_every_ms: Option<u64>,
    gap_ms: u64,
    next_gap_at: u64,
}

impl FramePlan {
    pub fn new(frame_ms: u64, lag: LagSimulator) -> Self {
        Self {
            frame_ms: frame_ms.max(1),
            lag,
            gap_every_ms: None,
            gap_ms: 0,
            next_gap_at: u64::MAX,
        }
    }

    /// Suspend the host for `gap_ms` once every `every_ms` of replay time
    pub fn with_gaps(mut self, every_ms: u64, gap_ms: u64) -> Self {
        if every_ms > 0 && gap_ms > 0 {
            self.gap_every_ms = Some(every_ms);
            self.gap_ms = gap_ms;
            self.next_gap_at = every_ms;
        }
        self
    }

    /// Time of the frame following one requested at `now_ms`
    pub fn next_frame_at(&mut self, now_ms: u64) -> u64 {
        let mut at = now_ms + self.frame_ms + self.lag.next_lag_ms();
        let Some(every) = self.gap_every_ms else {
            return at;
        };
        if at >= self.next_gap_at {
            at = at.max(self.next_gap_at) + self.gap_ms;
            while self.next_gap_at <= at {
                self.next_gap_at += every;
            }
        }
        at
    }
}
