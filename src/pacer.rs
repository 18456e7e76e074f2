//! Fixed-interval frame pacing for the interactive host

use std::time::{Duration, Instant};

use belay_core::{FrameHandle, FrameScheduler};

/// Default pacing, roughly one display refresh
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Scheduler that holds at most one due frame, `interval` after it was requested
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    next_id: u64,
    due: Option<(FrameHandle, Instant)>,
}

impl FramePacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_id: 0,
            due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the registered frame becomes due
    pub fn due_at(&self) -> Option<Instant> {
        self.due.map(|(_, at)| at)
    }

    /// Hand out the registered frame if it is due at `now`
    pub fn take_due(&mut self, now: Instant) -> Option<FrameHandle> {
        match self.due {
            Some((handle, at)) if at <= now => {
                self.due = None;
                Some(handle)
            }
            _ => None,
        }
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameScheduler for FramePacer {
    fn schedule_next(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle::new(self.next_id);
        self.due = Some((handle, Instant::now() + self.interval));
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.due.is_some_and(|(h, _)| h == handle) {
            self.due = None;
        }
    }
}
