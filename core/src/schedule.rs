//! Frame scheduling
//!
//! The engine has no threads of its own. A host registers "call me on the next
//! frame" requests through a [`FrameScheduler`] and later delivers the frame
//! back with [`TimerEngine::on_frame`](crate::timers::TimerEngine::on_frame).
//!
//! Production hosts pace frames with their display or timer facility; tests and
//! replays use [`ManualScheduler`] together with a
//! [`VirtualClock`](crate::clock::VirtualClock).

use std::collections::BTreeSet;
use std::fmt;

/// Identifies one scheduled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Host facility that delivers a single future frame per request
pub trait FrameScheduler {
    /// Register interest in the next frame
    fn schedule_next(&mut self) -> FrameHandle;

    /// Withdraw a registration. Cancelling an unknown or already delivered
    /// handle is a no-op.
    fn cancel(&mut self, handle: FrameHandle);
}

/// Scheduler whose frames are delivered by the caller.
///
/// Keeps every outstanding registration so tests can assert that the engine
/// never holds more than one.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    outstanding: BTreeSet<FrameHandle>,
    scheduled: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest outstanding registration, if any
    pub fn pending(&self) -> Option<FrameHandle> {
        self.outstanding.iter().next().copied()
    }

    /// Remove and return the oldest outstanding registration
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.outstanding.pop_first()
    }

    /// Number of registrations not yet delivered or cancelled
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Total registrations made
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    /// Total registrations withdrawn before delivery
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.scheduled += 1;
        let handle = FrameHandle(self.next_id);
        self.outstanding.insert(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.outstanding.remove(&handle) {
            self.cancelled += 1;
        }
    }
}
