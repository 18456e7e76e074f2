//! Cue scheduling
//!
//! Each phase kind has a fixed list of marks (milliseconds before the phase
//! ends). A mark fires when the previous tick was inside its lead window, or
//! when the current tick has already crossed it. The crossing check alone
//! catches marks whose lead window was skipped entirely, e.g. while the host
//! stopped delivering frames. A per-phase-instance bitmask keeps every mark to
//! a single firing.

use super::phase::PhaseKind;
use super::sink::BeepRequest;

/// Default lead window in milliseconds
pub const DEFAULT_LEAD_WINDOW_MS: u64 = 1_000;

/// What a mark plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Beep(BeepRequest),
    Buzz,
}

/// A cue point, `offset_ms` before the end of the phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueMark {
    pub offset_ms: u64,
    pub cue: Cue,
}

const fn beep(offset_ms: u64, request: BeepRequest) -> CueMark {
    CueMark {
        offset_ms,
        cue: Cue::Beep(request),
    }
}

const TRANSITION_BEEP: BeepRequest = BeepRequest::new(900, 150);

/// Climb marks, sorted by descending offset
pub const CLIMB_CUES: &[CueMark] = &[
    beep(60_000, BeepRequest::END_STYLE),
    beep(5_000, BeepRequest::DEFAULT),
    beep(4_000, BeepRequest::DEFAULT),
    beep(3_000, BeepRequest::DEFAULT),
    beep(2_000, BeepRequest::DEFAULT),
    beep(1_000, BeepRequest::DEFAULT),
    CueMark {
        offset_ms: 0,
        cue: Cue::Buzz,
    },
];

/// Transition marks, sorted by descending offset
pub const TRANSITION_CUES: &[CueMark] = &[
    beep(5_000, TRANSITION_BEEP),
    beep(4_000, TRANSITION_BEEP),
    beep(3_000, TRANSITION_BEEP),
    beep(2_000, TRANSITION_BEEP),
    beep(1_000, TRANSITION_BEEP),
    CueMark {
        offset_ms: 0,
        cue: Cue::Buzz,
    },
];

/// Mark list for a phase kind
pub fn schedule_for(kind: PhaseKind) -> &'static [CueMark] {
    match kind {
        PhaseKind::Climb => CLIMB_CUES,
        PhaseKind::Transition => TRANSITION_CUES,
    }
}

/// Marks already fired in the current phase instance, by schedule index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CueTracker {
    fired: u32,
}

impl CueTracker {
    /// Largest schedule the bitmask can track
    pub const CAPACITY: usize = u32::BITS as usize;

    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every fired mark. Called on phase entry only.
    pub fn reset(&mut self) {
        self.fired = 0;
    }

    pub fn is_fired(&self, index: usize) -> bool {
        index < Self::CAPACITY && self.fired & (1 << index) != 0
    }

    /// Mark `index` as fired. Returns false if it already was.
    pub fn claim(&mut self, index: usize) -> bool {
        if index >= Self::CAPACITY || self.is_fired(index) {
            return false;
        }
        self.fired |= 1 << index;
        true
    }

    pub fn fired_count(&self) -> u32 {
        self.fired.count_ones()
    }
}

/// Should `mark` fire for a tick that moved from `prev` to `cur`?
pub fn should_fire(mark: u64, prev: u64, cur: u64, lead_window_ms: u64) -> bool {
    let within_lead = prev > mark && prev <= mark.saturating_add(lead_window_ms);
    let crossed = cur <= mark;
    within_lead || crossed
}

/// Claim and return every mark due for this tick, in schedule order.
///
/// Marks beyond `phase_duration_ms` can never be reached and are skipped.
pub fn due_cues<'a>(
    schedule: &'a [CueMark],
    phase_duration_ms: u64,
    prev: u64,
    cur: u64,
    lead_window_ms: u64,
    tracker: &mut CueTracker,
) -> Vec<&'a CueMark> {
    let mut due = Vec::new();
    for (index, mark) in schedule.iter().enumerate() {
        if mark.offset_ms > phase_duration_ms || tracker.is_fired(index) {
            continue;
        }
        if should_fire(mark.offset_ms, prev, cur, lead_window_ms) && tracker.claim(index) {
            due.push(mark);
        }
    }
    due
}

/// Claim the end-of-phase mark if the tick loop has not fired it yet
pub fn claim_final<'a>(schedule: &'a [CueMark], tracker: &mut CueTracker) -> Option<&'a CueMark> {
    let index = schedule.iter().position(|m| m.offset_ms == 0)?;
    tracker.claim(index).then(|| &schedule[index])
}
