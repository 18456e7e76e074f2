//! Engine output: progress, phase changes and audio cues
//!
//! A [`TimerSink`] is supplied when the engine is built. All callbacks are
//! fire-and-forget; only the cue methods may report failure, and the engine
//! treats those as best-effort.

use std::cell::RefCell;
use std::rc::Rc;

use super::error::CueError;
use super::phase::Phase;

/// Oscillator shape for a beep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Waveform {
    Sine,
    #[default]
    Square,
    Sawtooth,
    Triangle,
}

/// Fully resolved beep parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub waveform: Waveform,
}

/// The standard beep
pub const DEFAULT_TONE: Tone = Tone {
    frequency_hz: 1_000,
    duration_ms: 180,
    waveform: Waveform::Square,
};

/// The end-of-phase buzz
pub const BUZZ_TONE: Tone = Tone {
    frequency_hz: 400,
    duration_ms: 1_200,
    waveform: Waveform::Sawtooth,
};

/// A beep with optional overrides; unset fields fall back to [`DEFAULT_TONE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BeepRequest {
    pub frequency_hz: Option<u32>,
    pub duration_ms: Option<u32>,
    pub waveform: Option<Waveform>,
}

impl BeepRequest {
    /// A beep using every default
    pub const DEFAULT: BeepRequest = BeepRequest {
        frequency_hz: None,
        duration_ms: None,
        waveform: None,
    };

    /// A beep that sounds like the end-of-phase buzz
    pub const END_STYLE: BeepRequest = BeepRequest::tone(BUZZ_TONE);

    pub const fn new(frequency_hz: u32, duration_ms: u32) -> Self {
        Self {
            frequency_hz: Some(frequency_hz),
            duration_ms: Some(duration_ms),
            waveform: None,
        }
    }

    pub const fn tone(tone: Tone) -> Self {
        Self {
            frequency_hz: Some(tone.frequency_hz),
            duration_ms: Some(tone.duration_ms),
            waveform: Some(tone.waveform),
        }
    }

    /// Fill unset fields from [`DEFAULT_TONE`]
    pub fn resolve(&self) -> Tone {
        Tone {
            frequency_hz: self.frequency_hz.unwrap_or(DEFAULT_TONE.frequency_hz),
            duration_ms: self.duration_ms.unwrap_or(DEFAULT_TONE.duration_ms),
            waveform: self.waveform.unwrap_or(DEFAULT_TONE.waveform),
        }
    }
}

/// Callbacks invoked by the engine
pub trait TimerSink {
    /// Remaining time in the current phase, once per tick
    fn on_tick(&mut self, remaining_ms: u64);

    /// Every phase change, including `stop()` from idle
    fn on_phase(&mut self, phase: Phase);

    /// Each time a climb phase is entered
    fn on_round(&mut self, round: u32);

    fn play_beep(&mut self, beep: BeepRequest) -> Result<(), CueError>;

    fn play_buzz(&mut self) -> Result<(), CueError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Recording sink
// ═══════════════════════════════════════════════════════════════════════════

/// Everything a [`RecordingSink`] observed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Tick(u64),
    Phase(Phase),
    Round(u32),
    Beep(BeepRequest),
    Buzz,
}

/// Sink that appends every callback to a shared log.
///
/// Clones share the log, so one copy can go into the engine while the test
/// or replay keeps another to inspect.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<SinkEvent>>>,
    failing: Rc<RefCell<Option<CueError>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent cue fail with `error` (still recorded)
    pub fn fail_cues_with(&self, error: CueError) {
        *self.failing.borrow_mut() = Some(error);
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<SinkEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn ticks(&self) -> Vec<u64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Tick(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Phase(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn rounds(&self) -> Vec<u32> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Round(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn beep_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Beep(_)))
            .count()
    }

    pub fn buzz_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Buzz))
            .count()
    }

    fn cue_result(&self) -> Result<(), CueError> {
        match self.failing.borrow().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl TimerSink for RecordingSink {
    fn on_tick(&mut self, remaining_ms: u64) {
        self.events.borrow_mut().push(SinkEvent::Tick(remaining_ms));
    }

    fn on_phase(&mut self, phase: Phase) {
        self.events.borrow_mut().push(SinkEvent::Phase(phase));
    }

    fn on_round(&mut self, round: u32) {
        self.events.borrow_mut().push(SinkEvent::Round(round));
    }

    fn play_beep(&mut self, beep: BeepRequest) -> Result<(), CueError> {
        self.events.borrow_mut().push(SinkEvent::Beep(beep));
        self.cue_result()
    }

    fn play_buzz(&mut self) -> Result<(), CueError> {
        self.events.borrow_mut().push(SinkEvent::Buzz);
        self.cue_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_resolves_to_default_tone() {
        assert_eq!(BeepRequest::DEFAULT.resolve(), DEFAULT_TONE);
    }

    #[test]
    fn partial_request_keeps_default_waveform() {
        let tone = BeepRequest::new(900, 150).resolve();
        assert_eq!(tone.frequency_hz, 900);
        assert_eq!(tone.duration_ms, 150);
        assert_eq!(tone.waveform, Waveform::Square);
    }

    #[test]
    fn end_style_matches_buzz() {
        assert_eq!(BeepRequest::END_STYLE.resolve(), BUZZ_TONE);
    }

    #[test]
    fn recording_sink_shares_log_between_clones() {
        let sink = RecordingSink::new();
        let mut engine_side = sink.clone();
        engine_side.on_round(1);
        engine_side.on_tick(500);
        engine_side.play_buzz().unwrap();

        assert_eq!(sink.rounds(), vec![1]);
        assert_eq!(sink.ticks(), vec![500]);
        assert_eq!(sink.buzz_count(), 1);

        assert_eq!(sink.take().len(), 3);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn failing_sink_still_records() {
        let sink = RecordingSink::new();
        sink.fail_cues_with(CueError::Unavailable("no device".into()));
        let mut engine_side = sink.clone();

        assert!(engine_side.play_beep(BeepRequest::DEFAULT).is_err());
        assert_eq!(sink.beep_count(), 1);
    }
}
