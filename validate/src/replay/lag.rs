//! Frame lag simulation
//!
//! Hosts deliver frames late: a busy event loop adds a little each frame and
//! the odd stall adds a lot. [`LagSimulator`] produces that extra latency
//! deterministically from a seed so replays are reproducible.

/// Shape of the extra latency added to each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagProfile {
    /// Added to every frame
    pub floor_ms: u64,
    /// Uniform extra in `0..=jitter_ms`
    pub jitter_ms: u64,
    /// Chance per frame of a stall
    pub stall_chance: f32,
    /// Extra latency of a stall
    pub stall_ms: u64,
}

impl LagProfile {
    /// Scheduling overhead plus up to one frame late, with rare stalls long
    /// enough to skip a whole lead window
    pub const BUSY_HOST: LagProfile = LagProfile {
        floor_ms: 2,
        jitter_ms: 14,
        stall_chance: 0.02,
        stall_ms: 250,
    };
}

const DEFAULT_SEED: u64 = 12345;

/// Seeded source of per-frame lag
#[derive(Debug, Clone)]
pub struct LagSimulator {
    profile: Option<LagProfile>,
    state: u64,
}

impl Default for LagSimulator {
    fn default() -> Self {
        Self::with_profile(LagProfile::BUSY_HOST)
    }
}

impl LagSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames arrive exactly on schedule
    pub fn disabled() -> Self {
        Self {
            profile: None,
            state: DEFAULT_SEED,
        }
    }

    pub fn with_profile(profile: LagProfile) -> Self {
        Self {
            profile: Some(profile),
            state: DEFAULT_SEED,
        }
    }

    pub fn seed(&mut self, seed: u64) {
        self.state = seed;
    }

    pub fn is_enabled(&self) -> bool {
        self.profile.is_some()
    }

    /// Extra latency for the next frame
    pub fn next_lag_ms(&mut self) -> u64 {
        let Some(profile) = self.profile else {
            return 0;
        };
        let mut lag = profile.floor_ms;
        if profile.jitter_ms > 0 {
            lag += self.roll() % (profile.jitter_ms + 1);
        }
        if self.chance() < profile.stall_chance {
            lag += profile.stall_ms;
        }
        lag
    }

    fn chance(&mut self) -> f32 {
        (self.roll() % 10_000) as f32 / 10_000.0
    }

    // 64-bit LCG (Knuth's MMIX constants), high bits only
    fn roll(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state >> 33
    }
}
