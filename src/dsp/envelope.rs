//! Envelope detector
//!
//! One-pole attack/release follower used by the gain computer. The smoothing
//! coefficient for a time `t` (ms) at sample rate `fs` is
//! `exp(tc / (t * fs * 0.001))`, where the time constant `tc` depends on the
//! selected ballistics.

use crate::engine::ProcessSpec;
use serde::{Deserialize, Serialize};

/// Times shorter than this (in ms) disable smoothing entirely
const MIN_TIME_MS: f32 = 1.0e-3;

/// Natural log of 0.368: one analog RC time constant
const TC_EXPONENTIAL: f64 = -0.999_672_340_813_206_4;

/// `ln(0.368) * ln(9)`: time spent between 10% and 90% of a step
const TC_FAST: f64 = TC_EXPONENTIAL * 2.197_224_577_336_219_6;

/// Attack/release ballistics of an envelope follower
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Ballistics {
    /// Analog-style RC decay: the attack time is the time to reach 63.2%
    #[default]
    Exponential,
    /// The attack time is the 10%–90% rise time
    Fast,
    /// No smoothing; the follower tracks its input sample for sample
    Instant,
}

impl Ballistics {
    /// All modes in control-surface index order
    pub const ALL: [Ballistics; 3] = [Ballistics::Exponential, Ballistics::Fast, Ballistics::Instant];

    /// Time constant plugged into the coefficient formula
    pub fn time_constant(&self) -> f64 {
        match self {
            Ballistics::Exponential => TC_EXPONENTIAL,
            Ballistics::Fast => TC_FAST,
            Ballistics::Instant => 0.0,
        }
    }

    /// Mode for a control-surface choice index, if valid
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Control-surface choice index
    pub fn index(&self) -> usize {
        match self {
            Ballistics::Exponential => 0,
            Ballistics::Fast => 1,
            Ballistics::Instant => 2,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Ballistics::Exponential => "Normal",
            Ballistics::Fast => "Fast",
            Ballistics::Instant => "Instant",
        }
    }
}

/// How the detector rectifies its input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LevelCalculation {
    /// Absolute value; the envelope follows peaks
    #[default]
    Peak,
    /// Squared input, square root on output
    Rms,
}

/// Per-channel attack/release envelope follower
#[derive(Debug, Clone)]
pub struct EnvelopeDetector {
    sample_rate: f64,
    attack_ms: f32,
    release_ms: f32,
    ballistics: Ballistics,
    level: LevelCalculation,
    attack_coeff: f32,
    release_coeff: f32,
    /// Previous output per channel
    state: Vec<f32>,
}

impl EnvelopeDetector {
    /// Create a detector with 1 ms attack, 100 ms release and one channel
    pub fn new() -> Self {
        let mut detector = Self {
            sample_rate: 44100.0,
            attack_ms: 1.0,
            release_ms: 100.0,
            ballistics: Ballistics::Exponential,
            level: LevelCalculation::Peak,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            state: vec![0.0],
        };
        detector.update_coefficients();
        detector
    }

    /// Size the state for the channel count in `spec` and recompute coefficients
    ///
    /// # Panics
    /// Panics if `spec` has no channels or a non-positive sample rate.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        assert!(spec.sample_rate > 0.0, "sample rate must be positive");
        assert!(spec.num_channels > 0, "channel count must be positive");

        self.sample_rate = spec.sample_rate;
        self.state = vec![0.0; spec.num_channels];
        self.update_coefficients();
    }

    /// Set the attack time in milliseconds
    pub fn set_attack_time(&mut self, attack_ms: f32) {
        self.attack_ms = attack_ms.max(0.0);
        self.attack_coeff = self.coefficient(self.attack_ms);
    }

    /// Set the release time in milliseconds
    pub fn set_release_time(&mut self, release_ms: f32) {
        self.release_ms = release_ms.max(0.0);
        self.release_coeff = self.coefficient(self.release_ms);
    }

    /// Select the ballistics; both coefficients are recomputed
    pub fn set_ballistics(&mut self, ballistics: Ballistics) {
        if self.ballistics != ballistics {
            self.ballistics = ballistics;
            self.update_coefficients();
        }
    }

    /// Select peak or RMS rectification; resets the state
    pub fn set_level_calculation(&mut self, level: LevelCalculation) {
        self.level = level;
        self.reset(0.0);
    }

    pub fn attack_time(&self) -> f32 {
        self.attack_ms
    }

    pub fn release_time(&self) -> f32 {
        self.release_ms
    }

    pub fn ballistics(&self) -> Ballistics {
        self.ballistics
    }

    pub fn level_calculation(&self) -> LevelCalculation {
        self.level
    }

    /// Current attack smoothing coefficient (0 means no smoothing)
    pub fn attack_coefficient(&self) -> f32 {
        self.attack_coeff
    }

    /// Current release smoothing coefficient (0 means no smoothing)
    pub fn release_coefficient(&self) -> f32 {
        self.release_coeff
    }

    /// Number of channels the detector holds state for
    pub fn num_channels(&self) -> usize {
        self.state.len()
    }

    /// Set every channel's stored value to `initial_value`
    pub fn reset(&mut self, initial_value: f32) {
        self.state.fill(initial_value);
    }

    /// Stored envelope for a channel
    pub fn value(&self, channel: usize) -> f32 {
        self.state[channel]
    }

    /// Process one sample on one channel and return the smoothed level
    ///
    /// # Panics
    /// Panics if `channel` is not below the prepared channel count.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let rectified = match self.level {
            LevelCalculation::Peak => input.abs(),
            LevelCalculation::Rms => input * input,
        };

        let previous = self.state[channel];
        let coeff = if rectified > previous {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        let output = rectified + coeff * (previous - rectified);
        self.state[channel] = output;

        match self.level {
            LevelCalculation::Peak => output,
            LevelCalculation::Rms => output.sqrt(),
        }
    }

    /// Flush subnormal stored values to exact zero
    pub fn snap_to_zero(&mut self) {
        for value in &mut self.state {
            if value.is_subnormal() {
                *value = 0.0;
            }
        }
    }

    fn update_coefficients(&mut self) {
        self.attack_coeff = self.coefficient(self.attack_ms);
        self.release_coeff = self.coefficient(self.release_ms);
    }

    fn coefficient(&self, time_ms: f32) -> f32 {
        let tc = self.ballistics.time_constant();
        if time_ms < MIN_TIME_MS || tc == 0.0 {
            return 0.0;
        }
        (tc / (time_ms as f64 * self.sample_rate * 0.001)).exp() as f32
    }
}

impl Default for EnvelopeDetector {
    fn default() -> Self {
        Self::new()
    }
}
