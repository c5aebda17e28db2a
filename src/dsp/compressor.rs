//! Feed-forward soft-knee compressor
//!
//! The detector level is converted to dB, run through the static curve, and
//! the resulting gain reduction (not the level) is smoothed by a peak
//! [`EnvelopeDetector`]. The smoothed reduction and makeup gain give the
//! linear gain applied to the input.

use super::envelope::{Ballistics, EnvelopeDetector, LevelCalculation};
use crate::engine::buffer::{db_to_linear, linear_to_db_floored, SILENCE_FLOOR_DB};
use crate::engine::{AudioBuffer, ProcessSpec};
use crate::params::BandParameters;

/// Static gain curve: output level in dB for an input level `x_g` in dB
///
/// `knee_db == 0` is a hard knee and takes its own branch.
#[inline]
pub fn static_curve(x_g: f32, threshold_db: f32, ratio: f32, knee_db: f32) -> f32 {
    let over = x_g - threshold_db;

    if knee_db <= 0.0 {
        return if over > 0.0 {
            threshold_db + over / ratio
        } else {
            x_g
        };
    }

    if 2.0 * over < -knee_db {
        x_g
    } else if 2.0 * over > knee_db {
        threshold_db + over / ratio
    } else {
        let k = over + knee_db / 2.0;
        x_g + (1.0 / ratio - 1.0) * k * k / (2.0 * knee_db)
    }
}

/// Compressor dynamics processor
///
/// Each channel is detected and gain-reduced independently. In keyed mode the
/// detector reads the sidechain argument instead of the input.
#[derive(Debug, Clone)]
pub struct Compressor {
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
    makeup_db: f32,
    use_sidechain: bool,
    bypass: bool,
    /// Smooths the gain reduction in dB
    detector: EnvelopeDetector,
    /// Most recent smoothed reduction per channel, in dB
    reduction_db: Vec<f32>,
}

impl Compressor {
    /// Create a compressor at 0 dB threshold, 1:1, hard knee
    pub fn new() -> Self {
        let mut detector = EnvelopeDetector::new();
        detector.set_level_calculation(LevelCalculation::Peak);
        Self {
            threshold_db: 0.0,
            ratio: 1.0,
            knee_db: 0.0,
            makeup_db: 0.0,
            use_sidechain: false,
            bypass: false,
            detector,
            reduction_db: vec![0.0],
        }
    }

    /// Allocate per-channel state and recompute smoothing coefficients
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.detector.prepare(spec);
        self.reduction_db = vec![0.0; spec.num_channels];
    }

    /// Clear the detector and metering state
    pub fn reset(&mut self) {
        self.detector.reset(0.0);
        self.reduction_db.fill(0.0);
    }

    pub fn set_threshold(&mut self, threshold_db: f32) {
        self.threshold_db = threshold_db;
    }

    /// Set the ratio; values below 1 are clamped to 1
    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = if ratio.is_nan() { 1.0 } else { ratio.max(1.0) };
    }

    /// Set the knee width in dB; negative widths are clamped to 0
    pub fn set_knee(&mut self, knee_db: f32) {
        self.knee_db = knee_db.max(0.0);
    }

    pub fn set_makeup(&mut self, makeup_db: f32) {
        self.makeup_db = makeup_db;
    }

    pub fn set_attack(&mut self, attack_ms: f32) {
        self.detector.set_attack_time(attack_ms);
    }

    pub fn set_release(&mut self, release_ms: f32) {
        self.detector.set_release_time(release_ms);
    }

    pub fn set_ballistics(&mut self, ballistics: Ballistics) {
        self.detector.set_ballistics(ballistics);
    }

    /// Detect from the sidechain argument instead of the input
    pub fn set_sidechain_mode(&mut self, use_external: bool) {
        self.use_sidechain = use_external;
    }

    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    /// Apply one band's controls (everything except drive and solo)
    pub fn apply_parameters(&mut self, params: &BandParameters) {
        self.set_threshold(params.threshold_db);
        self.set_ratio(params.ratio);
        self.set_knee(params.knee_db);
        self.set_makeup(params.makeup_db);
        self.set_ballistics(params.ballistics);
        if self.detector.attack_time() != params.attack_ms {
            self.set_attack(params.attack_ms);
        }
        if self.detector.release_time() != params.release_ms {
            self.set_release(params.release_ms);
        }
        self.set_bypass(params.bypass);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold_db
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn knee(&self) -> f32 {
        self.knee_db
    }

    pub fn makeup(&self) -> f32 {
        self.makeup_db
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    pub fn sidechain_mode(&self) -> bool {
        self.use_sidechain
    }

    /// Largest smoothed gain reduction across channels, in dB (positive)
    pub fn gain_reduction_db(&self) -> f32 {
        self.reduction_db.iter().copied().fold(0.0, f32::max)
    }

    /// Process a single sample on one channel
    ///
    /// `sidechain` is only read in keyed mode.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32, sidechain: f32) -> f32 {
        if self.bypass {
            return input;
        }

        let key = if self.use_sidechain { sidechain } else { input };
        let x_g = linear_to_db_floored(key.abs(), SILENCE_FLOOR_DB);
        let y_g = static_curve(x_g, self.threshold_db, self.ratio, self.knee_db);
        let x_l = (x_g - y_g).max(0.0);
        let y_l = self.detector.process_sample(channel, x_l);
        self.reduction_db[channel] = y_l;

        input * db_to_linear(self.makeup_db - y_l)
    }

    /// Process a block in place
    ///
    /// `key` is the detector input in keyed mode; without one the block keys
    /// itself.
    ///
    /// # Panics
    /// Panics if `key` has a different shape than `buffer`, or if `buffer` has
    /// more channels than the compressor was prepared for.
    pub fn process_block(&mut self, buffer: &mut AudioBuffer, key: Option<&AudioBuffer>) {
        if self.bypass {
            return;
        }

        match key.filter(|_| self.use_sidechain) {
            Some(key) => {
                assert_eq!(key.channels(), buffer.channels(), "key channel count");
                assert_eq!(key.len(), buffer.len(), "key block length");
                for ch in 0..buffer.channels() {
                    let key = key.channel(ch);
                    for (sample, &k) in buffer.channel_mut(ch).iter_mut().zip(key.iter()) {
                        *sample = self.process_sample(ch, *sample, k);
                    }
                }
            }
            None => {
                let keyed = self.use_sidechain;
                self.use_sidechain = false;
                for ch in 0..buffer.channels() {
                    for sample in buffer.channel_mut(ch).iter_mut() {
                        *sample = self.process_sample(ch, *sample, 0.0);
                    }
                }
                self.use_sidechain = keyed;
            }
        }

        self.detector.snap_to_zero();
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}
