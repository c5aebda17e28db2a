//! Polyphase-free half-band oversampler
//!
//! Each 2× stage zero-stuffs and low-passes on the way up, then low-passes
//! and decimates on the way down, with the same 33-tap Kaiser-windowed
//! half-band FIR. Stages cascade for 4× and 8×. The round trip is a pure
//! integer delay at the native rate, reported by [`Oversampler::latency`].

use crate::engine::{AudioBuffer, ProcessSpec};
use crate::error::{QuadbandError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Length of the half-band FIR
const TAPS: usize = 33;

/// Group delay of one FIR, in samples at its own rate
const GROUP_DELAY: usize = (TAPS - 1) / 2;

/// Kaiser window shape: about 80 dB of image rejection
const KAISER_BETA: f64 = 8.0;

/// Oversampling ratio of the saturator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum OversamplingFactor {
    /// Shape at the native rate
    X1,
    #[default]
    X2,
    X4,
    X8,
}

impl OversamplingFactor {
    /// Number of cascaded 2× stages
    pub fn stages(&self) -> usize {
        match self {
            OversamplingFactor::X1 => 0,
            OversamplingFactor::X2 => 1,
            OversamplingFactor::X4 => 2,
            OversamplingFactor::X8 => 3,
        }
    }

    /// Rate multiplier
    pub fn factor(&self) -> usize {
        1 << self.stages()
    }

    /// Parse a multiplier of 1, 2, 4 or 8
    pub fn from_factor(factor: usize) -> Result<Self> {
        match factor {
            1 => Ok(OversamplingFactor::X1),
            2 => Ok(OversamplingFactor::X2),
            4 => Ok(OversamplingFactor::X4),
            8 => Ok(OversamplingFactor::X8),
            _ => Err(QuadbandError::UnsupportedOversampling { factor }),
        }
    }
}

impl TryFrom<usize> for OversamplingFactor {
    type Error = QuadbandError;

    fn try_from(factor: usize) -> Result<Self> {
        Self::from_factor(factor)
    }
}

impl From<OversamplingFactor> for usize {
    fn from(factor: OversamplingFactor) -> usize {
        factor.factor()
    }
}

// ============================================================================
// Filter Design
// ============================================================================

/// Zeroth-order modified Bessel function of the first kind
fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let y = (x / 3.75).powi(2);
        1.0 + y
            * (3.5156229
                + y * (3.0899424 + y * (1.2067492 + y * (0.2659732 + y * (0.0360768 + y * 0.0045813)))))
    } else {
        let y = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + y * (0.01328592
                    + y * (0.00225319
                        + y * (-0.00157565
                            + y * (0.00916281
                                + y * (-0.02057706
                                    + y * (0.02635537 + y * (-0.01647633 + y * 0.00392377))))))))
    }
}

/// Kaiser-windowed sinc low-pass at a quarter of the sample rate, unity DC gain
fn design_half_band() -> [f32; TAPS] {
    let mut coeffs = [0.0_f64; TAPS];
    let norm = bessel_i0(KAISER_BETA);

    for (i, c) in coeffs.iter_mut().enumerate() {
        let n = i as f64 - GROUP_DELAY as f64;
        let sinc = if n == 0.0 {
            0.5
        } else {
            (0.5 * PI * n).sin() / (PI * n)
        };
        let ratio = n / GROUP_DELAY as f64;
        let window = bessel_i0(KAISER_BETA * (1.0 - ratio * ratio).max(0.0).sqrt()) / norm;
        *c = sinc * window;
    }

    let sum: f64 = coeffs.iter().sum();
    let mut out = [0.0_f32; TAPS];
    for (o, c) in out.iter_mut().zip(coeffs.iter()) {
        *o = (c / sum) as f32;
    }
    out
}

// ============================================================================
// FIR State
// ============================================================================

/// Delay line for one channel of one FIR
///
/// Samples are written twice so the most recent `TAPS` values are always
/// contiguous.
#[derive(Debug, Clone)]
struct FirHistory {
    buffer: [f32; 2 * TAPS],
    pos: usize,
}

impl FirHistory {
    fn new() -> Self {
        Self {
            buffer: [0.0; 2 * TAPS],
            pos: 0,
        }
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }

    #[inline]
    fn push(&mut self, x: f32) {
        self.buffer[self.pos] = x;
        self.buffer[self.pos + TAPS] = x;
        self.pos = (self.pos + 1) % TAPS;
    }

    /// Push a sample and return the filter output
    ///
    /// The kernel is symmetric, so window order does not matter.
    #[inline]
    fn filter(&mut self, x: f32, coeffs: &[f32; TAPS]) -> f32 {
        self.push(x);
        self.buffer[self.pos..self.pos + TAPS]
            .iter()
            .zip(coeffs.iter())
            .map(|(s, c)| s * c)
            .sum()
    }
}

#[derive(Debug, Clone)]
struct Stage {
    up: Vec<FirHistory>,
    down: Vec<FirHistory>,
}

impl Stage {
    fn new(channels: usize) -> Self {
        Self {
            up: vec![FirHistory::new(); channels],
            down: vec![FirHistory::new(); channels],
        }
    }

    fn reset(&mut self) {
        self.up.iter_mut().for_each(FirHistory::reset);
        self.down.iter_mut().for_each(FirHistory::reset);
    }

    /// Zero-stuff `src` into `dst` at twice the length and interpolate
    fn upsample(&mut self, src: &AudioBuffer, dst: &mut AudioBuffer, coeffs: &[f32; TAPS]) {
        dst.set_len(src.len() * 2);
        for ch in 0..src.channels() {
            let fir = &mut self.up[ch];
            let out = dst.channel_mut(ch);
            for (i, &x) in src.channel(ch).iter().enumerate() {
                out[2 * i] = 2.0 * fir.filter(x, coeffs);
                out[2 * i + 1] = 2.0 * fir.filter(0.0, coeffs);
            }
        }
    }

    /// Band-limit `src` and keep every other sample into `dst`
    fn downsample(&mut self, src: &AudioBuffer, dst: &mut AudioBuffer, coeffs: &[f32; TAPS]) {
        let n = src.len() / 2;
        dst.set_len(n);
        for ch in 0..src.channels() {
            let fir = &mut self.down[ch];
            let input = src.channel(ch);
            let out = dst.channel_mut(ch);
            for i in 0..n {
                out[i] = fir.filter(input[2 * i], coeffs);
                fir.push(input[2 * i + 1]);
            }
        }
    }
}

// ============================================================================
// Oversampler
// ============================================================================

/// Cascade of 2× up/down stages with preallocated intermediate buffers
#[derive(Debug, Clone)]
pub struct Oversampler {
    factor: OversamplingFactor,
    coeffs: [f32; TAPS],
    stages: Vec<Stage>,
    /// `buffers[s]` holds the signal at `2^(s+1)` times the native rate
    buffers: Vec<AudioBuffer>,
}

impl Oversampler {
    pub fn new(factor: OversamplingFactor) -> Self {
        Self {
            factor,
            coeffs: design_half_band(),
            stages: Vec::new(),
            buffers: Vec::new(),
        }
    }

    pub fn factor(&self) -> OversamplingFactor {
        self.factor
    }

    /// Allocate filter state and buffers for the block size and channel count in `spec`
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        let stages = self.factor.stages();
        self.stages = (0..stages).map(|_| Stage::new(spec.num_channels)).collect();
        self.buffers = (0..stages)
            .map(|s| AudioBuffer::new(spec.num_channels, spec.max_block_size << (s + 1)))
            .collect();
    }

    pub fn reset(&mut self) {
        self.stages.iter_mut().for_each(Stage::reset);
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }

    /// Round-trip delay in native samples
    pub fn latency(&self) -> usize {
        // Each stage adds one group delay on the way up and one on the way down,
        // at its own rate.
        (1..=self.factor.stages())
            .map(|s| 2 * GROUP_DELAY >> s)
            .sum()
    }

    /// Upsample `input` through every stage
    ///
    /// Returns the buffer at the highest rate, to be processed in place and
    /// handed back through [`Oversampler::process_down`]. Must not be called
    /// with a factor of 1.
    pub fn process_up(&mut self, input: &AudioBuffer) -> &mut AudioBuffer {
        let coeffs = self.coeffs;
        for s in 0..self.stages.len() {
            let (lower, upper) = self.buffers.split_at_mut(s);
            let src = if s == 0 { input } else { &lower[s - 1] };
            self.stages[s].upsample(src, &mut upper[0], &coeffs);
        }
        let top = self.buffers.len() - 1;
        &mut self.buffers[top]
    }

    /// Downsample the highest-rate buffer back through every stage into `output`
    pub fn process_down(&mut self, output: &mut AudioBuffer) {
        let coeffs = self.coeffs;
        for s in (0..self.stages.len()).rev() {
            let (lower, upper) = self.buffers.split_at_mut(s);
            if s == 0 {
                self.stages[s].downsample(&upper[0], output, &coeffs);
            } else {
                self.stages[s].downsample(&upper[0], &mut lower[s - 1], &coeffs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn prepared(factor: OversamplingFactor, block: usize) -> Oversampler {
        let mut os = Oversampler::new(factor);
        os.prepare(&ProcessSpec::new(48000.0, block, 1).unwrap());
        os
    }

    fn round_trip(os: &mut Oversampler, input: &AudioBuffer) -> AudioBuffer {
        let mut output = AudioBuffer::new(input.channels(), input.len());
        os.process_up(input);
        os.process_down(&mut output);
        output
    }

    #[test]
    fn test_kernel_is_half_band() {
        let h = design_half_band();
        assert_relative_eq!(h.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        for k in (2..=GROUP_DELAY).step_by(2) {
            assert!(h[GROUP_DELAY + k].abs() < 1e-9);
        }
        for i in 0..TAPS {
            assert_relative_eq!(h[i], h[TAPS - 1 - i]);
        }
    }

    #[test_case(OversamplingFactor::X1, 0)]
    #[test_case(OversamplingFactor::X2, 16)]
    #[test_case(OversamplingFactor::X4, 24)]
    #[test_case(OversamplingFactor::X8, 28)]
    fn test_latency(factor: OversamplingFactor, expected: usize) {
        assert_eq!(Oversampler::new(factor).latency(), expected);
    }

    #[test_case(OversamplingFactor::X2)]
    #[test_case(OversamplingFactor::X4)]
    #[test_case(OversamplingFactor::X8)]
    fn test_round_trip_is_pure_delay(factor: OversamplingFactor) {
        let block = 256;
        let mut os = prepared(factor, block);
        let latency = os.latency();

        let signal: Vec<f32> = (0..block * 4)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 500.0 * i as f32 / 48000.0).sin())
            .collect();

        let mut out = Vec::new();
        for chunk in signal.chunks(block) {
            let input = AudioBuffer::from_channels(vec![chunk.to_vec()], 48000).unwrap();
            out.extend_from_slice(round_trip(&mut os, &input).channel(0));
        }

        for i in block..signal.len() {
            assert!(
                (out[i] - signal[i - latency]).abs() < 2e-3,
                "sample {}: {} vs {}",
                i,
                out[i],
                signal[i - latency]
            );
        }
    }

    #[test]
    fn test_reset_clears_history() {
        let mut os = prepared(OversamplingFactor::X4, 64);
        let loud = AudioBuffer::from_channels(vec![vec![1.0; 64]], 48000).unwrap();
        round_trip(&mut os, &loud);
        os.reset();
        let silent = AudioBuffer::new(1, 64);
        let out = round_trip(&mut os, &silent);
        assert!(out.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_factor_parsing() {
        assert_eq!(OversamplingFactor::from_factor(8).unwrap(), OversamplingFactor::X8);
        assert!(OversamplingFactor::from_factor(3).is_err());
        let json = serde_json::to_string(&OversamplingFactor::X4).unwrap();
        assert_eq!(json, "4");
        assert!(serde_json::from_str::<OversamplingFactor>("6").is_err());
    }
}
