//! Saturation
//!
//! Drive-dependent odd-symmetric waveshaping, run inside an [`Oversampler`]
//! so the added harmonics alias less.

use super::oversampling::{Oversampler, OversamplingFactor};
use crate::engine::{AudioBuffer, ProcessSpec};
use crate::params::DRIVE;

// ============================================================================
// Constants
// ============================================================================

/// Number of points in a [`TransferCurve`] table
pub const CURVE_POINTS: usize = 1024;

// ============================================================================
// Transfer Curve
// ============================================================================

/// Tabulated magnitude response for the drawn-curve shaper
///
/// The table maps `|x|` in `[0, 2)` (after drive) onto `[0, 1]`; the sign of the
/// input is reapplied to the output, so the shaper is odd-symmetric and
/// bounded regardless of the table contents.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferCurve {
    table: Vec<f32>,
}

impl TransferCurve {
    /// Straight ramp from 0 to just below 1
    pub fn linear() -> Self {
        Self::from_fn(|x| x)
    }

    /// Sample `f` on `[0, 1)`; outputs are clamped to `[0, 1]`
    pub fn from_fn(f: impl Fn(f32) -> f32) -> Self {
        let table = (0..CURVE_POINTS)
            .map(|i| {
                let y = f(i as f32 / CURVE_POINTS as f32);
                if y.is_nan() {
                    0.0
                } else {
                    y.clamp(0.0, 1.0)
                }
            })
            .collect();
        Self { table }
    }

    /// Piecewise-linear curve through `(x, y)` breakpoints
    ///
    /// Points are sorted by `x`; the curve is held flat before the first point
    /// and after the last. An empty slice gives the linear ramp.
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        if points.is_empty() {
            return Self::linear();
        }
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self::from_fn(|x| {
            let first = sorted[0];
            let last = sorted[sorted.len() - 1];
            if x <= first.0 {
                return first.1;
            }
            if x >= last.0 {
                return last.1;
            }
            for pair in sorted.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                if x >= x0 && x <= x1 {
                    if x1 - x0 <= f32::EPSILON {
                        return y1;
                    }
                    return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
                }
            }
            last.1
        })
    }

    /// Table contents
    pub fn values(&self) -> &[f32] {
        &self.table
    }

    /// Shape an already-driven sample
    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        let scaled = x * 0.5;
        let index = ((scaled.abs() * CURVE_POINTS as f32) as usize).min(CURVE_POINTS - 1);
        let y = self.table[index];
        if scaled > 0.0 {
            y
        } else if scaled < 0.0 {
            -y
        } else {
            0.0
        }
    }
}

impl Default for TransferCurve {
    fn default() -> Self {
        Self::linear()
    }
}

/// Waveshaping function of a [`Saturator`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ShapingCurve {
    /// `tanh(x * drive)`
    #[default]
    Tanh,
    /// Table lookup at `|x * drive| / 2`
    Transfer(TransferCurve),
}

impl ShapingCurve {
    #[inline]
    pub fn shape(&self, x: f32, drive: f32) -> f32 {
        match self {
            ShapingCurve::Tanh => (x * drive).tanh(),
            ShapingCurve::Transfer(curve) => curve.apply(x * drive),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ShapingCurve::Tanh => "Tanh",
            ShapingCurve::Transfer(_) => "Transfer Curve",
        }
    }
}

// ============================================================================
// Saturator
// ============================================================================

/// Oversampled waveshaper
#[derive(Debug, Clone)]
pub struct Saturator {
    drive: f32,
    curve: ShapingCurve,
    oversampler: Oversampler,
}

impl Saturator {
    /// Create a tanh saturator at the given oversampling factor
    pub fn new(factor: OversamplingFactor) -> Self {
        Self {
            drive: DRIVE.default,
            curve: ShapingCurve::Tanh,
            oversampler: Oversampler::new(factor),
        }
    }

    /// Allocate oversampling buffers; the factor is fixed until the next prepare
    pub fn prepare(&mut self, spec: &ProcessSpec, factor: OversamplingFactor) {
        if self.oversampler.factor() != factor {
            self.oversampler = Oversampler::new(factor);
        }
        self.oversampler.prepare(spec);
    }

    pub fn reset(&mut self) {
        self.oversampler.reset();
    }

    /// Set the drive, clamped to 1..10
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = DRIVE.clamp(drive);
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn set_curve(&mut self, curve: ShapingCurve) {
        self.curve = curve;
    }

    pub fn curve(&self) -> &ShapingCurve {
        &self.curve
    }

    pub fn oversampling(&self) -> OversamplingFactor {
        self.oversampler.factor()
    }

    /// Delay added by the oversampler, in native samples
    pub fn latency(&self) -> usize {
        self.oversampler.latency()
    }

    /// Shape a single sample at the native rate
    #[inline]
    pub fn process_sample(&self, x: f32) -> f32 {
        self.curve.shape(x, self.drive)
    }

    /// Upsample, shape and downsample a block in place
    pub fn process_block(&mut self, buffer: &mut AudioBuffer) {
        let drive = self.drive;
        let curve = &self.curve;

        if self.oversampler.factor() == OversamplingFactor::X1 {
            shape_buffer(buffer, curve, drive);
            return;
        }

        let upsampled = self.oversampler.process_up(buffer);
        shape_buffer(upsampled, curve, drive);
        self.oversampler.process_down(buffer);
    }
}

impl Default for Saturator {
    fn default() -> Self {
        Self::new(OversamplingFactor::default())
    }
}

fn shape_buffer(buffer: &mut AudioBuffer, curve: &ShapingCurve, drive: f32) {
    for channel in buffer.iter_channels_mut() {
        for sample in channel.iter_mut() {
            *sample = curve.shape(*sample, drive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test_case(1.0)]
    #[test_case(4.5)]
    #[test_case(10.0)]
    fn test_tanh_is_bounded_and_odd(drive: f32) {
        let curve = ShapingCurve::Tanh;
        for i in -100..=100 {
            let x = i as f32 / 100.0;
            let y = curve.shape(x, drive);
            assert!(y.abs() <= 1.0);
            assert_relative_eq!(curve.shape(-x, drive), -y);
        }
    }

    #[test]
    fn test_transfer_curve_lookup() {
        let curve = TransferCurve::linear();
        assert_eq!(curve.apply(0.0), 0.0);
        // 0.5 lands halfway through the first half of the table
        assert_relative_eq!(curve.apply(0.5), 0.25, epsilon = 1e-3);
        assert_relative_eq!(curve.apply(-0.5), -0.25, epsilon = 1e-3);
        // Saturates at the last entry
        assert_relative_eq!(curve.apply(5.0), 1023.0 / 1024.0);
    }

    #[test]
    fn test_transfer_curve_from_points() {
        let curve = TransferCurve::from_points(&[(1.0, 1.0), (0.0, 0.0), (0.25, 0.75)]);
        assert_relative_eq!(curve.values()[256], 0.75, epsilon = 1e-3);
        assert_relative_eq!(curve.values()[128], 0.375, epsilon = 1e-3);
        assert!(curve.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_transfer_curve_clamps_table() {
        let curve = TransferCurve::from_fn(|x| 3.0 * x - 1.0);
        assert_eq!(curve.values()[0], 0.0);
        assert_eq!(curve.values()[CURVE_POINTS - 1], 1.0);
    }

    #[test]
    fn test_drive_clamped() {
        let mut sat = Saturator::new(OversamplingFactor::X1);
        sat.set_drive(0.1);
        assert_eq!(sat.drive(), 1.0);
        sat.set_drive(100.0);
        assert_eq!(sat.drive(), 10.0);
    }

    #[test]
    fn test_native_rate_block_matches_sample() {
        let mut sat = Saturator::new(OversamplingFactor::X1);
        sat.prepare(&ProcessSpec::new(48000.0, 8, 1).unwrap(), OversamplingFactor::X1);
        sat.set_drive(3.0);
        let input = vec![-1.0, -0.5, -0.1, 0.0, 0.1, 0.5, 1.0, 0.25];
        let mut buffer = AudioBuffer::from_channels(vec![input.clone()], 48000).unwrap();
        sat.process_block(&mut buffer);
        for (out, x) in buffer.channel(0).iter().zip(input) {
            assert_relative_eq!(*out, (3.0 * x).tanh());
        }
        assert_eq!(sat.latency(), 0);
    }

    #[test]
    fn test_oversampled_output_is_delayed_and_bounded() {
        let mut sat = Saturator::new(OversamplingFactor::X4);
        sat.prepare(&ProcessSpec::new(48000.0, 512, 2).unwrap(), OversamplingFactor::X4);
        sat.set_drive(10.0);
        assert_eq!(sat.latency(), 24);

        let tone: Vec<f32> = (0..512)
            .map(|i| (2.0 * std::f32::consts::PI * 100.0 * i as f32 / 48000.0).sin())
            .collect();
        let mut buffer = AudioBuffer::from_channels(vec![tone.clone(), tone], 48000).unwrap();
        sat.process_block(&mut buffer);

        assert!(buffer.is_finite());
        // Filter overshoot on the clipped waveform stays small
        assert!(buffer.peak_db() < 1.5);
        assert_eq!(buffer.channel(0)[0], 0.0);
    }

    #[test]
    fn test_prepare_switches_factor() {
        let mut sat = Saturator::default();
        assert_eq!(sat.oversampling(), OversamplingFactor::X2);
        sat.prepare(&ProcessSpec::new(44100.0, 64, 1).unwrap(), OversamplingFactor::X8);
        assert_eq!(sat.oversampling(), OversamplingFactor::X8);
        assert_eq!(sat.latency(), 28);
    }
}
