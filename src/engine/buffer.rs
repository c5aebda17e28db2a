//! Audio Buffer Management
//!
//! Provides the non-interleaved buffer type shared by every processing stage,
//! the `ProcessSpec` handed to `prepare`, and level conversion helpers.

use crate::error::{QuadbandError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Level below which signals are treated as silence by the gain computer
pub const SILENCE_FLOOR_DB: f32 = -100.0;

/// Default sample rate used when a buffer is created without one
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude (0.0 to 1.0+ range)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// # Returns
/// Value in decibels. Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Convert linear amplitude to decibels, never going below `floor_db`
///
/// Zero, negative and subnormal magnitudes all land on the floor instead of
/// producing `-inf` or `NaN`.
#[inline]
pub fn linear_to_db_floored(linear: f32, floor_db: f32) -> f32 {
    if linear > 0.0 {
        (20.0 * linear.log10()).max(floor_db)
    } else {
        floor_db
    }
}

/// Calculate the RMS level of a slice in dB
///
/// Returns -f32::INFINITY for empty or silent input.
pub fn calculate_rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }
    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    linear_to_db((sum_squares / samples.len() as f64).sqrt() as f32)
}

/// Calculate the peak level of a slice in dB
pub fn calculate_peak_db(samples: &[f32]) -> f32 {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max);
    linear_to_db(peak)
}

// ============================================================================
// Process Spec
// ============================================================================

/// Shape of the audio stream a processor is prepared for
///
/// Every stateful component is prepared with the same spec. Changing any field
/// requires a new `prepare` call, which is the only place buffers are allocated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Largest block `process_block` will ever receive
    pub max_block_size: usize,
    /// Number of channels in the main bus
    pub num_channels: usize,
}

impl ProcessSpec {
    /// Create a validated spec
    ///
    /// # Errors
    /// `InvalidSpec` if any field is zero, negative or not finite.
    pub fn new(sample_rate: f64, max_block_size: usize, num_channels: usize) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(QuadbandError::InvalidSpec {
                reason: format!("sample rate must be positive, got {}", sample_rate),
            });
        }
        if max_block_size == 0 {
            return Err(QuadbandError::InvalidSpec {
                reason: "maximum block size must be positive".to_string(),
            });
        }
        if num_channels == 0 {
            return Err(QuadbandError::InvalidSpec {
                reason: "channel count must be positive".to_string(),
            });
        }
        Ok(Self {
            sample_rate,
            max_block_size,
            num_channels,
        })
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Core audio buffer type for all processing in Quadband
///
/// Stores audio as non-interleaved 32-bit floating point samples, one
/// `Vec<f32>` per channel. Buffers used on the audio thread are created at
/// their maximum size during `prepare`; `set_len` then shrinks or regrows them
/// within that capacity without touching the allocator.
///
/// # Example
/// ```
/// use quadband::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::new(2, 48000);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    ///
    /// # Arguments
    /// * `num_channels` - Number of channels
    /// * `num_samples` - Number of samples per channel
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// `InvalidAudio` if the channels have different lengths.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = samples.first() {
            let len = first.len();
            if samples.iter().any(|ch| ch.len() != len) {
                return Err(QuadbandError::InvalidAudio {
                    reason: "all channels must have the same length".to_string(),
                });
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Errors
    /// `InvalidAudio` if the data length is not a multiple of `num_channels`.
    pub fn from_interleaved(
        interleaved: &[f32],
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 {
            return Err(QuadbandError::InvalidAudio {
                reason: "channel count must be positive".to_string(),
            });
        }
        if interleaved.len() % num_channels != 0 {
            return Err(QuadbandError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }
        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest per-channel capacity, i.e. the longest length `set_len` can
    /// reach without reallocating
    pub fn capacity(&self) -> usize {
        self.samples
            .iter()
            .map(|ch| ch.capacity())
            .min()
            .unwrap_or(0)
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Iterate over the channels
    pub fn iter_channels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(|ch| ch.as_slice())
    }

    /// Iterate mutably over the channels
    pub fn iter_channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.samples.iter_mut().map(|ch| ch.as_mut_slice())
    }

    /// Get a sample, or None if indices are out of bounds
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(index).copied())
    }

    /// Set a sample; returns false if indices are out of bounds
    #[inline]
    pub fn set_sample(&mut self, channel: usize, index: usize, value: f32) -> bool {
        if let Some(sample) = self.samples.get_mut(channel).and_then(|ch| ch.get_mut(index)) {
            *sample = value;
            return true;
        }
        false
    }

    /// Change the number of samples per channel, zero-filling any growth
    ///
    /// Does not allocate as long as `num_samples <= capacity()`.
    pub fn set_len(&mut self, num_samples: usize) {
        for channel in &mut self.samples {
            channel.resize(num_samples, 0.0);
        }
    }

    /// Set every sample to zero
    pub fn clear(&mut self) {
        for channel in &mut self.samples {
            channel.fill(0.0);
        }
    }

    /// Copy another buffer's samples into this one, matching its length
    ///
    /// # Panics
    /// Panics if the channel counts differ.
    pub fn copy_from(&mut self, other: &AudioBuffer) {
        assert_eq!(
            self.channels(),
            other.channels(),
            "copy_from requires matching channel counts"
        );
        self.set_len(other.len());
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            dst.copy_from_slice(src);
        }
    }

    /// Add `gain * other` into this buffer, sample by sample
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub fn add_scaled_from(&mut self, other: &AudioBuffer, gain: f32) {
        assert_eq!(self.channels(), other.channels());
        assert_eq!(self.len(), other.len());
        for (dst, src) in self.samples.iter_mut().zip(other.samples.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += gain * s;
            }
        }
    }

    /// Multiply every sample by a linear gain
    pub fn apply_gain_linear(&mut self, gain: f32) {
        if (gain - 1.0).abs() < f32::EPSILON {
            return;
        }
        for channel in &mut self.samples {
            for sample in channel.iter_mut() {
                *sample *= gain;
            }
        }
    }

    /// Apply gain in decibels to all samples
    pub fn apply_gain(&mut self, gain_db: f32) {
        self.apply_gain_linear(db_to_linear(gain_db));
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }

    /// Peak level across all channels in dB
    pub fn peak_db(&self) -> f32 {
        self.samples
            .iter()
            .map(|ch| calculate_peak_db(ch))
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// RMS level of one channel in dB
    pub fn rms_db(&self, channel: usize) -> f32 {
        calculate_rms_db(self.channel(channel))
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(2, 0)
    }
}

// ============================================================================
// Tests
// ============================================================================
