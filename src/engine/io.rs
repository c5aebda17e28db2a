//! WAV file I/O for offline rendering
//!
//! Reads 8/16/24/32-bit integer and 32-bit float WAV into an [`AudioBuffer`]
//! at the file's own sample rate. Writes 16/24-bit integer or 32-bit float.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::AudioBuffer;
use crate::error::{QuadbandError, Result};

/// Sample encoding of an exported file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    /// 16, 24 (integer) or 32 (float)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::float32()
    }
}

impl ExportFormat {
    pub fn new(bit_depth: u16) -> Self {
        Self { bit_depth }
    }

    /// 32-bit float, the format the renderer writes by default
    pub fn float32() -> Self {
        Self { bit_depth: 32 }
    }

    /// 16-bit integer
    pub fn cd_quality() -> Self {
        Self { bit_depth: 16 }
    }
}

/// Read a WAV file
///
/// # Errors
/// * `FileNotFound` - if the path does not exist
/// * `InvalidAudio` - if the file is not a readable WAV, has no channels, or
///   uses an unsupported integer bit depth
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(QuadbandError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| QuadbandError::InvalidAudio {
        reason: format!("failed to open {}: {}", path.display(), e),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(QuadbandError::InvalidAudio {
            reason: "file declares zero channels".to_string(),
        });
    }

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    AudioBuffer::from_interleaved(&samples, channels, spec.sample_rate)
}

/// Write a buffer to a WAV file at the buffer's sample rate
///
/// # Errors
/// `InvalidAudio` for an unsupported bit depth; `Wav`/`Io` if writing fails.
pub fn write_wav(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let sample_format = match format.bit_depth {
        16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => {
            return Err(QuadbandError::InvalidAudio {
                reason: format!("{}-bit export (only 16, 24, 32 supported)", other),
            })
        }
    };

    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let interleaved = buffer.to_interleaved();

    match format.bit_depth {
        16 => {
            for sample in interleaved {
                writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit is carried in an i32
                writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Mono sine tone at full scale times `amplitude`
pub fn generate_test_tone(
    frequency: f32,
    amplitude: f32,
    duration_secs: f32,
    sample_rate: u32,
) -> AudioBuffer {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let mut buffer = AudioBuffer::new(1, num_samples);
    buffer.sample_rate = sample_rate;

    let angular_freq = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    for (i, sample) in buffer.channel_mut(0).iter_mut().enumerate() {
        *sample = amplitude * (angular_freq * i as f32).sin();
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |e: hound::Error| QuadbandError::InvalidAudio {
        reason: format!("failed to read {}-bit samples: {}", bits_per_sample, e),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(invalid),
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(QuadbandError::InvalidAudio {
                        reason: format!("{}-bit integer audio", bits_per_sample),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 / scale) as f32))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(invalid)
        }
    }
}
