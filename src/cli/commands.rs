//! CLI Command Implementations
//!
//! Offline rendering feeds a file through the engine block by block, the way
//! a host would, then removes the engine's latency so the output lines up
//! with the input.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::dsp::OversamplingFactor;
use crate::engine::{read_wav, write_wav, AudioBuffer, ExportFormat, MultibandEngine};
use crate::error::{QuadbandError, Result};
use crate::params::SharedParameters;
use crate::preset::{EngineConfig, Preset};

/// Run a whole buffer through a freshly prepared engine
///
/// The result has the input's length and channel count. The sidechain, if
/// given, must share the input's sample rate; it is zero-padded or truncated
/// to the input's length and enables external keying.
pub fn render_buffer(
    input: &AudioBuffer,
    sidechain: Option<&AudioBuffer>,
    preset: &Preset,
    config: &EngineConfig,
) -> Result<AudioBuffer> {
    if let Some(sc) = sidechain {
        if sc.sample_rate != input.sample_rate {
            return Err(QuadbandError::SampleRateMismatch {
                main: input.sample_rate,
                sidechain: sc.sample_rate,
            });
        }
    }

    let params = Arc::new(SharedParameters::new());
    preset.apply(&params);
    if sidechain.is_some() {
        params.set_external_sidechain(true);
    }

    let mut engine = MultibandEngine::with_oversampling(Arc::clone(&params), config.oversampling);
    engine.prepare(input.sample_rate as f64, config.block_size, input.channels())?;
    let latency = engine.latency_samples();

    let channels = input.channels();
    let total = input.len() + latency;
    let mut output = AudioBuffer::new(channels, input.len());
    output.sample_rate = input.sample_rate;

    let mut block = AudioBuffer::new(channels, config.block_size);
    let sc_channels = sidechain.map_or(0, AudioBuffer::channels);
    let mut sc_block = AudioBuffer::new(sc_channels.max(1), config.block_size);

    let mut start = 0;
    while start < total {
        let len = config.block_size.min(total - start);
        block.set_len(len);
        fill_block(&mut block, input, start);

        if let Some(sc) = sidechain {
            sc_block.set_len(len);
            fill_block(&mut sc_block, sc, start);
            engine.process_block(&mut block, Some(&sc_block));
        } else {
            engine.process_block(&mut block, None);
        }

        // Drop the first `latency` output samples
        for i in 0..len {
            let pos = start + i;
            if pos >= latency {
                for ch in 0..channels {
                    output.channel_mut(ch)[pos - latency] = block.channel(ch)[i];
                }
            }
        }
        start += len;
    }

    debug!(
        samples = input.len(),
        latency,
        block_size = config.block_size,
        "rendered buffer"
    );
    Ok(output)
}

/// Copy `src[start..start + block.len()]` into `block`, zero past the end
fn fill_block(block: &mut AudioBuffer, src: &AudioBuffer, start: usize) {
    let len = block.len();
    for ch in 0..block.channels() {
        let dst = block.channel_mut(ch);
        dst.fill(0.0);
        if ch < src.channels() && start < src.len() {
            let end = (start + len).min(src.len());
            dst[..end - start].copy_from_slice(&src.channel(ch)[start..end]);
        }
    }
}

/// Render a WAV file to a 32-bit float WAV file
pub fn render(
    input: &Path,
    output: &Path,
    preset: Option<&Path>,
    sidechain: Option<&Path>,
    block_size: usize,
    oversampling: usize,
) -> Result<()> {
    let config = EngineConfig {
        oversampling: OversamplingFactor::from_factor(oversampling)?,
        block_size,
    };
    let preset = match preset {
        Some(path) => Preset::load(path)?,
        None => Preset::default(),
    };

    info!("Rendering {} with preset '{}'", input.display(), preset.name);
    let audio = read_wav(input)?;
    let key = sidechain.map(read_wav).transpose()?;

    let rendered = render_buffer(&audio, key.as_ref(), &preset, &config)?;
    write_wav(&rendered, output, ExportFormat::float32())?;

    println!(
        "Rendered {} -> {} ({:.2}s, peak {:.1} dBFS)",
        input.display(),
        output.display(),
        rendered.duration_secs(),
        rendered.peak_db()
    );
    Ok(())
}

/// Peak level of bands plus inverted reference, in dBFS
///
/// Without a preset the engine runs fully dry, which measures the crossover
/// itself; a preset's processing shows up as a larger residual.
pub fn null_test_residual(input: &AudioBuffer, preset: Option<Preset>, block_size: usize) -> Result<f32> {
    let mut preset = preset.unwrap_or_else(|| {
        let mut dry = Preset::default();
        dry.name = "Dry".to_string();
        dry.snapshot.global.mix = 0.0;
        dry
    });
    preset.snapshot.global.null_test = true;

    let config = EngineConfig {
        oversampling: OversamplingFactor::default(),
        block_size,
    };
    let residual = render_buffer(input, None, &preset, &config)?;
    Ok(residual.peak_db())
}

/// Print the null-test residual of a WAV file
pub fn null_test(input: &Path, preset: Option<&Path>, block_size: usize) -> Result<()> {
    let preset = preset.map(Preset::load).transpose()?;
    let audio = read_wav(input)?;
    let residual = null_test_residual(&audio, preset, block_size)?;
    println!("Null test residual: {:.1} dBFS", residual);
    Ok(())
}

/// Print the default preset
pub fn print_preset() -> Result<()> {
    println!("{}", Preset::default().to_json()?);
    Ok(())
}
