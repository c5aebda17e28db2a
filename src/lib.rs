//! Quadband - Four-Band Multiband Compressor
//!
//! Splits audio into four phase-coherent bands with a Linkwitz-Riley
//! crossover, saturates and compresses each band independently (optionally
//! keyed by an external sidechain), and recombines them with dry/wet blend
//! and solo control. With processing bypassed the bands sum to an allpass of
//! the input, which the built-in null reference cancels exactly.
//!
//! # Architecture
//!
//! - `params`: lock-free parameter store, snapshotted once per block
//! - `dsp`: envelope detector, compressor, saturator, oversampler, crossover
//! - `engine`: buffers, the block-processing engine and WAV I/O
//! - `preset`: JSON presets and engine configuration
//! - `cli`: offline renderer

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod params;
pub mod preset;

pub use engine::{AudioBuffer, MultibandEngine, ProcessSpec};
pub use error::{QuadbandError, Result};
pub use params::{ParameterSnapshot, SharedParameters, NUM_BANDS};
pub use preset::{EngineConfig, Preset};
