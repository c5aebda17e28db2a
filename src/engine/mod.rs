//! Audio Engine Module
//!
//! - Audio buffers and the processing spec
//! - The multiband engine
//! - WAV file I/O for offline rendering

pub mod buffer;
pub mod io;
pub mod multiband;

pub use buffer::{AudioBuffer, ProcessSpec};
pub use io::{generate_test_tone, read_wav, write_wav, ExportFormat};
pub use multiband::MultibandEngine;
