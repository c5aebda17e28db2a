//! CLI Module
//!
//! Command-line interface for offline rendering through the multiband engine.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::preset::DEFAULT_BLOCK_SIZE;

/// Quadband - four-band multiband compressor, offline renderer
#[derive(Parser, Debug)]
#[command(name = "quadband-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a WAV file through the engine
    #[command(name = "render")]
    Render {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file (32-bit float)
        output: PathBuf,

        /// Preset JSON file (defaults apply without one)
        #[arg(short, long)]
        preset: Option<PathBuf>,

        /// External sidechain WAV file; enables external keying
        #[arg(short, long)]
        sidechain: Option<PathBuf>,

        /// Host block size in samples
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Saturator oversampling factor: 1, 2, 4 or 8
        #[arg(short, long, default_value_t = 2)]
        oversampling: usize,
    },

    /// Measure the residual of the bands against the inverted allpass reference
    #[command(name = "null-test")]
    NullTest {
        /// Input WAV file
        input: PathBuf,

        /// Preset JSON file (defaults to fully dry)
        #[arg(short, long)]
        preset: Option<PathBuf>,

        /// Host block size in samples
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },

    /// Print the default preset as JSON
    #[command(name = "print-preset")]
    PrintPreset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::parse_from([
            "quadband-cli",
            "render",
            "in.wav",
            "out.wav",
            "--sidechain",
            "key.wav",
            "-o",
            "4",
        ]);
        match cli.command {
            Commands::Render {
                input,
                sidechain,
                oversampling,
                block_size,
                ..
            } => {
                assert_eq!(input, PathBuf::from("in.wav"));
                assert_eq!(sidechain, Some(PathBuf::from("key.wav")));
                assert_eq!(oversampling, 4);
                assert_eq!(block_size, DEFAULT_BLOCK_SIZE);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_verbose_global() {
        let cli = Cli::parse_from(["quadband-cli", "print-preset", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::PrintPreset));
    }
}
