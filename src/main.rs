//! Quadband CLI - offline multiband compressor renderer

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quadband::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Quadband v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Render {
            input,
            output,
            preset,
            sidechain,
            block_size,
            oversampling,
        } => commands::render(
            &input,
            &output,
            preset.as_deref(),
            sidechain.as_deref(),
            block_size,
            oversampling,
        )
        .with_context(|| format!("failed to render {}", input.display())),
        Commands::NullTest {
            input,
            preset,
            block_size,
        } => commands::null_test(&input, preset.as_deref(), block_size)
            .with_context(|| format!("null test failed for {}", input.display())),
        Commands::PrintPreset => commands::print_preset().context("failed to print preset"),
    }
}
