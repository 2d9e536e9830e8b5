//! Layerpool CLI - sentence embeddings from BERT hidden states.
//!
//! # Usage
//!
//! ```bash
//! # Embed the default sentence with the second-to-last layer
//! layerpool
//!
//! # Concatenate the last four layers for your own text
//! layerpool "after stealing money from the bank vault" --strategy concat:4
//!
//! # Machine-readable report, CPU only, custom output file
//! layerpool "query" --json --cpu --output embedding.safetensors
//!
//! # Show help
//! layerpool --help
//! ```

mod config;
mod embed;
mod output;

use anyhow::Result;
use clap::Parser;
use layerpool_core::config::DEFAULT_TEXT;
use layerpool_core::device::DevicePreference;
use layerpool_core::pooling::PoolingStrategy;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Layerpool sentence embedding CLI.
///
/// Runs one text through a pretrained BERT, mean-pools its hidden states
/// into a sentence vector and saves it as safetensors.
#[derive(Parser)]
#[command(name = "layerpool", version, about)]
struct Cli {
    /// Text to embed
    #[arg(default_value = DEFAULT_TEXT)]
    text: String,

    /// Directory with config.json, tokenizer.json and model.safetensors
    /// (default: $LAYERPOOL_MODEL_DIR, then bundled assets)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Pooling strategy: layer:N, concat:N or sum:N
    #[arg(short, long, default_value = "layer:-2")]
    strategy: PoolingStrategy,

    /// Scale the sentence vector to unit length
    #[arg(long)]
    normalize: bool,

    /// Run on the CPU even if an accelerator is available
    #[arg(long)]
    cpu: bool,

    /// Output file (default: platform data directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = embed::EmbedOptions {
        text: cli.text,
        model_dir: cli.model_dir,
        strategy: cli.strategy,
        normalize: cli.normalize,
        device: if cli.cpu {
            DevicePreference::Cpu
        } else {
            DevicePreference::Auto
        },
        output: cli.output,
    };

    let report = embed::execute_embed(&options).await?;

    let output = if cli.json {
        output::format_json(&report)
    } else {
        output::format_human(&report)
    };
    println!("{}", output);

    Ok(())
}
