// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "barscan")]
#[command(about = "Live barcode acquisition for inventory tracking")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Scan a barcode with the camera (Ctrl-C cancels)
    Scan {
        /// Camera device path to use (from 'barscan list')
        #[arg(short, long)]
        camera: Option<String>,

        /// Restrict decoding to a centered window of the frame
        #[arg(long)]
        center: bool,
    },

    /// Enter a barcode value manually
    Manual,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=barscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cli::list_cameras(),
        Commands::Scan { camera, center } => cli::run_scan(camera, center),
        Commands::Manual => cli::manual_entry(),
    }
}
