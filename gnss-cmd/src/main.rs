mod frames;
mod info;

use std::io::stderr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the frames found in a receiver capture.
    ///
    /// Every byte is offered to the synchronizer of each selected protocol, so a capture
    /// of a port interleaving NMEA, UBX and RTCM traffic can be read as is.
    Frames {
        /// Input capture file
        input: PathBuf,

        /// Protocols to synchronize on
        #[arg(short, long, default_value = "all", value_delimiter = ',')]
        protocol: Vec<frames::Protocol>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: frames::Format,

        /// Decode each frame with the built-in message registries.
        #[arg(short, long, action)]
        decode: bool,
    },
    /// Show frame counts and synchronizer statistics for a receiver capture
    Info {
        /// Input capture file
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: frames::Format,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Frames {
            input,
            protocol,
            format,
            decode,
        } => frames::frames(input, protocol, format, *decode),
        Commands::Info { input, format } => info::info(input, format),
    }
}
