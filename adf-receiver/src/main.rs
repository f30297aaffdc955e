//! adf-decode: listen for Garmin 500-series RS-232 output and print each
//! decoded message.
//!
//! Reads stdin (or `--input`) one byte at a time. Pipe a serial port or
//! `adf-stream` into it.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use adf_core::config::{self, OutputFormat};
use adf_core::CancelToken;

mod listen;

use listen::{ListenEnd, ListenOptions};

#[derive(Parser)]
#[command(
    name = "adf-decode",
    version,
    about = "Decode Garmin 500 Series RS-232 data (STX/ETX delimited)"
)]
struct Cli {
    /// Read from this file instead of stdin
    #[arg(long, env = "ADF_INPUT")]
    input: Option<PathBuf>,

    /// Print one JSON object per decoded sentence
    #[arg(long)]
    json: bool,

    /// Start at the first STX instead of skipping past the first ETX
    #[arg(long)]
    no_sync: bool,

    /// Write the effective settings to ~/.adf-decode/config.yaml
    #[arg(long)]
    save_config: bool,

    /// Log framing and skipped-sentence details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = config::load_config();
    if cli.json {
        settings.decode.format = OutputFormat::Json;
    }
    if cli.no_sync {
        settings.decode.sync = false;
    }
    if cli.save_config {
        match config::save_config(&settings) {
            Ok(path) => tracing::info!("saved config to {}", path.display()),
            Err(e) => {
                tracing::error!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let input: Box<dyn Read + Send> = match &cli.input {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(f),
            Err(e) => {
                tracing::error!("Error opening {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin()),
    };

    let options = ListenOptions {
        sync: settings.decode.sync,
        format: settings.decode.format,
    };
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let worker = tokio::task::spawn_blocking(move || {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        listen::listen(input, &mut out, options, token)
    });

    tokio::select! {
        joined = worker => match joined {
            Ok(Ok((end, stats))) => {
                tracing::debug!(
                    frames = stats.frames,
                    records = stats.records,
                    skipped = stats.diagnostics,
                    "done"
                );
                match end {
                    ListenEnd::Cancelled => tracing::info!("Quitting..."),
                    _ => tracing::info!("Exiting..."),
                }
                if end.is_success() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Ok(Err(e)) => {
                tracing::error!("{e}");
                ExitCode::FAILURE
            }
            Err(e) => {
                tracing::error!("listener task failed: {e}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            tracing::info!("Quitting...");
            // The blocking reader may be parked on stdin; don't wait for it.
            std::process::exit(0);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}
