//! adf-stream: replay a captured ADF message file at a controlled pace.
//!
//! Messages are written to stdout exactly as captured, one per delay
//! period, so the output can be piped straight into `adf-decode`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tokio::io::AsyncWriteExt;

use adf_core::config::load_config;
use adf_core::{AdfError, CancelToken, Frame};

mod capture;

#[derive(Parser)]
#[command(
    name = "adf-stream",
    version,
    about = "Stream Aviation Data Format messages with controlled delay"
)]
struct Cli {
    /// Input file containing ADF messages
    filename: PathBuf,

    /// Delay between messages in seconds [default: 1.0, or stream.delay from config]
    #[arg(short = 's', long, allow_negative_numbers = true)]
    delay: Option<f64>,

    /// Log framing details to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config();
    let delay = cli.delay.unwrap_or(config.stream.delay);
    let Some(pause) = replay_delay(delay) else {
        tracing::error!("-s delay must be a non-negative number of seconds, got {delay}");
        return ExitCode::FAILURE;
    };

    let cancel = CancelToken::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let reader = capture::MessageReader::new(&cli.filename);
    let token = cancel.clone();
    let load = tokio::task::spawn_blocking(move || reader.read_all(&token));

    let frames = tokio::select! {
        joined = load => match joined {
            Ok(Ok(frames)) => frames,
            Ok(Err(e)) => {
                report_load_error(&cli.filename, &e);
                return ExitCode::FAILURE;
            }
            Err(e) => {
                tracing::error!("reader task failed: {e}");
                return ExitCode::FAILURE;
            }
        },
        _ = &mut ctrl_c => {
            cancel.cancel();
            tracing::info!("Quitting...");
            return ExitCode::SUCCESS;
        }
    };

    tracing::info!(
        "Stream {} messages with {delay}s between messages",
        frames.len()
    );

    tokio::select! {
        result = replay(&frames, pause) => match result {
            Ok(()) => ExitCode::SUCCESS,
            // Reader went away (e.g. `| head`)
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("write failed: {e}");
                ExitCode::FAILURE
            }
        },
        _ = &mut ctrl_c => {
            tracing::info!("Quitting...");
            ExitCode::SUCCESS
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
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Seconds between messages, rejecting negative, non-finite and
/// out-of-range values.
fn replay_delay(seconds: f64) -> Option<Duration> {
    if seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

fn report_load_error(path: &std::path::Path, e: &AdfError) {
    match e {
        AdfError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!("Error: File '{}' not found.", path.display());
        }
        AdfError::EmptyInput => tracing::error!("File is empty"),
        AdfError::NoEndMarker { .. } => tracing::error!("Exiting..."),
        e => tracing::error!("Error reading file '{}': {e}", path.display()),
    }
}

/// Write each frame verbatim, flushing and pausing after every one.
async fn replay(frames: &[Frame], delay: Duration) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    for frame in frames {
        stdout.write_all(frame.as_bytes()).await?;
        stdout.flush().await?;
        tokio::time::sleep(delay).await;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_delay() {
        assert_eq!(replay_delay(0.0), Some(Duration::ZERO));
        assert_eq!(replay_delay(0.25), Some(Duration::from_millis(250)));
        assert_eq!(replay_delay(-1.0), None);
        assert_eq!(replay_delay(f64::NAN), None);
        assert_eq!(replay_delay(f64::INFINITY), None);
        assert_eq!(replay_delay(1e30), None);
    }
}
