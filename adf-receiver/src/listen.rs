//! Blocking listen loop: bytes in, decoded records out.

use std::io::{Read, Write};

use adf_core::config::OutputFormat;
use adf_core::stream::{CancelToken, FrameStream, SyncOutcome};
use adf_core::{decode_frame, AdfError, MarkerMode, MessageReport, Result};

#[derive(Debug, Clone, Copy)]
pub struct ListenOptions {
    pub sync: bool,
    pub format: OutputFormat,
}

/// Why the listen loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenEnd {
    /// Input ended between messages.
    EndOfInput,
    /// Input ended inside a message; the partial message was dropped.
    Incomplete,
    /// Input ended before the pre-scan found an ETX.
    NeverSynchronized,
    Cancelled,
}

impl ListenEnd {
    /// Only a stream that never produced a message boundary is a failure.
    pub fn is_success(self) -> bool {
        self != ListenEnd::NeverSynchronized
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenStats {
    pub frames: u64,
    pub records: u64,
    pub diagnostics: u64,
}

/// Read frames until input ends or `cancel` fires, writing records to `out`.
pub fn listen<R: Read, W: Write>(
    input: R,
    out: &mut W,
    options: ListenOptions,
    cancel: CancelToken,
) -> Result<(ListenEnd, ListenStats)> {
    let mut stats = ListenStats::default();
    let mut stream = FrameStream::new(input, MarkerMode::Strip, cancel);

    if options.sync {
        tracing::info!("Waiting for a full message to go by....");
        match stream.synchronize() {
            Ok(SyncOutcome::Synchronized { discarded }) => {
                tracing::debug!(discarded, "synchronized");
            }
            Ok(SyncOutcome::EndOfInput { .. }) => {
                return Ok((ListenEnd::NeverSynchronized, stats));
            }
            Err(AdfError::Cancelled) => return Ok((ListenEnd::Cancelled, stats)),
            Err(e) => return Err(e),
        }
    }

    tracing::info!("Listening for Garmin 500 Series data (STX/ETX delimited)...");

    for item in stream {
        match item {
            Ok(frame) => {
                stats.frames += 1;
                let report = decode_frame(&frame);
                stats.records += report.records.len() as u64;
                stats.diagnostics += report.diagnostics.len() as u64;
                write_report(out, &report, options.format)?;
            }
            Err(AdfError::FramingIncomplete { buffered }) => {
                tracing::warn!(buffered, "input ended mid-message, dropping it");
                return Ok((ListenEnd::Incomplete, stats));
            }
            Err(AdfError::Cancelled) => return Ok((ListenEnd::Cancelled, stats)),
            Err(e) => return Err(e),
        }
    }

    Ok((ListenEnd::EndOfInput, stats))
}

/// Emit one decoded message. Diagnostics were already logged by the decoder.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &MessageReport,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out)?;
            writeln!(out, "Decoded Garmin 500 Series Data:")?;
            for record in &report.records {
                writeln!(out, "{record}")?;
            }
        }
        OutputFormat::Json => {
            for record in &report.records {
                serde_json::to_writer(&mut *out, record).map_err(std::io::Error::other)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: ListenOptions = ListenOptions {
        sync: false,
        format: OutputFormat::Text,
    };

    fn run(input: &[u8], options: ListenOptions) -> (ListenEnd, ListenStats, String) {
        let mut out = Vec::new();
        let (end, stats) = listen(input, &mut out, options, CancelToken::new()).unwrap();
        (end, stats, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_text_output() {
        let (end, stats, out) = run(b"\x02z1500\r\nD120\r\n\x03", TEXT);
        assert_eq!(end, ListenEnd::EndOfInput);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.records, 2);
        assert_eq!(
            out,
            "\nDecoded Garmin 500 Series Data:\n\
             Type 1 | GPS Altitude (ft): 1500\n\
             Type 1 | Ground Speed (knots): 120\n"
        );
    }

    #[test]
    fn test_json_output() {
        let mut leg = b"\x02w01\x21WPT01".to_vec();
        leg.extend_from_slice(&[0x85, 0x1E, 0x05, 0x45, 12, 0x1E, 0x02, 0xFF, 0xF0]);
        leg.extend_from_slice(b"\r\n\x03");

        let options = ListenOptions {
            sync: false,
            format: OutputFormat::Json,
        };
        let (_, _, out) = run(&leg, options);
        assert_eq!(
            out.trim_end(),
            r#"{"Type":"Type 2","Id":"w01","Seq":"1 Active     ","Wpt":"WPT01","Lat":"S5° 30.5","Lon":"E12° 30.2","Mag Var":-1.0}"#
        );
    }

    #[test]
    fn test_sync_skips_first_partial_message() {
        let options = ListenOptions {
            sync: true,
            format: OutputFormat::Text,
        };
        let (end, stats, _) = run(b"500\r\n\x03\x02D120\r\n\x03", options);
        assert_eq!(end, ListenEnd::EndOfInput);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.records, 1);
    }

    #[test]
    fn test_never_synchronized() {
        let options = ListenOptions {
            sync: true,
            format: OutputFormat::Text,
        };
        let (end, stats, out) = run(b"\x02z1", options);
        assert_eq!(end, ListenEnd::NeverSynchronized);
        assert!(!end.is_success());
        assert_eq!(stats.frames, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_incomplete_trailing_message() {
        let (end, stats, _) = run(b"\x02z1\r\n\x03\x02z2", TEXT);
        assert_eq!(end, ListenEnd::Incomplete);
        assert!(end.is_success());
        assert_eq!(stats.frames, 1);
    }

    #[test]
    fn test_empty_input() {
        let (end, stats, out) = run(b"", TEXT);
        assert_eq!(end, ListenEnd::EndOfInput);
        assert_eq!(stats, ListenStats::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_sentence_counted_not_printed() {
        let (_, stats, out) = run(b"\x02x99\r\nD5\r\n\x03", TEXT);
        assert_eq!(stats.records, 1);
        assert_eq!(stats.diagnostics, 1);
        assert!(!out.contains("x99"));
    }

    #[test]
    fn test_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut out = Vec::new();
        let (end, _) = listen(&b"\x02z1\r\n\x03"[..], &mut out, TEXT, cancel).unwrap();
        assert_eq!(end, ListenEnd::Cancelled);
    }
}
