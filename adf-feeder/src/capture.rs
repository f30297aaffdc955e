//! Load captured ADF message files for replay.
//!
//! A capture is the raw serial output of the unit, STX/ETX framing included.
//! It is re-split with the same reassembler the live decoder uses, keeping
//! the markers, so every replayed frame is byte-identical to the capture.

use std::fs::File;
use std::path::{Path, PathBuf};

use adf_core::stream::{CancelToken, FrameStream, SyncOutcome};
use adf_core::{AdfError, Frame, MarkerMode, Result, STX};

/// Reads every complete message from a capture file.
pub struct MessageReader {
    path: PathBuf,
}

impl MessageReader {
    pub fn new(path: &Path) -> Self {
        MessageReader {
            path: path.to_path_buf(),
        }
    }

    /// Read all frames from the file.
    ///
    /// If the file does not open on an STX it was cut mid-message; everything
    /// through the first ETX is dropped before collecting frames.
    pub fn read_all(&self, cancel: &CancelToken) -> Result<Vec<Frame>> {
        let file = File::open(&self.path)?;
        let mut stream = FrameStream::new(file, MarkerMode::Keep, cancel.clone());

        match stream.peek()? {
            None => return Err(AdfError::EmptyInput),
            Some(STX) => {}
            Some(_) => {
                tracing::info!("Waiting for a full message to go by....");
                match stream.synchronize()? {
                    SyncOutcome::Synchronized { discarded } => {
                        tracing::info!(discarded, "Found first ETX.");
                    }
                    SyncOutcome::EndOfInput { discarded } => {
                        return Err(AdfError::NoEndMarker { discarded });
                    }
                }
            }
        }

        let mut frames = Vec::new();
        for item in stream {
            match item {
                Ok(frame) => frames.push(frame),
                Err(AdfError::FramingIncomplete { buffered }) => {
                    tracing::warn!(buffered, "dropping incomplete trailing message");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!("No more messages...");

        Ok(frames)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn capture(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn read(bytes: &[u8]) -> Result<Vec<Frame>> {
        let file = capture(bytes);
        MessageReader::new(file.path()).read_all(&CancelToken::new())
    }

    #[test]
    fn test_frames_are_byte_identical() {
        let msg1 = b"\x02z1500\r\nD120\r\n\x03".to_vec();
        let mut msg2 = b"\x02w01\x21WPT01".to_vec();
        msg2.extend_from_slice(&[0x85, 0x03, 0x05, 0x45, 13, 0x1E, 0x02, 0x00, 0x10]);
        msg2.extend_from_slice(b"\r\n\x03");

        let mut bytes = msg1.clone();
        bytes.extend_from_slice(&msg2);

        let frames = read(&bytes).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_bytes(), msg1.as_slice());
        assert_eq!(frames[1].as_bytes(), msg2.as_slice());
    }

    #[test]
    fn test_starts_mid_message() {
        let frames = read(b"0\r\nD120\r\n\x03\x02z900\r\n\x03").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"z900");
    }

    #[test]
    fn test_trailing_partial_message_dropped() {
        let frames = read(b"\x02z900\r\n\x03\x02D12").unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(read(b""), Err(AdfError::EmptyInput)));
    }

    #[test]
    fn test_no_end_marker() {
        assert!(matches!(
            read(b"garbage"),
            Err(AdfError::NoEndMarker { discarded: 7 })
        ));
    }

    #[test]
    fn test_missing_file() {
        let reader = MessageReader::new(Path::new("/nonexistent/capture.adf"));
        match reader.read_all(&CancelToken::new()) {
            Err(AdfError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_read() {
        let file = capture(b"\x02z900\r\n\x03");
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = MessageReader::new(file.path()).read_all(&cancel);
        assert!(matches!(result, Err(AdfError::Cancelled)));
    }
}
