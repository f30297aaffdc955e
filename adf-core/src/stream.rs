//! Drive the frame reassembler from a blocking byte source.
//!
//! Bytes are read one at a time, strictly in arrival order. A `CancelToken`
//! is checked before every read so an interrupt never lands mid-decode.

use std::io::{self, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::frame::{Frame, FrameReassembler, MarkerMode};
use crate::types::{AdfError, Result, ETX};

/// Shared stop flag, set from a signal handler or another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of the pre-scan that skips a partial leading message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// An ETX was found; `discarded` bytes were dropped, ETX included.
    Synchronized { discarded: usize },
    /// Input ended before any ETX.
    EndOfInput { discarded: usize },
}

/// Frame iterator over any `Read`.
///
/// Yields `Err(FramingIncomplete)` once if input ends mid-frame, and
/// `Err(Cancelled)` once if the token fires; both end the stream.
pub struct FrameStream<R: Read> {
    reader: BufReader<R>,
    reassembler: FrameReassembler,
    cancel: CancelToken,
    done: bool,
}

impl<R: Read> FrameStream<R> {
    pub fn new(reader: R, mode: MarkerMode, cancel: CancelToken) -> Self {
        FrameStream {
            reader: BufReader::new(reader),
            reassembler: FrameReassembler::new(mode),
            cancel,
            done: false,
        }
    }

    /// Discard everything up to and including the first ETX, to start
    /// cleanly when attached mid-stream.
    pub fn synchronize(&mut self) -> Result<SyncOutcome> {
        let mut discarded = 0usize;
        loop {
            match self.read_byte()? {
                Some(b) => {
                    discarded += 1;
                    if b == ETX {
                        return Ok(SyncOutcome::Synchronized { discarded });
                    }
                }
                None => return Ok(SyncOutcome::EndOfInput { discarded }),
            }
        }
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        use std::io::BufRead;
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.cancel.is_cancelled() {
            return Err(AdfError::Cancelled);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> Iterator for FrameStream<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Result<Frame>> {
        if self.done {
            return None;
        }
        loop {
            match self.read_byte() {
                Ok(Some(b)) => {
                    if let Some(frame) = self.reassembler.feed(b) {
                        return Some(Ok(frame));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    if self.reassembler.is_buffering() {
                        let buffered = self.reassembler.buffered_len();
                        self.reassembler.reset();
                        return Some(Err(AdfError::FramingIncomplete { buffered }));
                    }
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::STX;

    fn stream(bytes: &[u8]) -> FrameStream<&[u8]> {
        FrameStream::new(bytes, MarkerMode::Strip, CancelToken::new())
    }

    #[test]
    fn test_empty_stream_is_clean() {
        let mut s = stream(b"");
        assert!(s.next().is_none());
    }

    #[test]
    fn test_frames_in_order() {
        let bytes = b"\x02z100\r\n\x03\x02D50\r\n\x03";
        let frames: Vec<Frame> = stream(bytes).collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload(), b"z100");
        assert_eq!(frames[1].payload(), b"D50");
    }

    #[test]
    fn test_incomplete_frame_reported_once() {
        let mut s = stream(b"\x02z100\r\n\x03\x02D5");
        assert!(s.next().unwrap().is_ok());
        match s.next() {
            Some(Err(AdfError::FramingIncomplete { buffered })) => assert_eq!(buffered, 2),
            other => panic!("expected incomplete frame, got {other:?}"),
        }
        assert!(s.next().is_none());
    }

    #[test]
    fn test_synchronize_skips_partial_message() {
        let mut s = stream(b"0\r\n\x03\x02D50\r\n\x03");
        assert_eq!(
            s.synchronize().unwrap(),
            SyncOutcome::Synchronized { discarded: 4 }
        );
        let frame = s.next().unwrap().unwrap();
        assert_eq!(frame.payload(), b"D50");
    }

    #[test]
    fn test_synchronize_consumes_first_whole_message() {
        let mut s = stream(b"\x02z1\r\n\x03\x02z2\r\n\x03");
        s.synchronize().unwrap();
        let frames: Vec<Frame> = s.collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"z2");
    }

    #[test]
    fn test_synchronize_end_of_input() {
        let mut s = stream(b"\x02abc");
        assert_eq!(
            s.synchronize().unwrap(),
            SyncOutcome::EndOfInput { discarded: 4 }
        );
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut s = stream(b"\x02z1\r\n\x03");
        assert_eq!(s.peek().unwrap(), Some(STX));
        assert_eq!(s.next().unwrap().unwrap().payload(), b"z1");
        assert_eq!(s.peek().unwrap(), None);
    }

    #[test]
    fn test_cancel_stops_between_reads() {
        let cancel = CancelToken::new();
        let mut s = FrameStream::new(
            &b"\x02z1\r\n\x03\x02z2\r\n\x03"[..],
            MarkerMode::Strip,
            cancel.clone(),
        );
        assert!(s.next().unwrap().is_ok());
        cancel.cancel();
        assert!(matches!(s.next(), Some(Err(AdfError::Cancelled))));
        assert!(s.next().is_none());
    }
}
