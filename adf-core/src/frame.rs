//! Reassemble STX/ETX-delimited messages from a byte stream.
//!
//! Type 2 sentences carry raw binary bytes, so a 0x03 inside a message is
//! not necessarily the end marker. A frame only ends on ETX when the two
//! bytes before it were CR, LF. That still misfires on some coordinates
//! (e.g. 13° 10' .03) and the misfire is part of the wire contract: the
//! receiving unit behaves the same way.

use crate::types::{CR, ETX, LF, STX};

/// Whether the start/end markers are kept in emitted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerMode {
    /// Interactive decoding: frames hold only the bytes between the markers.
    #[default]
    Strip,
    /// Replay: frames are byte-identical to the captured message.
    Keep,
}

/// One complete message, as handed to the sentence splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
    mode: MarkerMode,
}

impl Frame {
    /// Raw bytes as buffered (markers included in `Keep` mode).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes between STX and ETX.
    pub fn body(&self) -> &[u8] {
        match self.mode {
            MarkerMode::Strip => &self.bytes,
            MarkerMode::Keep => &self.bytes[1..self.bytes.len() - 1],
        }
    }

    /// Body without the CR LF that precedes ETX.
    pub fn payload(&self) -> &[u8] {
        let body = self.body();
        body.strip_suffix(&[CR, LF]).unwrap_or(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Buffering,
}

/// Byte-at-a-time STX/ETX framer.
///
/// `pending_end` tracks progress through CR (1) → LF (2) → ETX.
#[derive(Debug)]
pub struct FrameReassembler {
    state: State,
    pending_end: u8,
    buffer: Vec<u8>,
    mode: MarkerMode,
}

impl FrameReassembler {
    pub fn new(mode: MarkerMode) -> Self {
        FrameReassembler {
            state: State::Idle,
            pending_end: 0,
            buffer: Vec::new(),
            mode,
        }
    }

    /// Feed one byte. Returns a frame when this byte completes one.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            State::Idle => {
                if byte == STX {
                    self.buffer.clear();
                    if self.mode == MarkerMode::Keep {
                        self.buffer.push(byte);
                    }
                    self.state = State::Buffering;
                    self.pending_end = 0;
                }
                None
            }
            State::Buffering => {
                if self.pending_end == 2 {
                    if byte == ETX {
                        if self.mode == MarkerMode::Keep {
                            self.buffer.push(byte);
                        }
                        self.state = State::Idle;
                        self.pending_end = 0;
                        let bytes = std::mem::take(&mut self.buffer);
                        tracing::trace!(len = bytes.len(), "frame complete");
                        return Some(Frame {
                            bytes,
                            mode: self.mode,
                        });
                    }
                    tracing::debug!(byte, "CR LF not followed by ETX, still buffering");
                    self.pending_end = 0;
                }

                self.pending_end = match (self.pending_end, byte) {
                    (0, CR) => 1,
                    (1, LF) => 2,
                    _ => 0,
                };
                self.buffer.push(byte);
                None
            }
        }
    }

    /// Feed a slice, collecting every frame it completes.
    pub fn feed_all(&mut self, bytes: &[u8]) -> Vec<Frame> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    pub fn is_buffering(&self) -> bool {
        self.state == State::Buffering
    }

    /// Bytes held for the frame in progress.
    pub fn buffered_len(&self) -> usize {
        if self.is_buffering() {
            self.buffer.len()
        } else {
            0
        }
    }

    /// Drop any partial frame and return to idle.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.pending_end = 0;
        self.buffer.clear();
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        FrameReassembler::new(MarkerMode::Strip)
    }
}

/// Split a complete in-memory capture into frames.
pub fn split_frames(bytes: &[u8], mode: MarkerMode) -> Vec<Frame> {
    FrameReassembler::new(mode).feed_all(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
