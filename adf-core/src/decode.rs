//! Decode a buffered message into records.
//!
//! A message body is split into sentences; each recognised sentence yields
//! exactly one record. Anything that fails (unknown prefix, non-ASCII Type 1
//! text, bad number, short Type 2 layout) is skipped with a diagnostic and
//! decoding moves on to the next sentence.

use crate::frame::Frame;
use crate::sentence::{split_sentences, Sentence, SentenceKind};
use crate::type1::decode_type1;
use crate::type2::decode_type2;
use crate::types::*;

/// Records and diagnostics from one message, each in sentence order.
#[derive(Debug, Default)]
pub struct MessageReport {
    pub records: Vec<DecodedRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MessageReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Decode a single classified sentence.
pub fn decode_sentence(sentence: &Sentence<'_>) -> Result<DecodedRecord> {
    match sentence.kind {
        SentenceKind::Type1(id) => decode_type1(id, sentence.raw),
        SentenceKind::Type2 => decode_type2(sentence.raw),
        SentenceKind::Unknown => Err(AdfError::Unclassified(sentence.raw.to_vec())),
    }
}

/// Decode every sentence in a message body.
pub fn decode_message(body: &[u8]) -> MessageReport {
    let mut report = MessageReport::default();

    for sentence in split_sentences(body) {
        match decode_sentence(&sentence) {
            Ok(record) => report.records.push(record),
            Err(error) => {
                let diagnostic = Diagnostic {
                    raw: sentence.raw.to_vec(),
                    error,
                };
                tracing::warn!("{diagnostic}");
                report.diagnostics.push(diagnostic);
            }
        }
    }

    report
}

/// Decode the body of a reassembled frame.
pub fn decode_frame(frame: &Frame) -> MessageReport {
    decode_message(frame.body())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
