//! adf-core: Pure decode library for Garmin 500-series RS-232 output
//! (Aviation Data Format, installation manual Appendix D).
//!
//! No async, no printing. Bytes go in, framed messages and decoded records
//! come out. Shared by `adf-feeder` (replay) and `adf-receiver` (live decode).

pub mod config;
pub mod decode;
pub mod frame;
pub mod sentence;
pub mod stream;
pub mod type1;
pub mod type2;
pub mod types;

// Re-export commonly used types at crate root
pub use decode::{decode_frame, decode_message, decode_sentence, MessageReport};
pub use frame::{split_frames, Frame, FrameReassembler, MarkerMode};
pub use sentence::{classify, split_sentences, Sentence, SentenceKind, Type1Id};
pub use stream::{CancelToken, FrameStream, SyncOutcome};
pub use types::*;
