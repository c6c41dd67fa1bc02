//! FLV container decoding.
//!
//! [`decode`] reads the file header and returns an [`FlvDecoder`], a lazy
//! iterator over the tags that follow. Each [`Tag`] carries its header fields,
//! the decoded audio/video flags or script data, and the `PreviousTagSize`
//! trailing it. [`FlvHeader::to_records`] and [`Tag::to_records`] flatten the
//! decoded values into labelled [`Record`]s for dumping.

pub mod audio;
pub mod config;
pub mod error;
pub mod field;
pub mod framing;
pub mod header;
pub mod parser;
pub mod record;
pub mod script;
pub mod tag;
pub mod video;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use config::{DecoderConfig, PrevTagSizeMode, UnknownTagPolicy};
pub use error::DecodeError;
pub use field::Coded;
pub use framing::TagHeader;
pub use header::FlvHeader;
pub use parser::{DecodeStats, FlvDecoder, decode, decode_file, decode_with_config};
pub use record::{BlockKind, Record, RecordBlock, RecordValue};
pub use script::{ScriptData, ScriptPayload};
pub use tag::{FlvTagType, SizeMismatch, Tag, TagBody};
