use std::io;

use amf0::Amf0ReadError;
use bytes_util::CursorError;
use thiserror::Error;

use crate::tag::SizeMismatch;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(
        "unexpected end of input at offset {position}: needed {needed} bytes, {available} available"
    )]
    UnexpectedEndOfInput {
        position: u64,
        needed: u64,
        available: u64,
    },

    #[error("invalid seek of {delta} bytes from offset {position}")]
    InvalidSeek { position: u64, delta: i64 },

    #[error("invalid FLV signature: {0:02X?}")]
    InvalidSignature([u8; 3]),

    #[error("invalid FLV DataOffset: {0}")]
    InvalidDataOffset(u32),

    #[error("unknown tag type {tag_type} at offset {offset}")]
    UnknownTagType { offset: u64, tag_type: u8 },

    #[error("malformed script value (marker {marker}) at offset {offset}")]
    MalformedScriptValue { offset: u64, marker: u8 },

    #[error(
        "PreviousTagSize mismatch at offset {}: expected {}, got {}",
        .0.offset, .0.expected, .0.actual
    )]
    SizeMismatch(SizeMismatch),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DecodeError {
    /// Whether the error came from running out of input.
    pub fn is_unexpected_end(&self) -> bool {
        matches!(self, DecodeError::UnexpectedEndOfInput { .. })
    }

    /// Convert a cursor error raised while reading a buffer that starts at
    /// stream offset `base`.
    pub(crate) fn from_cursor_at(err: CursorError, base: u64) -> Self {
        match err {
            CursorError::UnexpectedEndOfInput {
                position,
                needed,
                available,
            } => DecodeError::UnexpectedEndOfInput {
                position: base + position,
                needed,
                available,
            },
            CursorError::InvalidSeek { position, delta } => DecodeError::InvalidSeek {
                position: base + position,
                delta,
            },
            CursorError::InvalidWidth(width) => DecodeError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported integer width: {width}"),
            )),
            CursorError::Io(e) => DecodeError::Io(e),
        }
    }

    /// Convert an AMF0 error whose marker (if any) was read at stream offset
    /// `marker_offset`; cursor positions are relative to `base`.
    pub(crate) fn from_amf0_at(err: Amf0ReadError, base: u64, marker_offset: u64) -> Self {
        match err.marker_byte() {
            Some(marker) => DecodeError::MalformedScriptValue {
                offset: marker_offset,
                marker,
            },
            None => match err {
                Amf0ReadError::Cursor(e) => Self::from_cursor_at(e, base),
                other => DecodeError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    other.to_string(),
                )),
            },
        }
    }
}

impl From<CursorError> for DecodeError {
    fn from(err: CursorError) -> Self {
        Self::from_cursor_at(err, 0)
    }
}
