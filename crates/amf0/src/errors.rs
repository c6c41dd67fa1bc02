use bytes_util::CursorError;
use thiserror::Error;

use crate::Amf0Marker;

#[derive(Debug, Error)]
pub enum Amf0ReadError {
    #[error("cursor error: {0}")]
    Cursor(#[from] CursorError),

    #[error("unknown marker: {0}")]
    UnknownMarker(u8),

    #[error("unsupported type: {0:?}")]
    UnsupportedType(Amf0Marker),

    #[error("wrong type: expected {expected:?}, got {got:?}")]
    WrongType {
        expected: Amf0Marker,
        got: Amf0Marker,
    },
}

impl Amf0ReadError {
    /// The raw marker byte this error is about, if it is a type error.
    pub fn marker_byte(&self) -> Option<u8> {
        match self {
            Amf0ReadError::UnknownMarker(byte) => Some(*byte),
            Amf0ReadError::UnsupportedType(marker) => Some(*marker as u8),
            Amf0ReadError::WrongType { got, .. } => Some(*got as u8),
            Amf0ReadError::Cursor(_) => None,
        }
    }
}
