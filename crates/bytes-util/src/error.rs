use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CursorError {
    /// The source holds fewer bytes than the field being read.
    #[error(
        "unexpected end of input at offset {position}: needed {needed} bytes, {available} available"
    )]
    UnexpectedEndOfInput {
        position: u64,
        needed: u64,
        available: u64,
    },

    /// A relative seek would move before the start of the source.
    #[error("invalid seek of {delta} bytes from offset {position}")]
    InvalidSeek { position: u64, delta: i64 },

    /// Integer reads are limited to 1..=4 bytes.
    #[error("unsupported integer width: {0} bytes")]
    InvalidWidth(usize),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CursorError {
    pub fn is_unexpected_end(&self) -> bool {
        matches!(self, CursorError::UnexpectedEndOfInput { .. })
    }
}
