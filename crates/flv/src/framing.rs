use std::io::{Read, Seek};

use bytes_util::ByteCursor;

use crate::error::DecodeError;
use crate::tag::FlvTagType;

pub const PREV_TAG_SIZE_FIELD_SIZE: u32 = 4;
pub const TAG_HEADER_SIZE: u32 = 11;

/// The 11-byte header shared by every tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub tag_type: FlvTagType,
    /// Payload length, excluding this header
    pub data_size: u32,
    /// Lower 24 bits of the timestamp, in milliseconds
    pub timestamp: u32,
    /// Upper 8 bits of the timestamp
    pub timestamp_extended: u8,
    /// Always 0 in practice
    pub stream_id: u32,
}

impl TagHeader {
    pub fn parse<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self, DecodeError> {
        let tag_type = FlvTagType::from(cursor.read_u8()?);
        let data_size = cursor.read_u24()?;
        let timestamp = cursor.read_u24()?;
        let timestamp_extended = cursor.read_u8()?;
        let stream_id = cursor.read_u24()?;

        Ok(TagHeader {
            tag_type,
            data_size,
            timestamp,
            timestamp_extended,
            stream_id,
        })
    }

    /// The full 32-bit timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> u32 {
        ((self.timestamp_extended as u32) << 24) | self.timestamp
    }

    /// Size of the tag as `PreviousTagSize` records it: header plus payload.
    pub fn tag_size(&self) -> u32 {
        TAG_HEADER_SIZE + self.data_size
    }

    /// Bytes the tag occupies in the stream, including the trailing `PreviousTagSize`.
    pub fn stream_size(&self) -> u64 {
        self.tag_size() as u64 + PREV_TAG_SIZE_FIELD_SIZE as u64
    }
}
