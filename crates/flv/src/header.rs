use std::io::{Read, Seek};

use bytes_util::ByteCursor;
use tracing::debug;

use crate::error::DecodeError;
use crate::tag::SizeMismatch;

pub const FLV_HEADER_SIZE: u32 = 9;
pub const FLV_SIGNATURE: [u8; 3] = *b"FLV";
// DataOffset is a 32-bit header length field. In practice it is 9 for standard FLV.
// Put a conservative bound so a bogus header can't make us skip most of the file.
const MAX_DATA_OFFSET: u32 = 64 * 1024;

/// The FLV file header plus the `PreviousTagSize0` field that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvHeader {
    /// Always `FLV`
    pub signature: [u8; 3],
    /// The version of the FLV file format, usually 0x01
    pub version: u8,
    /// Bits 7..=3 of the flags byte, reserved
    pub flags_reserved: u8,
    pub has_audio: bool,
    /// Bit 1 of the flags byte, reserved
    pub flags_reserved2: bool,
    pub has_video: bool,
    /// Length of this header in bytes, at least 9
    pub data_offset: u32,
    /// `PreviousTagSize0`, expected to be 0
    pub previous_tag_size: u32,
    /// Set when `previous_tag_size` is not 0 and mismatches are being checked.
    pub size_mismatch: Option<SizeMismatch>,
}

impl FlvHeader {
    /// The signature as text. Always `FLV` for a header that parsed.
    pub fn signature_str(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }

    /// Bytes taken by the header and `PreviousTagSize0`, i.e. the offset of the first tag.
    pub fn size(&self) -> u64 {
        self.data_offset as u64 + 4
    }

    /// Parses the FLV header and the following `PreviousTagSize0`.
    ///
    /// The cursor must be positioned at the start of the file. Reserved flag bits
    /// and the version are reported as-is; only a wrong signature or an
    /// impossible `DataOffset` is rejected. Header bytes beyond the 9 standard
    /// ones are skipped.
    pub fn parse<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Self, DecodeError> {
        let signature = cursor.read_array::<3>()?;
        if signature != FLV_SIGNATURE {
            return Err(DecodeError::InvalidSignature(signature));
        }

        let version = cursor.read_u8()?;

        // Flags, most significant bit first: 5 reserved, audio, 1 reserved, video.
        let flags = cursor.read_u8()?;
        let flags_reserved = flags >> 3;
        let has_audio = (flags & 0b0000_0100) != 0;
        let flags_reserved2 = (flags & 0b0000_0010) != 0;
        let has_video = (flags & 0b0000_0001) != 0;

        let data_offset = cursor.read_u32()?;
        if !(FLV_HEADER_SIZE..=MAX_DATA_OFFSET).contains(&data_offset) {
            return Err(DecodeError::InvalidDataOffset(data_offset));
        }

        let extra = data_offset - FLV_HEADER_SIZE;
        if extra > 0 {
            debug!(extra, "skipping extended FLV header bytes");
            cursor.skip(extra as u64)?;
        }

        let previous_tag_size = cursor.read_u32()?;

        Ok(FlvHeader {
            signature,
            version,
            flags_reserved,
            has_audio,
            flags_reserved2,
            has_video,
            data_offset,
            previous_tag_size,
            size_mismatch: None,
        })
    }
}
