//! Video tag payloads.
//!
//! A video payload starts with one packed byte holding the frame type (high
//! nibble) and codec id (low nibble). AVC payloads carry a packet type and a
//! signed 24-bit composition time after it.

use std::fmt;
use std::io::{Read, Seek};

use bytes_util::ByteCursor;
use num_derive::FromPrimitive;
use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::field::Coded;
use crate::tag::TagBody;

/// Bytes taken by the AVC packet type and composition time.
const AVC_HEADER_SIZE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum VideoFrameType {
    KeyFrame = 1,
    InterFrame = 2,
    DisposableInterFrame = 3,
    GeneratedKeyFrame = 4,
    CommandFrame = 5,
}

impl fmt::Display for VideoFrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VideoFrameType::KeyFrame => "keyframe (for AVC, a seekable frame)",
            VideoFrameType::InterFrame => "inter frame (for AVC, a non-seekable frame)",
            VideoFrameType::DisposableInterFrame => "disposable inter frame (H.263 only)",
            VideoFrameType::GeneratedKeyFrame => {
                "generated keyframe (reserved for server use only)"
            }
            VideoFrameType::CommandFrame => "video info/command frame",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum VideoCodecId {
    Jpeg = 1,
    SorensonH263 = 2,
    ScreenVideo = 3,
    On2Vp6 = 4,
    On2Vp6WithAlpha = 5,
    ScreenVideoV2 = 6,
    Avc = 7,
}

impl fmt::Display for VideoCodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VideoCodecId::Jpeg => "JPEG (currently unused)",
            VideoCodecId::SorensonH263 => "Sorenson H.263",
            VideoCodecId::ScreenVideo => "Screen video",
            VideoCodecId::On2Vp6 => "On2 VP6",
            VideoCodecId::On2Vp6WithAlpha => "On2 VP6 with alpha channel",
            VideoCodecId::ScreenVideoV2 => "Screen video version 2",
            VideoCodecId::Avc => "AVC",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum AvcPacketType {
    SequenceHeader = 0,
    Nalu = 1,
    EndOfSequence = 2,
}

impl fmt::Display for AvcPacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AvcPacketType::SequenceHeader => "AVC sequence header",
            AvcPacketType::Nalu => "AVC NALU",
            AvcPacketType::EndOfSequence => "AVC end of sequence",
        })
    }
}

/// The AVC-specific fields of a video payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvcHeader {
    pub packet_type: Coded<AvcPacketType>,
    /// Composition time offset in milliseconds
    pub composition_time: i32,
}

/// The decoded fields of a video tag payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoData {
    pub frame_type: Coded<VideoFrameType>,
    pub codec_id: Coded<VideoCodecId>,
    /// Present only when `codec_id` is AVC
    pub avc: Option<AvcHeader>,
    /// Payload bytes skipped after the decoded fields
    pub skipped: u32,
}

impl VideoData {
    /// Split the packed flags byte into frame type and codec id.
    pub fn from_flags(flags: u8) -> Self {
        VideoData {
            frame_type: Coded::from_code(flags >> 4),
            codec_id: Coded::from_code(flags & 0x0F),
            avc: None,
            skipped: 0,
        }
    }

    pub fn is_avc(&self) -> bool {
        self.codec_id.is(VideoCodecId::Avc)
    }

    pub fn is_key_frame(&self) -> bool {
        self.frame_type.is(VideoFrameType::KeyFrame)
    }

    pub fn is_sequence_header(&self) -> bool {
        matches!(
            self.avc,
            Some(AvcHeader {
                packet_type: Coded::Known(AvcPacketType::SequenceHeader),
                ..
            })
        )
    }

    /// Bytes of the payload taken by the decoded fields.
    pub fn header_len(&self) -> u32 {
        if self.is_avc() { 1 + AVC_HEADER_SIZE } else { 1 }
    }
}

/// Decode a video payload of `data_size` bytes, leaving the cursor right after it.
pub fn demux<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    data_size: u32,
) -> Result<TagBody, DecodeError> {
    if data_size < 1 {
        debug!("empty video payload");
        return Ok(TagBody::Truncated { required: 1 });
    }

    let mut video = VideoData::from_flags(cursor.read_u8()?);
    let required = video.header_len();
    if data_size < required {
        debug!(data_size, required, "video payload shorter than its header");
        cursor.skip((data_size - 1) as u64)?;
        return Ok(TagBody::Truncated { required });
    }

    if video.is_avc() {
        let packet_type = Coded::from_code(cursor.read_u8()?);
        let composition_time = cursor.read_i24()?;
        video.avc = Some(AvcHeader {
            packet_type,
            composition_time,
        });
    }

    video.skipped = data_size - required;
    cursor.skip(video.skipped as u64)?;
    trace!(
        codec = %video.codec_id,
        frame = %video.frame_type,
        skipped = video.skipped,
        "video tag"
    );

    Ok(TagBody::Video(video))
}
