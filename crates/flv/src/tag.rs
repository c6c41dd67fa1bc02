use std::fmt;

use crate::audio::AudioData;
use crate::framing::TagHeader;
use crate::script::ScriptPayload;
use crate::video::VideoData;

/// A decoded FLV tag.
///
/// Tags are produced one at a time by [`FlvDecoder`](crate::FlvDecoder); nothing
/// of the payload is retained beyond the decoded fields.
#[derive(Debug)]
pub struct Tag {
    /// 1-based position of the tag in the stream
    pub index: u32,
    /// Byte offset where the tag header begins
    pub offset: u64,
    pub header: TagHeader,
    pub body: TagBody,
    /// The `PreviousTagSize` field trailing this tag
    pub previous_tag_size: u32,
    /// Set when `previous_tag_size` disagrees with `11 + data_size`.
    pub size_mismatch: Option<SizeMismatch>,
}

impl Tag {
    pub fn tag_type(&self) -> FlvTagType {
        self.header.tag_type
    }

    pub fn data_size(&self) -> u32 {
        self.header.data_size
    }

    /// Offset of the tag that follows this one.
    pub fn next_offset(&self) -> u64 {
        self.offset + self.header.stream_size()
    }

    pub fn is_script_tag(&self) -> bool {
        matches!(self.header.tag_type, FlvTagType::ScriptData)
    }

    pub fn is_audio_tag(&self) -> bool {
        matches!(self.header.tag_type, FlvTagType::Audio)
    }

    pub fn is_video_tag(&self) -> bool {
        matches!(self.header.tag_type, FlvTagType::Video)
    }

    pub fn audio(&self) -> Option<&AudioData> {
        match &self.body {
            TagBody::Audio(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn video(&self) -> Option<&VideoData> {
        match &self.body {
            TagBody::Video(video) => Some(video),
            _ => None,
        }
    }

    pub fn script(&self) -> Option<&ScriptPayload> {
        match &self.body {
            TagBody::Script(script) => Some(script),
            _ => None,
        }
    }
}

/// The type-specific part of a tag.
#[derive(Debug)]
pub enum TagBody {
    Audio(AudioData),
    Video(VideoData),
    Script(ScriptPayload),
    /// `data_size` is smaller than the fixed fields of the payload type.
    /// The payload bytes were skipped.
    Truncated { required: u32 },
    /// A tag of unknown type, skipped as configured.
    Skipped,
}

/// A `PreviousTagSize` that disagrees with the size of the tag it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    /// Offset of the `PreviousTagSize` field
    pub offset: u64,
    pub expected: u32,
    pub actual: u32,
}

/// FLV Tag Type
///
/// This is the type of the tag.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
///
/// The 3 types that are supported are:
/// - Audio(8)
/// - Video(9)
/// - ScriptData(18)
///
/// Any other value is kept as `Unknown` so the decoder can apply its
/// [`UnknownTagPolicy`](crate::UnknownTagPolicy).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio = 8,
    Video = 9,
    ScriptData = 18,
    Unknown(u8),
}

impl From<u8> for FlvTagType {
    fn from(value: u8) -> Self {
        match value {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::ScriptData,
            _ => FlvTagType::Unknown(value),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        match value {
            FlvTagType::Audio => 8,
            FlvTagType::Video => 9,
            FlvTagType::ScriptData => 18,
            FlvTagType::Unknown(val) => val,
        }
    }
}

impl fmt::Display for FlvTagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlvTagType::Audio => write!(f, "Audio"),
            FlvTagType::Video => write!(f, "Video"),
            FlvTagType::ScriptData => write!(f, "Script"),
            FlvTagType::Unknown(value) => write!(f, "unknown {value}"),
        }
    }
}
