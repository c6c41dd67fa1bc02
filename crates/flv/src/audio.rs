//! Audio tag payloads.
//!
//! An audio payload starts with one packed byte:
//! - Sound format (4 bits)
//! - Sound rate (2 bits)
//! - Sound size (1 bit)
//! - Sound type (1 bit)
//!
//! For AAC, one more byte carries the AAC packet type. The codec data that
//! follows is skipped.

use std::fmt;
use std::io::{Read, Seek};

use bytes_util::ByteCursor;
use num_derive::FromPrimitive;
use tracing::{debug, trace};

use crate::error::DecodeError;
use crate::field::Coded;
use crate::tag::TagBody;

/// FLV Sound Format
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Audio tags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum SoundFormat {
    LinearPcmPlatformEndian = 0,
    Adpcm = 1,
    Mp3 = 2,
    LinearPcmLittleEndian = 3,
    Nellymoser16KhzMono = 4,
    Nellymoser8KhzMono = 5,
    Nellymoser = 6,
    G711ALaw = 7,
    G711MuLaw = 8,
    Reserved = 9,
    Aac = 10,
    Speex = 11,
    Mp38Khz = 14,
    DeviceSpecific = 15,
}

impl fmt::Display for SoundFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoundFormat::LinearPcmPlatformEndian => "Linear PCM, platform endian",
            SoundFormat::Adpcm => "ADPCM",
            SoundFormat::Mp3 => "MP3",
            SoundFormat::LinearPcmLittleEndian => "Linear PCM, little endian",
            SoundFormat::Nellymoser16KhzMono => "Nellymoser 16-kHz mono",
            SoundFormat::Nellymoser8KhzMono => "Nellymoser 8-kHz mono",
            SoundFormat::Nellymoser => "Nellymoser",
            SoundFormat::G711ALaw => "G.711 A-law logarithmic PCM",
            SoundFormat::G711MuLaw => "G.711 mu-law logarithmic PCM",
            SoundFormat::Reserved => "reserved",
            SoundFormat::Aac => "AAC",
            SoundFormat::Speex => "Speex",
            SoundFormat::Mp38Khz => "MP3 8-Khz",
            SoundFormat::DeviceSpecific => "Device-specific sound",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SoundRate {
    Khz5_5 = 0,
    Khz11 = 1,
    Khz22 = 2,
    Khz44 = 3,
}

impl SoundRate {
    fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => SoundRate::Khz5_5,
            1 => SoundRate::Khz11,
            2 => SoundRate::Khz22,
            _ => SoundRate::Khz44,
        }
    }
}

impl fmt::Display for SoundRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoundRate::Khz5_5 => "5.5-kHz",
            SoundRate::Khz11 => "11-kHz",
            SoundRate::Khz22 => "22-kHz",
            SoundRate::Khz44 => "44-kHz",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SoundSize {
    Bits8 = 0,
    Bits16 = 1,
}

impl fmt::Display for SoundSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoundSize::Bits8 => "snd8Bit",
            SoundSize::Bits16 => "snd16Bit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SoundType {
    Mono = 0,
    Stereo = 1,
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SoundType::Mono => "sndMono",
            SoundType::Stereo => "sndStereo",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum AacPacketType {
    SequenceHeader = 0,
    Raw = 1,
}

impl fmt::Display for AacPacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AacPacketType::SequenceHeader => "AAC sequence header",
            AacPacketType::Raw => "AAC raw",
        })
    }
}

/// The decoded fields of an audio tag payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioData {
    pub sound_format: Coded<SoundFormat>,
    pub sound_rate: SoundRate,
    pub sound_size: SoundSize,
    pub sound_type: SoundType,
    /// Present only when `sound_format` is AAC
    pub aac_packet_type: Option<Coded<AacPacketType>>,
    /// Payload bytes skipped after the decoded fields
    pub skipped: u32,
}

impl AudioData {
    /// Split the packed flags byte into its 4+2+1+1 bit fields.
    pub fn from_flags(flags: u8) -> Self {
        AudioData {
            sound_format: Coded::from_code(flags >> 4),
            sound_rate: SoundRate::from_bits(flags >> 2),
            sound_size: if flags & 0b10 != 0 {
                SoundSize::Bits16
            } else {
                SoundSize::Bits8
            },
            sound_type: if flags & 0b01 != 0 {
                SoundType::Stereo
            } else {
                SoundType::Mono
            },
            aac_packet_type: None,
            skipped: 0,
        }
    }

    pub fn is_aac(&self) -> bool {
        self.sound_format.is(SoundFormat::Aac)
    }

    pub fn is_sequence_header(&self) -> bool {
        matches!(
            self.aac_packet_type,
            Some(Coded::Known(AacPacketType::SequenceHeader))
        )
    }

    /// Bytes of the payload taken by the decoded fields.
    pub fn header_len(&self) -> u32 {
        if self.is_aac() { 2 } else { 1 }
    }
}

/// Decode an audio payload of `data_size` bytes, leaving the cursor right after it.
pub fn demux<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    data_size: u32,
) -> Result<TagBody, DecodeError> {
    if data_size < 1 {
        debug!("empty audio payload");
        return Ok(TagBody::Truncated { required: 1 });
    }

    let mut audio = AudioData::from_flags(cursor.read_u8()?);
    let required = audio.header_len();
    if data_size < required {
        debug!(data_size, required, "audio payload shorter than its header");
        cursor.skip((data_size - 1) as u64)?;
        return Ok(TagBody::Truncated { required });
    }

    if audio.is_aac() {
        audio.aac_packet_type = Some(Coded::from_code(cursor.read_u8()?));
    }

    audio.skipped = data_size - required;
    cursor.skip(audio.skipped as u64)?;
    trace!(format = %audio.sound_format, skipped = audio.skipped, "audio tag");

    Ok(TagBody::Audio(audio))
}
