use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use bytes_util::ByteCursor;
use tracing::{debug, trace, warn};

use crate::config::{DecoderConfig, PrevTagSizeMode, UnknownTagPolicy};
use crate::error::DecodeError;
use crate::framing::{PREV_TAG_SIZE_FIELD_SIZE, TagHeader};
use crate::header::FlvHeader;
use crate::tag::{FlvTagType, SizeMismatch, Tag, TagBody};
use crate::{audio, script, video};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    AwaitingTag,
    Done,
}

/// Counters kept while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub tags: u32,
    pub audio_tags: u32,
    pub video_tags: u32,
    pub script_tags: u32,
    pub unknown_tags: u32,
    pub size_mismatches: u32,
}

/// Decodes an FLV byte source one tag at a time.
///
/// The decoder is an iterator over the tags that follow the file header. A
/// structural error (truncated input, invalid seek, unknown tag type under
/// [`UnknownTagPolicy::Abort`], `PreviousTagSize` mismatch under
/// [`PrevTagSizeMode::Strict`]) is yielded once and ends the iteration.
/// Errors local to one payload are reported on the tag itself.
pub struct FlvDecoder<R> {
    cursor: ByteCursor<R>,
    config: DecoderConfig,
    header: FlvHeader,
    state: DriverState,
    tag_count: u32,
    offset: u64,
    stats: DecodeStats,
}

impl<R: Read + Seek> FlvDecoder<R> {
    pub fn new(source: R) -> Result<Self, DecodeError> {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Read the file header from `source` and prepare to decode its tags.
    pub fn with_config(source: R, config: DecoderConfig) -> Result<Self, DecodeError> {
        let mut cursor = ByteCursor::new(source)?;
        let mut header = FlvHeader::parse(&mut cursor)?;

        let prev_tag_size_offset = cursor.position() - PREV_TAG_SIZE_FIELD_SIZE as u64;
        header.size_mismatch = check_prev_tag_size(
            config.prev_tag_size,
            prev_tag_size_offset,
            0,
            header.previous_tag_size,
        )?;

        let mut stats = DecodeStats::default();
        if header.size_mismatch.is_some() {
            stats.size_mismatches += 1;
        }

        let offset = cursor.position();
        debug!(
            version = header.version,
            has_audio = header.has_audio,
            has_video = header.has_video,
            data_offset = header.data_offset,
            "parsed FLV header"
        );

        Ok(Self {
            cursor,
            config,
            header,
            state: DriverState::AwaitingTag,
            tag_count: 0,
            offset,
            stats,
        })
    }

    pub fn header(&self) -> &FlvHeader {
        &self.header
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    /// Offset of the next tag to be decoded.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of tags decoded so far.
    pub fn tag_count(&self) -> u32 {
        self.tag_count
    }

    pub fn is_done(&self) -> bool {
        self.state == DriverState::Done
    }

    /// Decode the next tag, or return `None` once the input is exhausted.
    pub fn next_tag(&mut self) -> Result<Option<Tag>, DecodeError> {
        if self.state == DriverState::Done {
            return Ok(None);
        }

        if self.cursor.at_end() {
            self.finish();
            return Ok(None);
        }

        match self.decode_tag() {
            Ok(tag) => Ok(Some(tag)),
            Err(e) => {
                self.state = DriverState::Done;
                Err(e)
            }
        }
    }

    fn finish(&mut self) {
        self.state = DriverState::Done;
        debug!(
            "Audio tags: {}, Video tags: {}, Metadata tags: {}, Unknown tags: {}",
            self.stats.audio_tags,
            self.stats.video_tags,
            self.stats.script_tags,
            self.stats.unknown_tags
        );
    }

    fn decode_tag(&mut self) -> Result<Tag, DecodeError> {
        let offset = self.offset;
        debug_assert_eq!(offset, self.cursor.position());
        self.tag_count += 1;

        let header = TagHeader::parse(&mut self.cursor)?;
        let data_size = header.data_size;
        trace!(
            index = self.tag_count,
            offset,
            tag_type = %header.tag_type,
            data_size,
            "tag header"
        );

        let body = match header.tag_type {
            FlvTagType::Audio => audio::demux(&mut self.cursor, data_size)?,
            FlvTagType::Video => video::demux(&mut self.cursor, data_size)?,
            FlvTagType::ScriptData if self.config.script_detail => {
                script::demux(&mut self.cursor, data_size)?
            }
            FlvTagType::ScriptData => script::skip(&mut self.cursor, data_size)?,
            FlvTagType::Unknown(tag_type) => match self.config.unknown_tag {
                UnknownTagPolicy::Abort => {
                    return Err(DecodeError::UnknownTagType { offset, tag_type });
                }
                UnknownTagPolicy::Skip => {
                    warn!(offset, tag_type, data_size, "skipping tag of unknown type");
                    self.cursor.skip(data_size as u64)?;
                    TagBody::Skipped
                }
            },
        };

        let prev_tag_size_offset = self.cursor.position();
        let previous_tag_size = self.cursor.read_u32()?;
        let size_mismatch = check_prev_tag_size(
            self.config.prev_tag_size,
            prev_tag_size_offset,
            header.tag_size(),
            previous_tag_size,
        )?;

        self.offset = self.cursor.position();
        debug_assert_eq!(self.offset, offset + header.stream_size());

        self.stats.tags += 1;
        match header.tag_type {
            FlvTagType::Audio => self.stats.audio_tags += 1,
            FlvTagType::Video => self.stats.video_tags += 1,
            FlvTagType::ScriptData => self.stats.script_tags += 1,
            FlvTagType::Unknown(_) => self.stats.unknown_tags += 1,
        }
        if size_mismatch.is_some() {
            self.stats.size_mismatches += 1;
        }

        Ok(Tag {
            index: self.tag_count,
            offset,
            header,
            body,
            previous_tag_size,
            size_mismatch,
        })
    }
}

fn check_prev_tag_size(
    mode: PrevTagSizeMode,
    offset: u64,
    expected: u32,
    actual: u32,
) -> Result<Option<SizeMismatch>, DecodeError> {
    if mode == PrevTagSizeMode::Ignore || expected == actual {
        return Ok(None);
    }

    let mismatch = SizeMismatch {
        offset,
        expected,
        actual,
    };
    match mode {
        PrevTagSizeMode::Strict => Err(DecodeError::SizeMismatch(mismatch)),
        _ => {
            warn!(offset, expected, got = actual, "PreviousTagSize mismatch");
            Ok(Some(mismatch))
        }
    }
}

impl<R: Read + Seek> Iterator for FlvDecoder<R> {
    type Item = Result<Tag, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tag().transpose()
    }
}

/// Decode an FLV byte source with the default configuration.
///
/// Returns the file header and a lazy sequence of tags. Every call starts from
/// a fresh decoder, so decoding the same source twice yields the same output.
pub fn decode<R: Read + Seek>(source: R) -> Result<(FlvHeader, FlvDecoder<R>), DecodeError> {
    decode_with_config(source, DecoderConfig::default())
}

pub fn decode_with_config<R: Read + Seek>(
    source: R,
    config: DecoderConfig,
) -> Result<(FlvHeader, FlvDecoder<R>), DecodeError> {
    let decoder = FlvDecoder::with_config(source, config)?;
    Ok((decoder.header().clone(), decoder))
}

/// Open `path` and decode it.
pub fn decode_file(
    path: &Path,
    config: DecoderConfig,
) -> Result<(FlvHeader, FlvDecoder<BufReader<File>>), DecodeError> {
    let file = File::open(path)?;
    decode_with_config(BufReader::new(file), config)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::audio::{AacPacketType, SoundFormat};
    use crate::field::Coded;
    use crate::script::ScriptPayload;
    use crate::test_support::{
        FlvBuilder, ScriptBuilder, audio_payload, avc_payload, tag_header_bytes,
    };
    use std::io::Cursor;

    fn decode_all(
        data: Vec<u8>,
        config: DecoderConfig,
    ) -> (FlvHeader, Vec<Result<Tag, DecodeError>>) {
        let (header, decoder) = decode_with_config(Cursor::new(data), config).unwrap();
        (header, decoder.collect())
    }

    fn sample_file() -> Vec<u8> {
        FlvBuilder::new(true, true)
            .script(
                &ScriptBuilder::new("onMetaData")
                    .number("duration", 0.04)
                    .keyframes(&[0.0], &[100.0], true)
                    .finish(),
            )
            .video(0, &avc_payload(1, 0, 0, &[0x01, 0x64, 0x00, 0x1F]))
            .audio(0, &audio_payload(0xAF, Some(0), &[0x12, 0x10]))
            .video(40, &avc_payload(2, 1, 80, &[0u8; 32]))
            .audio(23, &audio_payload(0xAF, Some(1), &[0u8; 16]))
            .build()
    }

    #[test]
    fn test_offsets_chain() {
        let (header, tags) = decode_all(sample_file(), DecoderConfig::default());
        let tags: Vec<Tag> = tags.into_iter().map(Result::unwrap).collect();

        assert_eq!(tags.len(), 5);
        assert_eq!(tags[0].offset, header.size());
        for (i, pair) in tags.windows(2).enumerate() {
            assert_eq!(pair[0].index as usize, i + 1);
            assert_eq!(
                pair[1].offset,
                pair[0].offset + 11 + pair[0].data_size() as u64 + 4
            );
            assert_eq!(pair[1].offset, pair[0].next_offset());
        }
        for tag in &tags {
            assert_eq!(tag.previous_tag_size, 11 + tag.data_size());
            assert!(tag.size_mismatch.is_none());
        }
    }

    #[test]
    fn test_tag_dispatch() {
        let (_, tags) = decode_all(sample_file(), DecoderConfig::default());
        let tags: Vec<Tag> = tags.into_iter().map(Result::unwrap).collect();

        assert!(tags[0].is_script_tag());
        let Some(ScriptPayload::Decoded(script)) = tags[0].script() else {
            panic!("expected decoded script data, got {:?}", tags[0].body);
        };
        assert_eq!(script.name.as_deref(), Some("onMetaData"));
        assert_eq!(script.properties.len(), 2);

        let video = tags[1].video().unwrap();
        assert!(video.is_sequence_header());
        assert_eq!(video.skipped, 4);

        let audio = tags[2].audio().unwrap();
        assert_eq!(audio.sound_format, Coded::Known(SoundFormat::Aac));
        assert_eq!(
            audio.aac_packet_type,
            Some(Coded::Known(AacPacketType::SequenceHeader))
        );

        assert_eq!(tags[3].video().unwrap().avc.unwrap().composition_time, 80);
        assert_eq!(tags[3].header.timestamp, 40);
    }

    #[test]
    fn test_stats() {
        let mut decoder = FlvDecoder::new(Cursor::new(sample_file())).unwrap();
        while decoder.next_tag().unwrap().is_some() {}

        assert!(decoder.is_done());
        assert_eq!(decoder.tag_count(), 5);
        assert_eq!(
            *decoder.stats(),
            DecodeStats {
                tags: 5,
                audio_tags: 2,
                video_tags: 2,
                script_tags: 1,
                unknown_tags: 0,
                size_mismatches: 0,
            }
        );
        assert!(decoder.next_tag().unwrap().is_none());
    }

    #[test]
    fn test_header_only_file() {
        let data = FlvBuilder::new(false, false).build();
        let (header, tags) = decode_all(data, DecoderConfig::default());
        assert_eq!(header.previous_tag_size, 0);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_size_mismatch_is_a_warning() {
        let mut bad_tag = tag_header_bytes(8, 2, 0).to_vec();
        bad_tag.extend_from_slice(&[0x2E, 0x00]);
        bad_tag.extend_from_slice(&99u32.to_be_bytes());

        let data = FlvBuilder::new(true, false)
            .raw(&bad_tag)
            .audio(10, &[0x2E, 0x01])
            .build();

        let (_, tags) = decode_all(data.clone(), DecoderConfig::default());
        assert_eq!(tags.len(), 2);
        let first = tags[0].as_ref().unwrap();
        assert_eq!(
            first.size_mismatch,
            Some(SizeMismatch {
                offset: 13 + 11 + 2,
                expected: 13,
                actual: 99,
            })
        );
        assert!(tags[1].as_ref().unwrap().size_mismatch.is_none());

        let ignore = DecoderConfig::default().with_prev_tag_size_mode(PrevTagSizeMode::Ignore);
        let (_, tags) = decode_all(data.clone(), ignore);
        assert!(tags[0].as_ref().unwrap().size_mismatch.is_none());

        let strict = DecoderConfig::default().with_prev_tag_size_mode(PrevTagSizeMode::Strict);
        let (_, tags) = decode_all(data, strict);
        assert_eq!(tags.len(), 1);
        assert!(matches!(tags[0], Err(DecodeError::SizeMismatch(_))));
    }

    #[test]
    fn test_nonzero_first_previous_tag_size() {
        let mut data = FlvBuilder::new(true, false).build();
        data[12] = 5;

        let (header, _) = decode_all(data.clone(), DecoderConfig::default());
        assert_eq!(header.previous_tag_size, 5);
        assert_eq!(header.size_mismatch.map(|m| m.offset), Some(9));

        let strict = DecoderConfig::default().with_prev_tag_size_mode(PrevTagSizeMode::Strict);
        assert!(matches!(
            decode_with_config(Cursor::new(data), strict),
            Err(DecodeError::SizeMismatch(_))
        ));
    }

    #[test]
    fn test_unknown_tag_type_policy() {
        let data = FlvBuilder::new(true, false)
            .tag(7, 0, &[1, 2, 3])
            .audio(0, &[0x2E, 0x00])
            .build();

        let (_, tags) = decode_all(data.clone(), DecoderConfig::default());
        assert_eq!(tags.len(), 1);
        assert!(matches!(
            tags[0],
            Err(DecodeError::UnknownTagType {
                offset: 13,
                tag_type: 7
            })
        ));

        let skip = DecoderConfig::default().with_unknown_tag_policy(UnknownTagPolicy::Skip);
        let (_, tags) = decode_all(data, skip);
        let tags: Vec<Tag> = tags.into_iter().map(Result::unwrap).collect();
        assert_eq!(tags.len(), 2);
        assert!(matches!(tags[0].body, TagBody::Skipped));
        assert_eq!(tags[0].tag_type(), FlvTagType::Unknown(7));
        assert!(tags[1].is_audio_tag());
        assert_eq!(tags[1].offset, 13 + 11 + 3 + 4);
    }

    #[test]
    fn test_truncated_before_final_previous_tag_size() {
        let mut data = sample_file();
        data.truncate(data.len() - 5);

        let (_, tags) = decode_all(data, DecoderConfig::default());
        assert_eq!(tags.len(), 5);
        assert!(tags[..4].iter().all(Result::is_ok));
        assert!(tags[4].as_ref().unwrap_err().is_unexpected_end());
    }

    #[test]
    fn test_truncated_final_previous_tag_size() {
        let mut data = sample_file();
        data.truncate(data.len() - 1);

        let (_, tags) = decode_all(data, DecoderConfig::default());
        assert!(tags.last().unwrap().as_ref().unwrap_err().is_unexpected_end());
    }

    #[test]
    fn test_malformed_script_does_not_stop_decoding() {
        let mut script = ScriptBuilder::new("onMetaData").unterminated();
        script.extend_from_slice(&[0x00, 0x01, b'x', 0x06, 0x00, 0x00, 0x09]);

        let data = FlvBuilder::new(true, false)
            .script(&script)
            .audio(0, &[0x2E, 0x00])
            .build();

        let (_, tags) = decode_all(data, DecoderConfig::default());
        let tags: Vec<Tag> = tags.into_iter().map(Result::unwrap).collect();
        assert_eq!(tags.len(), 2);
        assert!(matches!(
            tags[0].script().and_then(ScriptPayload::error),
            Some(DecodeError::MalformedScriptValue { marker: 6, .. })
        ));
        assert!(tags[1].is_audio_tag());
    }

    #[test]
    fn test_script_detail_disabled() {
        let config = DecoderConfig::default().with_script_detail(false);
        let (_, tags) = decode_all(sample_file(), config);
        let first = tags[0].as_ref().unwrap();
        assert!(matches!(
            first.script(),
            Some(ScriptPayload::Skipped { len }) if *len == first.data_size()
        ));
        assert_eq!(tags.len(), 5);
    }

    #[test]
    fn test_decode_is_repeatable() {
        let data = sample_file();
        let run = || {
            let (header, decoder) = decode(Cursor::new(data.clone())).unwrap();
            let tags: Vec<String> = decoder.map(|t| format!("{:?}", t.unwrap())).collect();
            (header, tags)
        };

        let first = run();
        let second = run();
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
        assert!(second.1[0].contains("index: 1"));
    }

    #[test]
    fn test_error_ends_iteration() {
        let mut data = sample_file();
        data.truncate(30);

        let (_, mut decoder) = decode(Cursor::new(data)).unwrap();
        assert!(decoder.next().unwrap().is_err());
        assert!(decoder.next().is_none());
    }
}
