//! Flattened label/value view of decoded FLV data.
//!
//! A dump is a sequence of [`RecordBlock`]s: one for the file header, then one
//! per tag. Each block keeps the stream offset it was decoded from and its
//! records in wire order. Presentation (alignment, separators, JSON) is left
//! to the emitter.

use std::fmt;

use amf0::Amf0Value;
use serde::Serialize;

use crate::header::FlvHeader;
use crate::script::{ScriptData, ScriptPayload};
use crate::tag::{SizeMismatch, Tag, TagBody};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Text(text) => f.write_str(text),
            RecordValue::Unsigned(value) => write!(f, "{value}"),
            RecordValue::Signed(value) => write!(f, "{value}"),
            // Debug keeps the fractional part of whole numbers, e.g. `1920.0`.
            RecordValue::Float(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        RecordValue::Text(value.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        RecordValue::Text(value)
    }
}

impl From<u32> for RecordValue {
    fn from(value: u32) -> Self {
        RecordValue::Unsigned(value as u64)
    }
}

impl From<u8> for RecordValue {
    fn from(value: u8) -> Self {
        RecordValue::Unsigned(value as u64)
    }
}

impl From<bool> for RecordValue {
    fn from(value: bool) -> Self {
        RecordValue::Unsigned(value as u64)
    }
}

impl From<i32> for RecordValue {
    fn from(value: i32) -> Self {
        RecordValue::Signed(value as i64)
    }
}

impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        RecordValue::Float(value)
    }
}

/// One labelled field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub label: String,
    pub value: RecordValue,
    /// Nesting level inside a script object, 0 for top-level fields
    #[serde(skip_serializing_if = "is_top_level")]
    pub depth: u8,
}

fn is_top_level(depth: &u8) -> bool {
    *depth == 0
}

impl Record {
    pub fn new(label: impl Into<String>, value: impl Into<RecordValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            depth: 0,
        }
    }

    pub fn nested(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    FileHeader,
    Tag { index: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordBlock {
    #[serde(flatten)]
    pub kind: BlockKind,
    pub offset: u64,
    pub records: Vec<Record>,
}

impl RecordBlock {
    /// Look up the first record with `label`.
    pub fn get(&self, label: &str) -> Option<&RecordValue> {
        self.records
            .iter()
            .find(|record| record.label == label)
            .map(|record| &record.value)
    }
}

fn push_size_mismatch(records: &mut Vec<Record>, mismatch: &Option<SizeMismatch>) {
    if let Some(mismatch) = mismatch {
        records.push(Record::new(
            "SizeMismatch",
            format!("expected {}, got {}", mismatch.expected, mismatch.actual),
        ));
    }
}

impl FlvHeader {
    pub fn to_records(&self) -> RecordBlock {
        let mut records = vec![
            Record::new("Signature", self.signature_str()),
            Record::new("Version", self.version),
            Record::new("TypeFlagsReserved", self.flags_reserved),
            Record::new("TypeFlagsAudio", self.has_audio),
            Record::new("TypeFlagsReserved", self.flags_reserved2),
            Record::new("TypeFlagsVideo", self.has_video),
            Record::new("DataOffset", self.data_offset),
            Record::new("PreviousTagSize", self.previous_tag_size),
        ];
        push_size_mismatch(&mut records, &self.size_mismatch);

        RecordBlock {
            kind: BlockKind::FileHeader,
            offset: 0,
            records,
        }
    }
}

impl Tag {
    pub fn to_records(&self) -> RecordBlock {
        let header = &self.header;
        let mut records = vec![
            Record::new("TagType", header.tag_type.to_string()),
            Record::new("DataSize", header.data_size),
            Record::new("Timestamp", header.timestamp),
            Record::new("TimestampExtended", header.timestamp_extended),
            Record::new("StreamID", header.stream_id),
        ];

        match &self.body {
            TagBody::Audio(audio) => {
                records.push(Record::new("SoundFormat", audio.sound_format.to_string()));
                records.push(Record::new("SoundRate", audio.sound_rate.to_string()));
                records.push(Record::new("SoundSize", audio.sound_size.to_string()));
                records.push(Record::new("SoundType", audio.sound_type.to_string()));
                if let Some(packet_type) = audio.aac_packet_type {
                    records.push(Record::new("ACC Packet Type", packet_type.to_string()));
                }
            }
            TagBody::Video(video) => {
                records.push(Record::new("FrameType", video.frame_type.to_string()));
                records.push(Record::new("CodecID", video.codec_id.to_string()));
                if let Some(avc) = video.avc {
                    records.push(Record::new("AVC Packet Type", avc.packet_type.to_string()));
                    records.push(Record::new("CompositionTime", avc.composition_time));
                }
            }
            TagBody::Script(payload) => {
                if let Some(data) = payload.data() {
                    script_records(&mut records, data);
                }
                if let ScriptPayload::Malformed { error, .. } = payload {
                    records.push(Record::new("Error", error.to_string()));
                }
            }
            TagBody::Truncated { required } => {
                records.push(Record::new(
                    "Payload",
                    format!("truncated, {required} bytes required"),
                ));
            }
            TagBody::Skipped => {
                records.push(Record::new("Payload", "skipped"));
            }
        }

        records.push(Record::new("PreviousTagSize", self.previous_tag_size));
        push_size_mismatch(&mut records, &self.size_mismatch);

        RecordBlock {
            kind: BlockKind::Tag { index: self.index },
            offset: self.offset,
            records,
        }
    }
}

fn script_records(records: &mut Vec<Record>, data: &ScriptData) {
    let Some(name) = &data.name else {
        return;
    };
    records.push(Record::new("Type", 2u8));
    let name_size = data.name_size.map_or(name.len() as u32, u32::from);
    records.push(Record::new("String Size", name_size));
    records.push(Record::new("String", name.as_str()));

    let Some(array_size) = data.array_size else {
        return;
    };
    records.push(Record::new("Type", 8u8));
    records.push(Record::new("Array Size", array_size));

    for (key, value) in &data.properties {
        match value.as_object_properties() {
            Some(members) => {
                records.push(Record::new(key.as_str(), ""));
                for (member, value) in members {
                    member_records(records, member, value);
                }
            }
            None => records.push(Record::new(key.as_str(), scalar_value(value))),
        }
    }
}

fn member_records(records: &mut Vec<Record>, name: &str, value: &Amf0Value) {
    match value.as_array() {
        Some(items) => {
            records.push(Record::new(name, "").nested(1));
            records.push(Record::new("key_frame_num", items.len() as u32).nested(1));
            for (i, item) in items.iter().enumerate() {
                let label = format!("keyframe[{i}]");
                records.push(Record::new(label, scalar_value(item)).nested(2));
            }
        }
        None => records.push(Record::new(name, scalar_value(value)).nested(1)),
    }
}

fn scalar_value(value: &Amf0Value) -> RecordValue {
    if let Some(number) = value.as_number() {
        return RecordValue::Float(number);
    }
    if let Some(flag) = value.as_bool() {
        return RecordValue::from(flag);
    }
    match value.as_str() {
        Some(text) => RecordValue::from(text),
        None => RecordValue::Text(format!("<{:?}>", value.marker())),
    }
}
