//! Shared FLV test builders.
//!
//! This module is available for local flv tests and optionally for downstream
//! crate tests when the `test-utils` feature is enabled.

use crate::header::FLV_HEADER_SIZE;
use crate::framing::TAG_HEADER_SIZE;

pub const AUDIO: u8 = 8;
pub const VIDEO: u8 = 9;
pub const SCRIPT: u8 = 18;

/// Encode the 9-byte header (flags: bit 2 audio, bit 0 video) and `PreviousTagSize0`.
pub fn header_bytes(has_audio: bool, has_video: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(FLV_HEADER_SIZE as usize + 4);
    out.extend_from_slice(b"FLV");
    out.push(0x01);

    let mut flags = 0u8;
    if has_video {
        flags |= 0x01;
    }
    if has_audio {
        flags |= 0x04;
    }
    out.push(flags);

    out.extend_from_slice(&FLV_HEADER_SIZE.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out
}

/// Encode an 11-byte tag header.
pub fn tag_header_bytes(tag_type: u8, data_size: u32, timestamp_ms: u32) -> [u8; 11] {
    let mut out = [0u8; 11];
    out[0] = tag_type;

    // DataSize is UI24.
    out[1] = (data_size >> 16) as u8;
    out[2] = (data_size >> 8) as u8;
    out[3] = data_size as u8;

    // Timestamp: lower 24 bits + extended 8 bits.
    out[4] = (timestamp_ms >> 16) as u8;
    out[5] = (timestamp_ms >> 8) as u8;
    out[6] = timestamp_ms as u8;
    out[7] = (timestamp_ms >> 24) as u8;

    // StreamID stays 0.
    out
}

/// Encode a whole tag: header, payload and the correct trailing `PreviousTagSize`.
pub fn tag_bytes(tag_type: u8, timestamp_ms: u32, payload: &[u8]) -> Vec<u8> {
    let data_size = payload.len() as u32;
    let mut out = Vec::with_capacity(TAG_HEADER_SIZE as usize + payload.len() + 4);
    out.extend_from_slice(&tag_header_bytes(tag_type, data_size, timestamp_ms));
    out.extend_from_slice(payload);
    out.extend_from_slice(&(TAG_HEADER_SIZE + data_size).to_be_bytes());
    out
}

/// Audio payload: packed flags, optional AAC packet type, then `body`.
pub fn audio_payload(flags: u8, aac_packet_type: Option<u8>, body: &[u8]) -> Vec<u8> {
    let mut out = vec![flags];
    out.extend(aac_packet_type);
    out.extend_from_slice(body);
    out
}

/// AVC video payload: frame type and codec 7, packet type, composition time, then `body`.
pub fn avc_payload(frame_type: u8, packet_type: u8, composition_time: i32, body: &[u8]) -> Vec<u8> {
    let mut out = vec![(frame_type << 4) | 7, packet_type];
    out.extend_from_slice(&composition_time.to_be_bytes()[1..]);
    out.extend_from_slice(body);
    out
}

fn push_name(out: &mut Vec<u8>, name: &str) {
    out.extend_from_slice(&(name.len() as u16).to_be_bytes());
    out.extend_from_slice(name.as_bytes());
}

/// Builds an `onMetaData`-style script payload.
pub struct ScriptBuilder {
    name: String,
    array_size: Option<u32>,
    count: u32,
    body: Vec<u8>,
    extra_end_marker: bool,
}

impl ScriptBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            array_size: None,
            count: 0,
            body: Vec::new(),
            extra_end_marker: false,
        }
    }

    /// Override the declared element count (defaults to the number of properties).
    pub fn array_size(mut self, size: u32) -> Self {
        self.array_size = Some(size);
        self
    }

    pub fn number(mut self, name: &str, value: f64) -> Self {
        push_name(&mut self.body, name);
        self.body.push(0x00);
        self.body.extend_from_slice(&value.to_be_bytes());
        self.count += 1;
        self
    }

    pub fn boolean(mut self, name: &str, value: bool) -> Self {
        push_name(&mut self.body, name);
        self.body.extend_from_slice(&[0x01, value as u8]);
        self.count += 1;
        self
    }

    pub fn string(mut self, name: &str, value: &str) -> Self {
        push_name(&mut self.body, name);
        self.body.push(0x02);
        push_name(&mut self.body, value);
        self.count += 1;
        self
    }

    pub fn long_string(mut self, name: &str, value: &str) -> Self {
        push_name(&mut self.body, name);
        self.body.push(0x0c);
        self.body
            .extend_from_slice(&(value.len() as u32).to_be_bytes());
        self.body.extend_from_slice(value.as_bytes());
        self.count += 1;
        self
    }

    /// A `keyframes` object with `times` and `filepositions` strict arrays.
    pub fn keyframes(mut self, times: &[f64], positions: &[f64], object_end: bool) -> Self {
        push_name(&mut self.body, "keyframes");
        self.body.push(0x03);
        for (name, values) in [("times", times), ("filepositions", positions)] {
            push_name(&mut self.body, name);
            self.body.push(0x0a);
            self.body
                .extend_from_slice(&(values.len() as u32).to_be_bytes());
            for value in values {
                self.body.push(0x00);
                self.body.extend_from_slice(&value.to_be_bytes());
            }
        }
        if object_end {
            self.body.extend_from_slice(&[0x00, 0x00, 0x09]);
        }
        self.count += 1;
        self
    }

    /// Append a second end marker after the array terminator.
    pub fn extra_end_marker(mut self) -> Self {
        self.extra_end_marker = true;
        self
    }

    /// The payload without the array terminator.
    pub fn unterminated(self) -> Vec<u8> {
        let mut out = vec![0x02];
        push_name(&mut out, &self.name);
        out.push(0x08);
        out.extend_from_slice(&self.array_size.unwrap_or(self.count).to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    pub fn finish(self) -> Vec<u8> {
        let extra = self.extra_end_marker;
        let mut out = self.unterminated();
        out.extend_from_slice(&[0x00, 0x00, 0x09]);
        if extra {
            out.extend_from_slice(&[0x00, 0x00, 0x09]);
        }
        out
    }
}

/// Builds a complete FLV byte stream.
pub struct FlvBuilder {
    buf: Vec<u8>,
}

impl FlvBuilder {
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        Self {
            buf: header_bytes(has_audio, has_video),
        }
    }

    pub fn tag(mut self, tag_type: u8, timestamp_ms: u32, payload: &[u8]) -> Self {
        self.buf
            .extend_from_slice(&tag_bytes(tag_type, timestamp_ms, payload));
        self
    }

    pub fn audio(self, timestamp_ms: u32, payload: &[u8]) -> Self {
        self.tag(AUDIO, timestamp_ms, payload)
    }

    pub fn video(self, timestamp_ms: u32, payload: &[u8]) -> Self {
        self.tag(VIDEO, timestamp_ms, payload)
    }

    pub fn script(self, payload: &[u8]) -> Self {
        self.tag(SCRIPT, 0, payload)
    }

    /// Append raw bytes, e.g. a tag with a deliberately wrong `PreviousTagSize`.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
