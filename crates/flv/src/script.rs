//! Script data (metadata) payloads.
//!
//! A script payload is a fixed-shape AMF0 sequence: one string value (the
//! handler name, usually `onMetaData`) followed by an ECMA array of named
//! values. The array's element count is advisory; the object-end marker is
//! what terminates it. Values may be numbers, booleans, strings, long strings
//! or an object such as `keyframes`, whose members are scalars or strict arrays
//! of numbers.
//!
//! The payload is read into memory as a slice of exactly `data_size` bytes and
//! decoded from there, so a malformed value never desynchronizes the tag stream.

use std::io::{Cursor, Read, Seek};

use amf0::{Amf0Decoder, Amf0Marker, Amf0ReadError, Amf0Value};
use bytes::Bytes;
use bytes_util::ByteCursor;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::tag::TagBody;

/// Members decoded for a nested object, e.g. `keyframes { filepositions, times }`.
const NESTED_OBJECT_MEMBERS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptData {
    /// The top-level string value
    pub name: Option<String>,
    /// Length prefix of the name as stored, before lossy UTF-8 decoding
    pub name_size: Option<u16>,
    /// The advisory element count stored with the ECMA array
    pub array_size: Option<u32>,
    pub properties: Vec<(String, Amf0Value)>,
    /// Payload bytes left over after the array terminator
    pub trailing: u64,
}

#[derive(Debug)]
pub enum ScriptPayload {
    Decoded(ScriptData),
    /// Decoding stopped at `error`; `data` holds what was decoded before it.
    Malformed {
        data: ScriptData,
        error: DecodeError,
    },
    /// Script decoding is disabled; the payload was skipped.
    Skipped { len: u32 },
}

impl ScriptPayload {
    pub fn data(&self) -> Option<&ScriptData> {
        match self {
            ScriptPayload::Decoded(data) | ScriptPayload::Malformed { data, .. } => Some(data),
            ScriptPayload::Skipped { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DecodeError> {
        match self {
            ScriptPayload::Malformed { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl ScriptData {
    /// Look up a top-level property.
    pub fn get(&self, name: &str) -> Option<&Amf0Value> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Decode a script payload that starts at stream offset `base`.
    ///
    /// Returns both the values decoded so far and the error that stopped
    /// decoding, if any.
    pub fn demux(payload: Bytes, base: u64) -> (ScriptData, Option<DecodeError>) {
        let mut cursor = ByteCursor::from_bytes(payload);
        let mut data = ScriptData::default();

        let error = data.read_body(&mut cursor).err().map(|e| {
            // Every type error is raised right after its marker byte was read.
            let marker_offset = base + cursor.position().saturating_sub(1);
            DecodeError::from_amf0_at(e, base, marker_offset)
        });

        data.trailing = cursor.remaining();
        if error.is_none() && data.trailing > 0 {
            debug!(trailing = data.trailing, "bytes left after script data");
        }

        (data, error)
    }

    fn read_body(&mut self, cursor: &mut ByteCursor<Cursor<Bytes>>) -> Result<(), Amf0ReadError> {
        let mut amf = Amf0Decoder::new(cursor);

        amf.expect_marker(Amf0Marker::String)?;
        let start = amf.position();
        let name = amf.read_string()?;
        self.name_size = Some((amf.position() - start - 2) as u16);
        self.name = Some(name);

        amf.expect_marker(Amf0Marker::EcmaArray)?;
        let array_size = amf.read_array_len()?;
        self.array_size = Some(array_size);

        loop {
            if amf.read_object_end()? {
                break;
            }

            let name = amf.read_string()?;
            let marker = amf.read_marker()?;
            let value = match marker {
                Amf0Marker::Object => read_nested_object(&mut amf)?,
                _ => amf.read_scalar(marker)?,
            };
            self.properties.push((name, value));

            // A nested object without its own end marker takes the array's
            // terminator when it is the last property.
            if marker == Amf0Marker::Object && amf.is_empty() {
                debug!("nested object consumed the ECMA array terminator");
                break;
            }
        }

        if self.properties.len() != array_size as usize {
            debug!(
                declared = array_size,
                decoded = self.properties.len(),
                "ECMA array size differs from its contents"
            );
        }

        // Some encoders write a second end marker after the array.
        if amf.read_object_end()? {
            debug!("consumed extra object end marker after ECMA array");
        }

        Ok(())
    }
}

/// Read the members of a nested object. An end marker may or may not follow
/// the members; both are accepted.
fn read_nested_object<R: Read + Seek>(
    amf: &mut Amf0Decoder<'_, R>,
) -> Result<Amf0Value, Amf0ReadError> {
    let mut members = Vec::with_capacity(NESTED_OBJECT_MEMBERS);

    if amf.read_object_end()? {
        return Ok(Amf0Value::Object(members));
    }

    while members.len() < NESTED_OBJECT_MEMBERS {
        if amf.is_object_end()? {
            break;
        }

        let name = amf.read_string()?;
        let marker = amf.read_marker()?;
        let value = match marker {
            Amf0Marker::StrictArray => Amf0Value::StrictArray(
                amf.read_number_array()?
                    .into_iter()
                    .map(Amf0Value::Number)
                    .collect(),
            ),
            _ => amf.read_scalar(marker)?,
        };
        members.push((name, value));
    }

    amf.read_object_end()?;

    Ok(Amf0Value::Object(members))
}

/// Decode a script payload of `data_size` bytes, leaving the cursor right after it.
pub fn demux<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    data_size: u32,
) -> Result<TagBody, DecodeError> {
    let base = cursor.position();
    let payload = cursor.read_bytes(data_size as usize)?;

    let (data, error) = ScriptData::demux(payload, base);
    let payload = match error {
        None => ScriptPayload::Decoded(data),
        Some(error) => {
            warn!(offset = base, %error, "malformed script data");
            ScriptPayload::Malformed { data, error }
        }
    };

    Ok(TagBody::Script(payload))
}

/// Skip a script payload of `data_size` bytes without decoding it.
pub fn skip<R: Read + Seek>(
    cursor: &mut ByteCursor<R>,
    data_size: u32,
) -> Result<TagBody, DecodeError> {
    cursor.skip(data_size as u64)?;
    Ok(TagBody::Script(ScriptPayload::Skipped { len: data_size }))
}
