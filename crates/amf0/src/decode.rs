use std::io::{Read, Seek};

use bytes_util::ByteCursor;
use tracing::trace;

use super::{Amf0Marker, Amf0ReadError, Amf0Value};

/// The object-end marker: an empty property name followed by marker 0x09.
pub const OBJECT_END: [u8; 3] = [0x00, 0x00, 0x09];

/// Size of one strict array entry as FLV keyframe tables encode it:
/// a number marker followed by an 8-byte double.
const NUMBER_ENTRY_SIZE: u64 = 9;

/// An AMF0 Decoder.
///
/// The decoder borrows a [`ByteCursor`] and reads values from its current
/// position, so callers can interleave AMF0 reads with their own framing.
pub struct Amf0Decoder<'c, R> {
    cursor: &'c mut ByteCursor<R>,
}

impl<'c, R: Read + Seek> Amf0Decoder<'c, R> {
    /// Create a new AMF0 decoder.
    pub fn new(cursor: &'c mut ByteCursor<R>) -> Self {
        Self { cursor }
    }

    /// Check if the decoder has reached the end of the AMF0 data.
    pub fn is_empty(&self) -> bool {
        self.cursor.at_end()
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Read a marker byte.
    pub fn read_marker(&mut self) -> Result<Amf0Marker, Amf0ReadError> {
        let byte = self.cursor.read_u8()?;
        Amf0Marker::try_from(byte).map_err(Amf0ReadError::UnknownMarker)
    }

    /// Read a marker byte and check that it is `expected`.
    pub fn expect_marker(&mut self, expected: Amf0Marker) -> Result<(), Amf0ReadError> {
        let got = self.read_marker()?;
        if got != expected {
            return Err(Amf0ReadError::WrongType { expected, got });
        }
        Ok(())
    }

    pub fn read_number(&mut self) -> Result<f64, Amf0ReadError> {
        Ok(self.cursor.read_f64()?)
    }

    pub fn read_bool(&mut self) -> Result<bool, Amf0ReadError> {
        Ok(self.cursor.read_u8()? > 0)
    }

    /// Read a u16 length-prefixed string. Property names use the same encoding.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; a dump should still show
    /// the rest of the metadata.
    pub fn read_string(&mut self) -> Result<String, Amf0ReadError> {
        let len = self.cursor.read_u16()? as usize;
        let bytes = self.cursor.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read a u32 length-prefixed string.
    pub fn read_long_string(&mut self) -> Result<String, Amf0ReadError> {
        let len = self.cursor.read_u32()? as usize;
        let bytes = self.cursor.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the 4-byte length that follows an ECMA array or strict array marker.
    pub fn read_array_len(&mut self) -> Result<u32, Amf0ReadError> {
        Ok(self.cursor.read_u32()?)
    }

    /// Check for the object-end marker without consuming it.
    pub fn is_object_end(&mut self) -> Result<bool, Amf0ReadError> {
        Ok(self.cursor.next_is(&OBJECT_END)?)
    }

    /// Consume the object-end marker if it is next.
    pub fn read_object_end(&mut self) -> Result<bool, Amf0ReadError> {
        Ok(self.cursor.consume_if(&OBJECT_END)?)
    }

    /// Read the body of a strict array whose entries are all numbers.
    ///
    /// FLV keyframe tables (`times`, `filepositions`) are encoded this way. An
    /// entry with any other marker is rejected since its size is not fixed.
    pub fn read_number_array(&mut self) -> Result<Vec<f64>, Amf0ReadError> {
        let len = self.read_array_len()?;
        trace!(len, position = self.position(), "reading number array");

        // The count comes from the input; don't trust it for the allocation.
        let bound = self.cursor.remaining() / NUMBER_ENTRY_SIZE;
        let mut values = Vec::with_capacity((len as u64).min(bound) as usize);

        for _ in 0..len {
            self.expect_marker(Amf0Marker::Number)?;
            values.push(self.read_number()?);
        }

        Ok(values)
    }

    /// Read a scalar value body for `marker`.
    ///
    /// Containers are framed by the caller; passing a container marker (or any
    /// marker without a fixed layout) yields [`Amf0ReadError::UnsupportedType`].
    pub fn read_scalar(&mut self, marker: Amf0Marker) -> Result<Amf0Value, Amf0ReadError> {
        match marker {
            Amf0Marker::Number => Ok(Amf0Value::Number(self.read_number()?)),
            Amf0Marker::Boolean => Ok(Amf0Value::Boolean(self.read_bool()?)),
            Amf0Marker::String => Ok(Amf0Value::String(self.read_string()?)),
            Amf0Marker::LongString => Ok(Amf0Value::LongString(self.read_long_string()?)),
            _ => Err(Amf0ReadError::UnsupportedType(marker)),
        }
    }

    /// Read a marker followed by a scalar value.
    pub fn decode_scalar(&mut self) -> Result<Amf0Value, Amf0ReadError> {
        let marker = self.read_marker()?;
        self.read_scalar(marker)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};
    use bytes::Bytes;
    use bytes_util::CursorError;

    fn cursor(data: Vec<u8>) -> ByteCursor<std::io::Cursor<Bytes>> {
        ByteCursor::from_bytes(Bytes::from(data))
    }

    #[test]
    fn test_reader_bool() {
        let mut c = cursor(vec![0x01, 0x01]); // true
        let mut amf_reader = Amf0Decoder::new(&mut c);
        let value = amf_reader.decode_scalar().unwrap();
        assert_eq!(value, Amf0Value::Boolean(true));
    }

    #[test]
    fn test_reader_number() {
        let mut amf0_number = vec![0x00];
        amf0_number.extend_from_slice(&772.161_f64.to_be_bytes());

        let mut c = cursor(amf0_number);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        let value = amf_reader.decode_scalar().unwrap();
        assert_eq!(value, Amf0Value::Number(772.161));
        assert!(amf_reader.is_empty());
    }

    #[test]
    fn test_reader_string() {
        let mut amf0_string = vec![0x02, 0x00, 0x0b]; // 11 bytes
        amf0_string.extend_from_slice(b"Hello World");

        let mut c = cursor(amf0_string);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        let value = amf_reader.decode_scalar().unwrap();
        assert_eq!(value, Amf0Value::String("Hello World".into()));
    }

    #[test]
    fn test_reader_long_string() {
        let mut amf0_string = vec![0x0c, 0x00, 0x00, 0x00, 0x0b]; // 11 bytes
        amf0_string.extend_from_slice(b"Hello World");

        let mut c = cursor(amf0_string);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        let value = amf_reader.decode_scalar().unwrap();
        assert_eq!(value, Amf0Value::LongString("Hello World".into()));
    }

    #[test]
    fn test_reader_invalid_utf8_is_replaced() {
        let mut c = cursor(vec![0x00, 0x02, 0xC3, 0x28]);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        assert_eq!(amf_reader.read_string().unwrap(), "\u{FFFD}(");
    }

    #[test]
    fn test_reader_number_array() {
        let mut data = Vec::new();
        data.write_u32::<BigEndian>(2).unwrap();
        data.push(0x00);
        data.write_f64::<BigEndian>(0.0).unwrap();
        data.push(0x00);
        data.write_f64::<BigEndian>(4.5).unwrap();

        let mut c = cursor(data);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        assert_eq!(amf_reader.read_number_array().unwrap(), vec![0.0, 4.5]);
        assert!(amf_reader.is_empty());
    }

    #[test]
    fn test_reader_number_array_rejects_other_entries() {
        let mut data = Vec::new();
        data.write_u32::<BigEndian>(1).unwrap();
        data.extend_from_slice(&[0x01, 0x01]);

        let mut c = cursor(data);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        assert!(matches!(
            amf_reader.read_number_array(),
            Err(Amf0ReadError::WrongType {
                expected: Amf0Marker::Number,
                got: Amf0Marker::Boolean
            })
        ));
    }

    #[test]
    fn test_reader_number_array_huge_count_is_truncation() {
        let mut data = Vec::new();
        data.write_u32::<BigEndian>(u32::MAX).unwrap();
        data.push(0x00);

        let mut c = cursor(data);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        assert!(matches!(
            amf_reader.read_number_array(),
            Err(Amf0ReadError::Cursor(CursorError::UnexpectedEndOfInput { .. }))
        ));
    }

    #[test]
    fn test_object_end_lookahead() {
        let mut c = cursor(vec![0x00, 0x00, 0x09, 0x00, 0x01]);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        assert!(amf_reader.is_object_end().unwrap());
        assert_eq!(amf_reader.position(), 0);
        assert!(amf_reader.read_object_end().unwrap());
        assert_eq!(amf_reader.position(), 3);
        assert!(!amf_reader.read_object_end().unwrap());
        assert_eq!(amf_reader.position(), 3);
    }

    #[test]
    fn test_reader_invalid_marker() {
        let mut c = cursor(vec![Amf0Marker::Unsupported as u8]);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        let result = amf_reader.decode_scalar();

        assert!(matches!(
            result,
            Err(Amf0ReadError::UnsupportedType(Amf0Marker::Unsupported))
        ));

        let mut c = cursor(vec![0xFF]);
        let mut amf_reader = Amf0Decoder::new(&mut c);
        let err = amf_reader.decode_scalar().unwrap_err();
        assert!(matches!(err, Amf0ReadError::UnknownMarker(0xFF)));
        assert_eq!(err.marker_byte(), Some(0xFF));
    }

    #[test]
    fn test_truncated_input_returns_error() {
        // Truncated number (marker + only 3 bytes of 8-byte f64)
        let mut c = cursor(vec![0x00, 0x40, 0x59, 0x00]);
        let mut reader = Amf0Decoder::new(&mut c);
        let result = reader.decode_scalar();
        assert!(matches!(result, Err(Amf0ReadError::Cursor(_))));

        // Truncated string (claims 11 bytes but only has 3)
        let mut c = cursor(vec![0x02, 0x00, 0x0b, b'H', b'e', b'l']);
        let mut reader = Amf0Decoder::new(&mut c);
        let result = reader.decode_scalar();
        assert!(matches!(result, Err(Amf0ReadError::Cursor(_))));
    }
}
