use std::io::{self, Cursor, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use crate::CursorError;

/// A big-endian reader over a finite byte source.
///
/// Offsets reported by the cursor are relative to the position the source was
/// at when the cursor was created.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    pos: u64,
    len: u64,
}

impl ByteCursor<Cursor<Bytes>> {
    /// Wrap an in-memory buffer. Unlike [`ByteCursor::new`] this cannot fail.
    pub fn from_bytes(data: Bytes) -> Self {
        let len = data.len() as u64;
        Self {
            inner: Cursor::new(data),
            pos: 0,
            len,
        }
    }
}

impl<R: Read + Seek> ByteCursor<R> {
    /// Wrap a seekable reader, measuring how many bytes remain in it.
    pub fn new(mut inner: R) -> Result<Self, CursorError> {
        let start = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;

        Ok(Self {
            inner,
            pos: 0,
            len: end.saturating_sub(start),
        })
    }

    /// Current read position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total length of the source.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left between the read position and the end of the source.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Returns true when no further byte can be read.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.pos >= self.len
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn ensure(&self, needed: u64) -> Result<(), CursorError> {
        let available = self.remaining();
        if needed > available {
            return Err(CursorError::UnexpectedEndOfInput {
                position: self.pos,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Map a short read from the underlying source (which can only happen if it
    /// shrank after we measured it) to the same error an up-front check gives.
    fn map_io(&self, needed: u64, err: io::Error) -> CursorError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CursorError::UnexpectedEndOfInput {
                position: self.pos,
                needed,
                available: self.remaining(),
            }
        } else {
            CursorError::Io(err)
        }
    }

    /// Read exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, CursorError> {
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| self.map_io(n as u64, e))?;
        self.pos += n as u64;
        Ok(Bytes::from(buf))
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        self.ensure(N as u64)?;
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| self.map_io(N as u64, e))?;
        self.pos += N as u64;
        Ok(buf)
    }

    /// Interpret `width` bytes (1..=4) as a big-endian unsigned integer.
    pub fn read_uint(&mut self, width: usize) -> Result<u32, CursorError> {
        if !(1..=4).contains(&width) {
            return Err(CursorError::InvalidWidth(width));
        }
        self.ensure(width as u64)?;
        let value = self
            .inner
            .read_uint::<BigEndian>(width)
            .map_err(|e| self.map_io(width as u64, e))?;
        self.pos += width as u64;
        Ok(value as u32)
    }

    /// Interpret `width` bytes (1..=4) as a big-endian two's complement integer.
    pub fn read_int(&mut self, width: usize) -> Result<i32, CursorError> {
        if !(1..=4).contains(&width) {
            return Err(CursorError::InvalidWidth(width));
        }
        self.ensure(width as u64)?;
        let value = self
            .inner
            .read_int::<BigEndian>(width)
            .map_err(|e| self.map_io(width as u64, e))?;
        self.pos += width as u64;
        Ok(value as i32)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.read_uint(1)? as u8)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        Ok(self.read_uint(2)? as u16)
    }

    #[inline]
    pub fn read_u24(&mut self) -> Result<u32, CursorError> {
        self.read_uint(3)
    }

    #[inline]
    pub fn read_i24(&mut self) -> Result<i32, CursorError> {
        self.read_int(3)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        self.read_uint(4)
    }

    /// Read an 8-byte big-endian IEEE-754 double.
    pub fn read_f64(&mut self) -> Result<f64, CursorError> {
        self.ensure(8)?;
        let value = self
            .inner
            .read_f64::<BigEndian>()
            .map_err(|e| self.map_io(8, e))?;
        self.pos += 8;
        Ok(value)
    }

    /// Move the read position by `delta` bytes.
    ///
    /// Moving before the start of the source is an [`CursorError::InvalidSeek`],
    /// moving past its end is an [`CursorError::UnexpectedEndOfInput`].
    pub fn seek_relative(&mut self, delta: i64) -> Result<(), CursorError> {
        let target = self.pos as i128 + delta as i128;
        if target < 0 {
            return Err(CursorError::InvalidSeek {
                position: self.pos,
                delta,
            });
        }
        if target > self.len as i128 {
            return Err(CursorError::UnexpectedEndOfInput {
                position: self.pos,
                needed: delta as u64,
                available: self.remaining(),
            });
        }

        self.inner.seek(SeekFrom::Current(delta))?;
        self.pos = target as u64;
        Ok(())
    }

    /// Advance past `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<(), CursorError> {
        self.ensure(n)?;
        let delta = i64::try_from(n).map_err(|_| CursorError::UnexpectedEndOfInput {
            position: self.pos,
            needed: n,
            available: self.remaining(),
        })?;
        self.seek_relative(delta)
    }

    /// Return the next `n` bytes without consuming them.
    pub fn peek(&mut self, n: usize) -> Result<Bytes, CursorError> {
        let bytes = self.read_bytes(n)?;
        self.seek_relative(-(n as i64))?;
        Ok(bytes)
    }

    /// Check whether the source continues with `pattern`, without consuming it.
    /// Returns `false` when fewer than `pattern.len()` bytes remain.
    pub fn next_is(&mut self, pattern: &[u8]) -> Result<bool, CursorError> {
        if self.remaining() < pattern.len() as u64 {
            return Ok(false);
        }
        Ok(self.peek(pattern.len())?.as_ref() == pattern)
    }

    /// Consume `pattern` if the source continues with it.
    pub fn consume_if(&mut self, pattern: &[u8]) -> Result<bool, CursorError> {
        if self.next_is(pattern)? {
            self.skip(pattern.len() as u64)?;
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn cursor(data: &[u8]) -> ByteCursor<Cursor<Bytes>> {
        ByteCursor::from_bytes(Bytes::copy_from_slice(data))
    }

    #[test]
    fn test_fixed_width_reads() {
        let mut data = vec![0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x01, 0x02];
        data.write_f64::<BigEndian>(772.161).unwrap();

        let mut c = cursor(&data);
        assert_eq!(c.read_u8().unwrap(), 0x12);
        assert_eq!(c.read_u16().unwrap(), 0x3456);
        assert_eq!(c.read_u24().unwrap(), 0x789ABC);
        assert_eq!(c.read_u32().unwrap(), 0xDEF00102);
        assert_eq!(c.read_f64().unwrap(), 772.161);
        assert!(c.at_end());
        assert_eq!(c.position(), 18);
    }

    #[test]
    fn test_signed_24_bit() {
        let mut c = cursor(&[0xFF, 0xFF, 0xFE, 0x00, 0x00, 0x21]);
        assert_eq!(c.read_i24().unwrap(), -2);
        assert_eq!(c.read_i24().unwrap(), 33);
    }

    #[test]
    fn test_short_read_does_not_consume() {
        let mut c = cursor(&[0x01, 0x02, 0x03]);
        let err = c.read_u32().unwrap_err();
        assert!(matches!(
            err,
            CursorError::UnexpectedEndOfInput {
                position: 0,
                needed: 4,
                available: 3
            }
        ));
        assert_eq!(c.position(), 0);
        assert_eq!(c.read_u24().unwrap(), 0x010203);
    }

    #[test]
    fn test_invalid_width() {
        let mut c = cursor(&[0; 8]);
        assert!(matches!(c.read_uint(0), Err(CursorError::InvalidWidth(0))));
        assert!(matches!(c.read_uint(5), Err(CursorError::InvalidWidth(5))));
    }

    #[test]
    fn test_seek_relative_bounds() {
        let mut c = cursor(&[0, 1, 2, 3, 4]);
        c.seek_relative(3).unwrap();
        assert_eq!(c.read_u8().unwrap(), 3);
        c.seek_relative(-4).unwrap();
        assert_eq!(c.read_u8().unwrap(), 0);

        let err = c.seek_relative(-2).unwrap_err();
        assert!(matches!(
            err,
            CursorError::InvalidSeek {
                position: 1,
                delta: -2
            }
        ));
        assert_eq!(c.position(), 1);

        assert!(c.seek_relative(10).unwrap_err().is_unexpected_end());
        c.seek_relative(4).unwrap();
        assert!(c.at_end());
    }

    #[test]
    fn test_peek_and_consume_if() {
        let mut c = cursor(&[0x00, 0x00, 0x09, 0xAA]);
        assert_eq!(c.peek(3).unwrap().as_ref(), &[0x00, 0x00, 0x09]);
        assert_eq!(c.position(), 0);

        assert!(!c.consume_if(&[0x00, 0x00, 0x08]).unwrap());
        assert_eq!(c.position(), 0);
        assert!(c.consume_if(&[0x00, 0x00, 0x09]).unwrap());
        assert_eq!(c.position(), 3);

        // Not enough bytes left to match is a plain "no".
        assert!(!c.next_is(&[0xAA, 0x00]).unwrap());
        assert_eq!(c.read_u8().unwrap(), 0xAA);
    }

    #[test]
    fn test_new_measures_from_current_position() {
        let mut inner = Cursor::new(vec![9u8, 8, 7, 6]);
        inner.set_position(1);
        let mut c = ByteCursor::new(inner).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.read_u8().unwrap(), 8);
        assert_eq!(c.position(), 1);
        assert!(matches!(
            c.seek_relative(-2),
            Err(CursorError::InvalidSeek { .. })
        ));
    }
}
