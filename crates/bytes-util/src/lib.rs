//! Sequential big-endian reading over a finite, seekable byte source.
//!
//! [`ByteCursor`] is the single primitive the FLV and AMF0 decoders are built on.
//! Every read is explicit and exact-length: a read either returns all requested
//! bytes or fails with [`CursorError::UnexpectedEndOfInput`] without consuming
//! anything. The cursor knows the length of its source up front, so it never
//! relies on a short read to detect the end of input.

mod cursor;
mod error;

pub use cursor::ByteCursor;
pub use error::CursorError;
