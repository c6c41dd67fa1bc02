//! AMF0 values as they appear in FLV script data tags.
//!
//! Only the subset of AMF0 that FLV metadata uses is decoded: numbers,
//! booleans, short and long strings, anonymous objects and strict arrays of
//! numbers. Everything else is rejected with an error naming the marker, since
//! the encoded length of an unknown value cannot be derived.

mod decode;
mod define;
mod errors;

pub use decode::{Amf0Decoder, OBJECT_END};
pub use define::{Amf0Marker, Amf0Value};
pub use errors::Amf0ReadError;
