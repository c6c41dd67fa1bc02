use std::fmt;

use num_traits::FromPrimitive;

/// A bit-field decoded from a tag payload.
///
/// Codes outside the known table are kept as `Unknown` so a dump can still show
/// them; the field widths are fixed, so an unknown code never affects how many
/// bytes are consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coded<T> {
    Known(T),
    Unknown(u8),
}

impl<T: FromPrimitive> Coded<T> {
    pub fn from_code(code: u8) -> Self {
        match T::from_u8(code) {
            Some(value) => Coded::Known(value),
            None => Coded::Unknown(code),
        }
    }
}

impl<T: Copy> Coded<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Coded::Known(value) => Some(*value),
            Coded::Unknown(_) => None,
        }
    }
}

impl<T: PartialEq> Coded<T> {
    pub fn is(&self, value: T) -> bool {
        matches!(self, Coded::Known(v) if *v == value)
    }
}

impl<T: fmt::Display> fmt::Display for Coded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coded::Known(value) => value.fmt(f),
            Coded::Unknown(code) => write!(f, "unknown {code}"),
        }
    }
}
