use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// AMF0 marker types.
/// Defined in amf0_spec_121207.pdf section 2.1
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum Amf0Marker {
    /// number-marker
    Number = 0x00,
    /// boolean-marker
    Boolean = 0x01,
    /// string-marker
    String = 0x02,
    /// object-marker
    Object = 0x03,
    /// movieclip-marker
    ///
    /// reserved, not supported
    MovieClipMarker = 0x04,
    /// null-marker
    Null = 0x05,
    /// undefined-marker
    Undefined = 0x06,
    /// reference-marker
    Reference = 0x07,
    /// ecma-array-marker
    EcmaArray = 0x08,
    /// object-end-marker
    ObjectEnd = 0x09,
    /// strict-array-marker
    StrictArray = 0x0a,
    /// date-marker
    Date = 0x0b,
    /// long-string-marker
    LongString = 0x0c,
    /// unsupported-marker
    Unsupported = 0x0d,
    /// recordset-marker
    ///
    /// reserved, not supported
    Recordset = 0x0e,
    /// xml-document-marker
    XmlDocument = 0x0f,
    /// typed-object-marker
    TypedObject = 0x10,
    /// avmplus-object-marker
    ///
    /// AMF3 marker
    AVMPlusObject = 0x11,
}

impl TryFrom<u8> for Amf0Marker {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        Self::from_u8(value).ok_or(value)
    }
}

/// A decoded script data value.
///
/// Values own their contents: a decoded tag outlives the buffer it was read from.
#[derive(PartialEq, Clone, Debug)]
pub enum Amf0Value {
    /// Number Type defined section 2.2
    Number(f64),
    /// Boolean Type defined section 2.3
    Boolean(bool),
    /// String Type defined section 2.4
    String(String),
    /// Object Type defined section 2.5
    Object(Vec<(String, Amf0Value)>),
    /// EcmaArray Type defined section 2.10
    EcmaArray(Vec<(String, Amf0Value)>),
    /// StrictArray Type defined section 2.12
    StrictArray(Vec<Amf0Value>),
    /// LongString Type defined section 2.14
    LongString(String),
}

impl Amf0Value {
    /// Get the marker of the value.
    #[inline]
    pub fn marker(&self) -> Amf0Marker {
        match self {
            Self::Number(_) => Amf0Marker::Number,
            Self::Boolean(_) => Amf0Marker::Boolean,
            Self::String(_) => Amf0Marker::String,
            Self::Object(_) => Amf0Marker::Object,
            Self::EcmaArray(_) => Amf0Marker::EcmaArray,
            Self::StrictArray(_) => Amf0Marker::StrictArray,
            Self::LongString(_) => Amf0Marker::LongString,
        }
    }

    /// Returns the inner `f64` if this is a `Number`, or `None` otherwise.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the inner `bool` if this is a `Boolean`, or `None` otherwise.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the inner string slice if this is a `String` or `LongString`,
    /// or `None` otherwise.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::LongString(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner property slice if this is an `Object` or `EcmaArray`,
    /// or `None` otherwise.
    #[inline]
    pub fn as_object_properties(&self) -> Option<&[(String, Amf0Value)]> {
        match self {
            Self::Object(o) | Self::EcmaArray(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the inner value slice if this is a `StrictArray`,
    /// or `None` otherwise.
    #[inline]
    pub fn as_array(&self) -> Option<&[Amf0Value]> {
        match self {
            Self::StrictArray(a) => Some(a),
            _ => None,
        }
    }
}
