//! Single-byte markers shared by the encoder and decoder.

use std::fmt;

/// Marker byte preceding a structural or typed unit in the stream.
///
/// Each marker is the ASCII code of its struct-style format character.
/// Only a subset is ever written: `B` (length-prefixed string), the four
/// structural markers, and `l`/`f` as attribute type tags inside the
/// `attrib_data_type` table. The rest are reserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Marker {
    /// Single character (reserved)
    Char = b'c',
    /// Signed 8-bit integer (reserved)
    Int8 = b'b',
    /// Unsigned 8-bit length-prefixed string
    Uint8 = b'B',
    /// Boolean (reserved)
    Bool = b'?',
    /// Signed 16-bit integer (reserved)
    Int16 = b'h',
    /// Unsigned 16-bit integer
    Uint16 = b'H',
    /// Signed 32-bit integer
    Int32 = b'l',
    /// Unsigned 32-bit integer
    Uint32 = b'L',
    /// Signed 64-bit integer (reserved)
    Int64 = b'q',
    /// Unsigned 64-bit integer (reserved)
    Uint64 = b'Q',
    /// 32-bit IEEE 754 float
    Float32 = b'f',
    /// 64-bit IEEE 754 float (reserved)
    Float64 = b'd',
    /// String (reserved)
    String = b's',
    ObjectStart = b'{',
    ObjectEnd = b'}',
    ArrayStart = b'[',
    ArrayEnd = b']',
}

impl Marker {
    /// Every marker, in table order.
    pub const ALL: [Marker; 17] = [
        Self::Char,
        Self::Int8,
        Self::Uint8,
        Self::Bool,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Int64,
        Self::Uint64,
        Self::Float32,
        Self::Float64,
        Self::String,
        Self::ObjectStart,
        Self::ObjectEnd,
        Self::ArrayStart,
        Self::ArrayEnd,
    ];

    /// The byte written to the stream.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Convert from a stream byte.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            b'c' => Some(Self::Char),
            b'b' => Some(Self::Int8),
            b'B' => Some(Self::Uint8),
            b'?' => Some(Self::Bool),
            b'h' => Some(Self::Int16),
            b'H' => Some(Self::Uint16),
            b'l' => Some(Self::Int32),
            b'L' => Some(Self::Uint32),
            b'q' => Some(Self::Int64),
            b'Q' => Some(Self::Uint64),
            b'f' => Some(Self::Float32),
            b'd' => Some(Self::Float64),
            b's' => Some(Self::String),
            b'{' => Some(Self::ObjectStart),
            b'}' => Some(Self::ObjectEnd),
            b'[' => Some(Self::ArrayStart),
            b']' => Some(Self::ArrayEnd),
            _ => None,
        }
    }

    /// Symbolic name of this marker.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Bool => "bool",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::ObjectStart => "object_start",
            Self::ObjectEnd => "object_end",
            Self::ArrayStart => "array_start",
            Self::ArrayEnd => "array_end",
        }
    }

    /// Parse a marker from its symbolic name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Size in bytes of one scalar of this kind, if it has a fixed width.
    pub const fn num_bytes(self) -> Option<usize> {
        match self {
            Self::Char | Self::Int8 | Self::Uint8 | Self::Bool => Some(1),
            Self::Int16 | Self::Uint16 => Some(2),
            Self::Int32 | Self::Uint32 | Self::Float32 => Some(4),
            Self::Int64 | Self::Uint64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Markers present in the table but never produced by the encoder.
    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::Int8
                | Self::Bool
                | Self::Int16
                | Self::Int64
                | Self::Uint64
                | Self::Float64
                | Self::String
        )
    }

    /// Markers the decoder dispatches on inside a generic array.
    ///
    /// A raw scalar byte equal to one of these cannot be told apart from
    /// structure, so the encoder refuses to write it.
    pub const fn is_dispatch(v: u8) -> bool {
        matches!(v, b'B' | b'{' | b'[' | b']')
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ('{}')", self.name(), self.code() as char)
    }
}

/// Describe a stream byte for error messages.
pub(crate) fn describe(v: u8) -> String {
    match Marker::from_u8(v) {
        Some(m) => m.to_string(),
        None => format!("byte 0x{:02X}", v),
    }
}
