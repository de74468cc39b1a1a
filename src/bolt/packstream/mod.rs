//! PackStream serialization format.
//!
//! PackStream is the binary serialization format used by the Bolt protocol
//! to encode values for transmission between client and server.
//!
//! # Supported Types
//!
//! - **Null**, **Boolean**, **Integer** (variable width, up to 64 bits),
//!   **Float** (64-bit IEEE 754)
//! - **String**: UTF-8, length-prefixed
//! - **List** and **Map** (string keys, kept in wire order)
//! - **Structure**: tagged field lists carrying graph, temporal and spatial
//!   values (see [`marker::tag`])
//!
//! Byte arrays are recognised but rejected, no query result carries them.

pub mod decoder;
pub mod encoder;
pub mod marker;
pub mod types;

pub use decoder::{decode, PackStreamDecoder};
pub use encoder::{encode, PackStreamEncoder};
pub use types::{PackStreamMap, PackStreamStructure, PackStreamValue};

use std::fmt;

/// PackStream errors.
#[derive(Debug, Clone, PartialEq)]
pub enum PackStreamError {
    /// Unexpected end of input
    UnexpectedEof,
    /// Unknown marker byte
    UnknownMarker(u8),
    /// Valid PackStream type this client does not handle
    Unsupported(&'static str),
    /// Invalid UTF-8 in string
    InvalidUtf8(String),
    /// Invalid map key (must be string)
    InvalidMapKey,
    /// Value too large to encode
    ValueTooLarge(&'static str, usize),
    /// Nesting deeper than the decoder allows
    TooDeep(usize),
    /// Bytes left over after a complete value
    TrailingBytes(usize),
    /// Structure with the wrong tag, arity or field types
    InvalidStructure(String),
}

impl fmt::Display for PackStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackStreamError::UnexpectedEof => write!(f, "Unexpected end of PackStream data"),
            PackStreamError::UnknownMarker(m) => write!(f, "Unknown PackStream marker: 0x{:02X}", m),
            PackStreamError::Unsupported(what) => write!(f, "Unsupported PackStream type: {}", what),
            PackStreamError::InvalidUtf8(e) => write!(f, "Invalid UTF-8 in string: {}", e),
            PackStreamError::InvalidMapKey => write!(f, "Map keys must be strings"),
            PackStreamError::ValueTooLarge(t, s) => write!(f, "{} too large: {} entries", t, s),
            PackStreamError::TooDeep(max) => write!(f, "Value nested deeper than {} levels", max),
            PackStreamError::TrailingBytes(n) => write!(f, "{} trailing bytes after value", n),
            PackStreamError::InvalidStructure(msg) => write!(f, "Invalid structure: {}", msg),
        }
    }
}

impl std::error::Error for PackStreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: PackStreamValue) {
        let bytes = encode(&value).unwrap();
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_roundtrip_int_boundaries() {
        for v in [
            0i64, -1, 127, -16, 128, -17, -128, -129, 32767, -32768, 32768,
            i32::MAX as i64, i32::MIN as i64, i64::MAX, i64::MIN,
        ] {
            roundtrip(PackStreamValue::Integer(v));
        }
    }

    #[test]
    fn test_roundtrip_unicode_string() {
        roundtrip(PackStreamValue::from("백만 ✓ 𝄞 naïve"));
        roundtrip(PackStreamValue::from("ж".repeat(70_000)));
    }

    #[test]
    fn test_roundtrip_nested() {
        let inner: PackStreamMap = vec![
            ("items", PackStreamValue::List(vec![1i64.into(), "two".into()])),
            ("flag", PackStreamValue::Boolean(false)),
        ]
        .into_iter()
        .collect();
        roundtrip(PackStreamValue::List(vec![
            PackStreamValue::Map(inner.clone()),
            PackStreamStructure::new(0x58, vec![7i64.into(), 1.0f64.into(), 2.0f64.into()]).into(),
            PackStreamValue::Map(inner),
            PackStreamValue::Null,
        ]));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PackStreamError::UnknownMarker(0xE7).to_string(),
            "Unknown PackStream marker: 0xE7"
        );
        assert_eq!(
            PackStreamError::Unsupported("byte array").to_string(),
            "Unsupported PackStream type: byte array"
        );
    }
}
