//! PackStream encoder.

use bytes::{BufMut, BytesMut};

use super::marker::*;
use super::types::{PackStreamMap, PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// PackStream encoder that writes values to a byte buffer.
pub struct PackStreamEncoder {
    buffer: BytesMut,
}

impl PackStreamEncoder {
    /// Create a new encoder with default buffer capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new encoder with specified buffer capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Consume the encoder and return the bytes.
    pub fn into_bytes(self) -> BytesMut {
        self.buffer
    }

    /// Get the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Encode a PackStreamValue.
    pub fn encode(&mut self, value: &PackStreamValue) -> Result<(), PackStreamError> {
        match value {
            PackStreamValue::Null => self.buffer.put_u8(NULL),
            PackStreamValue::Boolean(b) => self.buffer.put_u8(if *b { TRUE } else { FALSE }),
            PackStreamValue::Integer(i) => self.encode_int(*i),
            PackStreamValue::Float(f) => {
                self.buffer.put_u8(FLOAT_64);
                self.buffer.put_f64(*f);
            }
            PackStreamValue::String(s) => self.encode_string(s)?,
            PackStreamValue::List(l) => self.encode_list(l)?,
            PackStreamValue::Map(m) => self.encode_map(m)?,
            PackStreamValue::Structure(s) => self.encode_structure(s)?,
        }
        Ok(())
    }

    /// Encode an integer using the smallest representation.
    pub fn encode_int(&mut self, value: i64) {
        if TINY_INT_RANGE.contains(&value) {
            self.buffer.put_i8(value as i8);
        } else if let Ok(v) = i8::try_from(value) {
            self.buffer.put_u8(INT_8);
            self.buffer.put_i8(v);
        } else if let Ok(v) = i16::try_from(value) {
            self.buffer.put_u8(INT_16);
            self.buffer.put_i16(v);
        } else if let Ok(v) = i32::try_from(value) {
            self.buffer.put_u8(INT_32);
            self.buffer.put_i32(v);
        } else {
            self.buffer.put_u8(INT_64);
            self.buffer.put_i64(value);
        }
    }

    /// Encode a string.
    pub fn encode_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        let bytes = value.as_bytes();
        self.write_header("string", bytes.len(), TINY_STRING, [STRING_8, STRING_16, STRING_32])?;
        self.buffer.put_slice(bytes);
        Ok(())
    }

    /// Encode a list.
    pub fn encode_list(&mut self, values: &[PackStreamValue]) -> Result<(), PackStreamError> {
        self.write_header("list", values.len(), TINY_LIST, [LIST_8, LIST_16, LIST_32])?;
        for value in values {
            self.encode(value)?;
        }
        Ok(())
    }

    /// Encode a map, entries in insertion order.
    pub fn encode_map(&mut self, map: &PackStreamMap) -> Result<(), PackStreamError> {
        self.write_header("map", map.len(), TINY_MAP, [MAP_8, MAP_16, MAP_32])?;
        for (key, value) in map.iter() {
            self.encode_string(key)?;
            self.encode(value)?;
        }
        Ok(())
    }

    /// Encode a structure. Bolt structures never have more than 15 fields.
    pub fn encode_structure(&mut self, s: &PackStreamStructure) -> Result<(), PackStreamError> {
        if s.fields.len() > TINY_MAX {
            return Err(PackStreamError::ValueTooLarge("structure", s.fields.len()));
        }
        self.buffer.put_u8(TINY_STRUCT | s.fields.len() as u8);
        self.buffer.put_u8(s.tag);
        for field in &s.fields {
            self.encode(field)?;
        }
        Ok(())
    }

    fn write_header(
        &mut self,
        kind: &'static str,
        len: usize,
        tiny: u8,
        sized: [u8; 3],
    ) -> Result<(), PackStreamError> {
        if len <= TINY_MAX {
            self.buffer.put_u8(tiny | len as u8);
        } else if let Ok(n) = u8::try_from(len) {
            self.buffer.put_u8(sized[0]);
            self.buffer.put_u8(n);
        } else if let Ok(n) = u16::try_from(len) {
            self.buffer.put_u8(sized[1]);
            self.buffer.put_u16(n);
        } else if let Ok(n) = u32::try_from(len) {
            self.buffer.put_u8(sized[2]);
            self.buffer.put_u32(n);
        } else {
            return Err(PackStreamError::ValueTooLarge(kind, len));
        }
        Ok(())
    }
}

impl Default for PackStreamEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to encode a single value.
pub fn encode(value: &PackStreamValue) -> Result<BytesMut, PackStreamError> {
    let mut encoder = PackStreamEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes_of(value: impl Into<PackStreamValue>) -> Vec<u8> {
        encode(&value.into()).unwrap().to_vec()
    }

    #[test]
    fn test_encode_scalars() {
        assert_eq!(bytes_of(PackStreamValue::Null), vec![0xC0]);
        assert_eq!(bytes_of(true), vec![0xC3]);
        assert_eq!(bytes_of(false), vec![0xC2]);
        assert_eq!(bytes_of(1.5f64), vec![0xC1, 0x3F, 0xF8, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_int_widths() {
        assert_eq!(bytes_of(0i64), vec![0x00]);
        assert_eq!(bytes_of(127i64), vec![0x7F]);
        assert_eq!(bytes_of(-16i64), vec![0xF0]);
        assert_eq!(bytes_of(-17i64), vec![0xC8, 0xEF]);
        assert_eq!(bytes_of(1000i64), vec![0xC9, 0x03, 0xE8]);
        assert_eq!(bytes_of(100000i64), vec![0xCA, 0x00, 0x01, 0x86, 0xA0]);
        let wide = bytes_of(i64::MAX);
        assert_eq!(wide[0], 0xCB);
        assert_eq!(wide.len(), 9);
    }

    #[test]
    fn test_encode_string_headers() {
        assert_eq!(bytes_of(""), vec![0x80]);
        assert_eq!(bytes_of("abc"), vec![0x83, b'a', b'b', b'c']);
        let s = "x".repeat(16);
        assert_eq!(&bytes_of(s.as_str())[..2], &[0xD0, 16]);
        let s = "x".repeat(300);
        assert_eq!(&bytes_of(s.as_str())[..3], &[0xD1, 0x01, 0x2C]);
    }

    #[test]
    fn test_encode_multibyte_string_counts_bytes() {
        // "é" is two bytes in UTF-8
        assert_eq!(bytes_of("é"), vec![0x82, 0xC3, 0xA9]);
    }

    #[test]
    fn test_encode_map_in_order() {
        let map: PackStreamMap = vec![("b", 1i64), ("a", 2i64)].into_iter().collect();
        assert_eq!(
            bytes_of(map),
            vec![0xA2, 0x81, b'b', 0x01, 0x81, b'a', 0x02]
        );
    }

    #[test]
    fn test_encode_structure() {
        let s = PackStreamStructure::new(0x44, vec![PackStreamValue::Integer(1)]);
        assert_eq!(bytes_of(s), vec![0xB1, 0x44, 0x01]);
    }

    #[test]
    fn test_encode_structure_too_many_fields() {
        let s = PackStreamStructure::new(0x01, vec![PackStreamValue::Null; 16]);
        assert!(matches!(
            encode(&s.into()),
            Err(PackStreamError::ValueTooLarge("structure", 16))
        ));
    }
}
