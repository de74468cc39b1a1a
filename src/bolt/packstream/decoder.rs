//! PackStream decoder.

use bytes::Buf;

use super::marker::*;
use super::types::{PackStreamMap, PackStreamStructure, PackStreamValue};
use super::PackStreamError;

/// Nesting limit for lists, maps and structures.
pub const MAX_DEPTH: usize = 256;

/// PackStream decoder that reads values from a byte slice.
pub struct PackStreamDecoder<'a> {
    data: &'a [u8],
    depth: usize,
}

impl<'a> PackStreamDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, depth: 0 }
    }

    /// Get remaining bytes count.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> Result<PackStreamValue, PackStreamError> {
        let marker = self.read_u8()?;

        if is_tiny_int(marker) {
            return Ok(PackStreamValue::Integer(marker as i8 as i64));
        }

        let (kind, size) = split_tiny(marker);
        match kind {
            TINY_STRING => return self.read_string(size),
            TINY_LIST => return self.read_list(size),
            TINY_MAP => return self.read_map(size),
            TINY_STRUCT => return self.read_struct(size),
            _ => {}
        }

        match marker {
            NULL => Ok(PackStreamValue::Null),
            TRUE => Ok(PackStreamValue::Boolean(true)),
            FALSE => Ok(PackStreamValue::Boolean(false)),
            FLOAT_64 => {
                self.need(8)?;
                Ok(PackStreamValue::Float(self.data.get_f64()))
            }
            INT_8 => {
                self.need(1)?;
                Ok(PackStreamValue::Integer(self.data.get_i8() as i64))
            }
            INT_16 => {
                self.need(2)?;
                Ok(PackStreamValue::Integer(self.data.get_i16() as i64))
            }
            INT_32 => {
                self.need(4)?;
                Ok(PackStreamValue::Integer(self.data.get_i32() as i64))
            }
            INT_64 => {
                self.need(8)?;
                Ok(PackStreamValue::Integer(self.data.get_i64()))
            }
            STRING_8 | STRING_16 | STRING_32 => {
                let len = self.read_size(marker - STRING_8)?;
                self.read_string(len)
            }
            LIST_8 | LIST_16 | LIST_32 => {
                let len = self.read_size(marker - LIST_8)?;
                self.read_list(len)
            }
            MAP_8 | MAP_16 | MAP_32 => {
                let len = self.read_size(marker - MAP_8)?;
                self.read_map(len)
            }
            STRUCT_8 | STRUCT_16 => {
                let len = self.read_size(marker - STRUCT_8)?;
                self.read_struct(len)
            }
            BYTES_8 | BYTES_16 | BYTES_32 => Err(PackStreamError::Unsupported("byte array")),
            _ => Err(PackStreamError::UnknownMarker(marker)),
        }
    }

    /// Size prefix: width 0 is u8, 1 is u16, 2 is u32.
    fn read_size(&mut self, width: u8) -> Result<usize, PackStreamError> {
        match width {
            0 => self.read_u8().map(usize::from),
            1 => {
                self.need(2)?;
                Ok(self.data.get_u16() as usize)
            }
            _ => {
                self.need(4)?;
                Ok(self.data.get_u32() as usize)
            }
        }
    }

    fn read_string(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        self.need(len)?;
        let (head, tail) = self.data.split_at(len);
        let s = std::str::from_utf8(head)
            .map_err(|e| PackStreamError::InvalidUtf8(e.to_string()))?
            .to_string();
        self.data = tail;
        Ok(PackStreamValue::String(s))
    }

    fn read_list(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        self.enter()?;
        // Every item takes at least one byte, cap preallocation by what is left.
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        self.depth -= 1;
        Ok(PackStreamValue::List(items))
    }

    fn read_map(&mut self, len: usize) -> Result<PackStreamValue, PackStreamError> {
        self.enter()?;
        let mut map = PackStreamMap::with_capacity(len.min(self.remaining() / 2));
        for _ in 0..len {
            let key = match self.decode()? {
                PackStreamValue::String(s) => s,
                _ => return Err(PackStreamError::InvalidMapKey),
            };
            let value = self.decode()?;
            map.insert(key, value);
        }
        self.depth -= 1;
        Ok(PackStreamValue::Map(map))
    }

    fn read_struct(&mut self, field_count: usize) -> Result<PackStreamValue, PackStreamError> {
        self.enter()?;
        let tag = self.read_u8()?;
        let mut fields = Vec::with_capacity(field_count.min(self.remaining()));
        for _ in 0..field_count {
            fields.push(self.decode()?);
        }
        self.depth -= 1;
        Ok(PackStreamValue::Structure(PackStreamStructure::new(tag, fields)))
    }

    fn enter(&mut self) -> Result<(), PackStreamError> {
        if self.depth >= MAX_DEPTH {
            return Err(PackStreamError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        Ok(())
    }

    fn need(&self, n: usize) -> Result<(), PackStreamError> {
        if self.data.len() < n {
            Err(PackStreamError::UnexpectedEof)
        } else {
            Ok(())
        }
    }

    fn read_u8(&mut self) -> Result<u8, PackStreamError> {
        self.need(1)?;
        Ok(self.data.get_u8())
    }
}

/// Decode exactly one value; trailing bytes are an error.
pub fn decode(data: &[u8]) -> Result<PackStreamValue, PackStreamError> {
    let mut decoder = PackStreamDecoder::new(data);
    let value = decoder.decode()?;
    if decoder.remaining() != 0 {
        return Err(PackStreamError::TrailingBytes(decoder.remaining()));
    }
    Ok(value)
}
