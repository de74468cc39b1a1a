//! Bolt message framing for tokio_util.
//!
//! Each message is split into chunks with a 2-byte big-endian length prefix
//! and terminated by an empty chunk. Empty messages (a lone terminator) are
//! NOOP keep-alives and are skipped.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::message::{BoltRequest, BoltResponse};
use super::packstream::{decode, PackStreamEncoder, PackStreamValue};
use super::BoltError;

/// Maximum chunk payload.
pub const MAX_CHUNK_SIZE: usize = u16::MAX as usize;

/// Default upper bound for one reassembled message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// End of message marker (0x00 0x00)
pub const END_MARKER: [u8; 2] = [0x00, 0x00];

/// Client-side codec: encodes requests, decodes responses.
#[derive(Debug)]
pub struct BoltCodec {
    max_message_size: usize,
    /// Chunks of the message currently being reassembled
    message_buffer: BytesMut,
}

impl BoltCodec {
    /// Create a new codec with default settings.
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a codec with custom max message size.
    pub fn with_max_size(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            message_buffer: BytesMut::with_capacity(4096),
        }
    }

    fn write_chunked(data: &[u8], dst: &mut BytesMut) {
        dst.reserve(data.len() + 2 * (data.len() / MAX_CHUNK_SIZE + 2));
        for chunk in data.chunks(MAX_CHUNK_SIZE) {
            dst.put_u16(chunk.len() as u16);
            dst.put_slice(chunk);
        }
        dst.put_slice(&END_MARKER);
    }

    /// Reassemble the next complete message body, if buffered.
    fn next_message(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, BoltError> {
        loop {
            if src.len() < 2 {
                return Ok(None);
            }
            let chunk_size = u16::from_be_bytes([src[0], src[1]]) as usize;

            if chunk_size == 0 {
                src.advance(2);
                if self.message_buffer.is_empty() {
                    continue;
                }
                return Ok(Some(self.message_buffer.split()));
            }

            if src.len() < 2 + chunk_size {
                src.reserve(2 + chunk_size - src.len());
                return Ok(None);
            }

            let size = self.message_buffer.len() + chunk_size;
            if size > self.max_message_size {
                return Err(BoltError::MessageTooLarge {
                    size,
                    max: self.max_message_size,
                });
            }

            src.advance(2);
            self.message_buffer.extend_from_slice(&src[..chunk_size]);
            src.advance(chunk_size);
        }
    }
}

impl Default for BoltCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for BoltCodec {
    type Item = BoltResponse;
    type Error = BoltError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(body) = self.next_message(src)? else {
            return Ok(None);
        };
        match decode(&body)? {
            PackStreamValue::Structure(s) => Ok(Some(BoltResponse::from_structure(s)?)),
            other => Err(BoltError::Protocol(format!(
                "expected a message structure, got {}",
                other.type_name()
            ))),
        }
    }
}

impl Encoder<BoltRequest> for BoltCodec {
    type Error = BoltError;

    fn encode(&mut self, item: BoltRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut encoder = PackStreamEncoder::new();
        encoder.encode_structure(&item.to_structure())?;
        Self::write_chunked(encoder.as_bytes(), dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bolt::message::{tag, RunMessage, SuccessMessage};
    use crate::bolt::packstream::{encode, PackStreamMap, PackStreamStructure};

    /// Frame a server message the way a server would.
    fn frame(value: PackStreamValue, chunk: usize) -> BytesMut {
        let body = encode(&value).unwrap();
        let mut buf = BytesMut::new();
        for part in body.chunks(chunk) {
            buf.put_u16(part.len() as u16);
            buf.put_slice(part);
        }
        buf.put_slice(&END_MARKER);
        buf
    }

    fn success(has_more: bool) -> PackStreamValue {
        let mut meta = PackStreamMap::new();
        meta.insert("has_more", has_more);
        PackStreamStructure::new(tag::SUCCESS, vec![meta.into()]).into()
    }

    #[test]
    fn test_encode_request_framing() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(BoltRequest::Commit, &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x00, 0x02, 0xB0, 0x12, 0x00, 0x00]);
    }

    #[test]
    fn test_encode_large_request_is_split() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();
        let query = "x".repeat(MAX_CHUNK_SIZE + 10);
        codec
            .encode(BoltRequest::Run(RunMessage::new(&query)), &mut buf)
            .unwrap();
        let first = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        assert_eq!(first, MAX_CHUNK_SIZE);
        assert_eq!(&buf[buf.len() - 2..], &END_MARKER);
    }

    #[test]
    fn test_decode_across_chunks() {
        let mut codec = BoltCodec::new();
        let mut buf = frame(success(true), 3);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        let mut meta = PackStreamMap::new();
        meta.insert("has_more", true);
        assert_eq!(decoded, BoltResponse::Success(SuccessMessage { metadata: meta }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_input_waits() {
        let mut codec = BoltCodec::new();
        let full = frame(success(false), 64);
        let mut partial = BytesMut::from(&full[..full.len() - 1]);
        assert!(codec.decode(&mut partial).unwrap().is_none());
        partial.put_u8(0x00);
        assert!(codec.decode(&mut partial).unwrap().is_some());
    }

    #[test]
    fn test_noop_and_multiple_messages() {
        let mut codec = BoltCodec::new();
        let mut buf = BytesMut::new();
        buf.put_slice(&END_MARKER);
        buf.extend_from_slice(&frame(success(true), 64));
        buf.put_slice(&END_MARKER);
        buf.extend_from_slice(&frame(
            PackStreamStructure::new(tag::RECORD, vec![vec![PackStreamValue::from(1i64)].into()]).into(),
            64,
        ));

        assert!(matches!(codec.decode(&mut buf).unwrap(), Some(BoltResponse::Success(_))));
        assert!(matches!(codec.decode(&mut buf).unwrap(), Some(BoltResponse::Record(_))));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_message_too_large() {
        let mut codec = BoltCodec::with_max_size(100);
        let mut buf = BytesMut::new();
        buf.put_u16(200);
        buf.extend_from_slice(&[0u8; 200]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(BoltError::MessageTooLarge { size: 200, max: 100 })
        ));
    }

    #[test]
    fn test_non_structure_message() {
        let mut codec = BoltCodec::new();
        let mut buf = frame(PackStreamValue::Integer(42), 64);
        assert!(matches!(codec.decode(&mut buf), Err(BoltError::Protocol(_))));
    }
}
