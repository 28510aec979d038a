use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::packet::{Packet, PacketError, PacketHeader, PACKET_HEADER_SIZE};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
    #[error("packet of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error(transparent)]
    Packet(#[from] PacketError),
}

/// Splits a byte stream into [`Packet`]s using the size field of the 8-byte
/// header, and writes packets back out with a size computed from the payload.
#[derive(Clone, Copy, Debug)]
pub struct PacketCodec {
    max_packet_size: usize,
}

impl PacketCodec {
    #[must_use]
    pub const fn new(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    #[must_use]
    pub const fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < PACKET_HEADER_SIZE {
            src.reserve(PACKET_HEADER_SIZE - src.len());
            return Ok(None);
        }

        let header = PacketHeader::peek(src)?;
        let payload_len = header.payload_len()?;
        let frame_len = payload_len + PACKET_HEADER_SIZE;

        if frame_len > self.max_packet_size {
            return Err(CodecError::TooLarge {
                size: frame_len,
                max: self.max_packet_size,
            });
        }

        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(frame_len);
        frame.advance(PACKET_HEADER_SIZE);

        Ok(Some(Packet {
            packet_type: header.packet_type,
            size: header.size,
            payload: frame.freeze(),
        }))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame_len = item.payload.len() + PACKET_HEADER_SIZE;

        if frame_len > self.max_packet_size {
            return Err(CodecError::TooLarge {
                size: frame_len,
                max: self.max_packet_size,
            });
        }

        // the header is rebuilt from the payload so a stale `size` never leaks
        let item = Packet::new(item.packet_type, item.payload)?;
        item.encode(dst);

        Ok(())
    }
}

/// Writes a frame that was already encoded, after checking that its header
/// describes it exactly.
impl Encoder<Bytes> for PacketCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_packet_size {
            return Err(CodecError::TooLarge {
                size: item.len(),
                max: self.max_packet_size,
            });
        }

        let header = PacketHeader::peek(&item)?;
        if header.payload_len()? + PACKET_HEADER_SIZE != item.len() {
            return Err(PacketError::SizeMismatch {
                declared: header.size,
                actual: item.len(),
            }
            .into());
        }

        dst.extend_from_slice(&item);

        Ok(())
    }
}
