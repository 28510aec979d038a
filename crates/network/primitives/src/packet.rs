//! Length-prefixed packet frames.
//!
//! ```text
//! ┌────────────────┬────────────────┬──────────────────────┐
//! │ size (u32 LE)  │ type (u32 LE)  │ payload              │
//! │ header+payload │                │ size - 8 bytes       │
//! └────────────────┴────────────────┴──────────────────────┘
//! ```

use core::fmt;
use core::hash::{Hash, Hasher};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

pub const PACKET_HEADER_SIZE: usize = 8;

/// Numeric packet type. Only the authentication types are interpreted here;
/// everything else is carried as [`PacketType::Other`].
///
/// Equality and hashing follow the wire code, so `Other(1)` is the same type
/// as `ServerChallenge`.
#[derive(Clone, Copy, Debug)]
pub enum PacketType {
    /// A 64-byte challenge issued by the remote peer.
    ServerChallenge,
    /// Signature over the received challenge, a fresh challenge and the
    /// sender's public key.
    ServerChallengeResponse,
    /// Signature over the challenge carried by a `ServerChallengeResponse`.
    ClientChallengeResponse,
    Other(u32),
}

impl PacketType {
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::ServerChallenge,
            2 => Self::ServerChallengeResponse,
            3 => Self::ClientChallengeResponse,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::ServerChallenge => 1,
            Self::ServerChallengeResponse => 2,
            Self::ClientChallengeResponse => 3,
            Self::Other(value) => value,
        }
    }

    #[must_use]
    pub const fn is_auth(self) -> bool {
        matches!(
            Self::from_u32(self.as_u32()),
            Self::ServerChallenge | Self::ServerChallengeResponse | Self::ClientChallengeResponse
        )
    }
}

impl PartialEq for PacketType {
    fn eq(&self, other: &Self) -> bool {
        self.as_u32() == other.as_u32()
    }
}

impl Eq for PacketType {}

impl Hash for PacketType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_u32().hash(state);
    }
}

impl From<u32> for PacketType {
    fn from(value: u32) -> Self {
        Self::from_u32(value)
    }
}

impl From<PacketType> for u32 {
    fn from(value: PacketType) -> Self {
        value.as_u32()
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerChallenge => f.pad("serverChallenge"),
            Self::ServerChallengeResponse => f.pad("serverChallengeResponse"),
            Self::ClientChallengeResponse => f.pad("clientChallengeResponse"),
            Self::Other(value) => write!(f, "other({value})"),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum PacketError {
    #[error("need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("header declares {declared} bytes, frame has {actual}")]
    SizeMismatch { declared: u32, actual: usize },
    #[error("declared size {0} is smaller than the header")]
    Undersized(u32),
    #[error("payload of {0} bytes does not fit a frame")]
    Oversized(usize),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PacketHeader {
    pub size: u32,
    pub packet_type: PacketType,
}

impl PacketHeader {
    /// Reads the header off the front of `buf` without consuming it.
    pub fn peek(buf: &[u8]) -> Result<Self, PacketError> {
        let Some(mut header) = buf.get(..PACKET_HEADER_SIZE) else {
            return Err(PacketError::Truncated {
                needed: PACKET_HEADER_SIZE,
                available: buf.len(),
            });
        };

        let size = header.get_u32_le();
        let packet_type = PacketType::from_u32(header.get_u32_le());

        Ok(Self { size, packet_type })
    }

    pub fn payload_len(&self) -> Result<usize, PacketError> {
        usize::try_from(self.size)
            .ok()
            .and_then(|size| size.checked_sub(PACKET_HEADER_SIZE))
            .ok_or(PacketError::Undersized(self.size))
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(PACKET_HEADER_SIZE);
        dst.put_u32_le(self.size);
        dst.put_u32_le(self.packet_type.as_u32());
    }
}

/// A parsed frame: `size` is what the header declared, which a well-behaved
/// peer keeps equal to `8 + payload.len()`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Packet {
    pub packet_type: PacketType,
    pub size: u32,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(packet_type: PacketType, payload: impl Into<Bytes>) -> Result<Self, PacketError> {
        let payload = payload.into();

        let size = payload
            .len()
            .checked_add(PACKET_HEADER_SIZE)
            .and_then(|size| u32::try_from(size).ok())
            .ok_or(PacketError::Oversized(payload.len()))?;

        Ok(Self {
            packet_type,
            size,
            payload,
        })
    }

    /// Parses exactly one frame occupying the whole of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Self, PacketError> {
        let header = PacketHeader::peek(buf)?;
        let payload_len = header.payload_len()?;

        if payload_len != buf.len().saturating_sub(PACKET_HEADER_SIZE) {
            return Err(PacketError::SizeMismatch {
                declared: header.size,
                actual: buf.len(),
            });
        }

        Ok(Self {
            packet_type: header.packet_type,
            size: header.size,
            payload: Bytes::copy_from_slice(&buf[PACKET_HEADER_SIZE..]),
        })
    }

    #[must_use]
    pub const fn header(&self) -> PacketHeader {
        PacketHeader {
            size: self.size,
            packet_type: self.packet_type,
        }
    }

    /// Whether the declared size agrees with the payload actually carried.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.header()
            .payload_len()
            .is_ok_and(|len| len == self.payload.len())
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(PACKET_HEADER_SIZE + self.payload.len());
        self.header().encode(dst);
        dst.put_slice(&self.payload);
    }

    #[must_use]
    pub fn to_frame(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(PACKET_HEADER_SIZE + self.payload.len());
        self.encode(&mut dst);
        dst.freeze()
    }
}
