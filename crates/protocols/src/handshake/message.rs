//! The three authentication packets and their fixed payload layouts.
//!
//! | Packet                    | Payload                                | Frame |
//! |---------------------------|----------------------------------------|-------|
//! | `ServerChallenge`         | challenge (64)                         | 72    |
//! | `ServerChallengeResponse` | signature (64) ‖ challenge (64) ‖ key (32) | 168 |
//! | `ClientChallengeResponse` | signature (64)                         | 72    |

use bytes::{BufMut, Bytes, BytesMut};
use peerauth_crypto::{Challenge, CHALLENGE_LEN};
use peerauth_network_primitives::{Packet, PacketType, PACKET_HEADER_SIZE};
use peerauth_primitives::identity::{
    InvalidPublicKey, PublicKey, Signature, PUBLIC_KEY_LEN, SIGNATURE_LEN,
};
use thiserror::Error;

/// Why a packet could not be read as the authentication message expected in
/// the current state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MalformedPacket {
    /// Some other packet type arrived.
    #[error("expected {expected}, got {actual}")]
    UnexpectedType {
        /// Type the state machine is waiting for.
        expected: PacketType,
        /// Type that arrived.
        actual: PacketType,
    },
    /// The header's size field disagrees with the payload carried.
    #[error("header declares {declared} bytes, payload carries {carried}")]
    Inconsistent {
        /// Size field from the header.
        declared: u32,
        /// Payload bytes actually present.
        carried: usize,
    },
    /// The payload length is wrong for the packet type.
    #[error("{packet_type} payload must be {expected} bytes, got {actual}")]
    PayloadLength {
        /// Type of the offending packet.
        packet_type: PacketType,
        /// Required payload length.
        expected: usize,
        /// Payload length received.
        actual: usize,
    },
    /// The public key embedded in a `ServerChallengeResponse` is not a valid
    /// curve point.
    #[error("embedded public key: {0}")]
    PublicKey(#[from] InvalidPublicKey),
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "authentication frames are a few hundred bytes"
)]
const fn frame_size(payload_len: usize) -> u32 {
    (PACKET_HEADER_SIZE + payload_len) as u32
}

fn expect_payload(
    packet: &Packet,
    expected: PacketType,
    payload_len: usize,
) -> Result<&[u8], MalformedPacket> {
    let actual = PacketType::from_u32(packet.packet_type.as_u32());
    if actual != expected {
        return Err(MalformedPacket::UnexpectedType { expected, actual });
    }

    if !packet.is_consistent() {
        return Err(MalformedPacket::Inconsistent {
            declared: packet.size,
            carried: packet.payload.len(),
        });
    }

    if packet.payload.len() != payload_len {
        return Err(MalformedPacket::PayloadLength {
            packet_type: expected,
            expected: payload_len,
            actual: packet.payload.len(),
        });
    }

    Ok(&packet.payload)
}

fn field_error(packet: &Packet, expected: usize) -> MalformedPacket {
    MalformedPacket::PayloadLength {
        packet_type: packet.packet_type,
        expected,
        actual: packet.payload.len(),
    }
}

/// A challenge issued by the remote peer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerChallenge {
    /// Value the receiver must sign.
    pub challenge: Challenge,
}

impl ServerChallenge {
    /// Payload length in bytes.
    pub const PAYLOAD_LEN: usize = CHALLENGE_LEN;
    /// Frame length in bytes, header included.
    pub const FRAME_SIZE: u32 = frame_size(Self::PAYLOAD_LEN);

    /// Reads the message out of a packet, checking type and size.
    pub fn from_packet(packet: &Packet) -> Result<Self, MalformedPacket> {
        let payload = expect_payload(packet, PacketType::ServerChallenge, Self::PAYLOAD_LEN)?;

        let challenge = Challenge::try_from_slice(payload)
            .ok_or_else(|| field_error(packet, Self::PAYLOAD_LEN))?;

        Ok(Self { challenge })
    }

    /// Builds the packet carrying this message.
    #[must_use]
    pub fn to_packet(&self) -> Packet {
        Packet {
            packet_type: PacketType::ServerChallenge,
            size: Self::FRAME_SIZE,
            payload: Bytes::copy_from_slice(self.challenge.as_bytes()),
        }
    }
}

/// Answer to a [`ServerChallenge`]: proof over the received challenge plus a
/// counter-challenge for the remote.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerChallengeResponse {
    /// Signature over the received challenge.
    pub signature: Signature,
    /// Fresh challenge the remote must sign in turn.
    pub challenge: Challenge,
    /// Key the signature was made with.
    pub public_key: PublicKey,
}

impl ServerChallengeResponse {
    /// Payload length in bytes.
    pub const PAYLOAD_LEN: usize = SIGNATURE_LEN + CHALLENGE_LEN + PUBLIC_KEY_LEN;
    /// Frame length in bytes, header included.
    pub const FRAME_SIZE: u32 = frame_size(Self::PAYLOAD_LEN);

    /// Reads the message out of a packet, checking type, size and that the
    /// embedded key is a valid point.
    pub fn from_packet(packet: &Packet) -> Result<Self, MalformedPacket> {
        let payload = expect_payload(
            packet,
            PacketType::ServerChallengeResponse,
            Self::PAYLOAD_LEN,
        )?;

        let (signature, rest) = payload.split_at(SIGNATURE_LEN);
        let (challenge, public_key) = rest.split_at(CHALLENGE_LEN);

        Ok(Self {
            signature: Signature::try_from_slice(signature)
                .ok_or_else(|| field_error(packet, Self::PAYLOAD_LEN))?,
            challenge: Challenge::try_from_slice(challenge)
                .ok_or_else(|| field_error(packet, Self::PAYLOAD_LEN))?,
            public_key: PublicKey::try_from_slice(public_key)?,
        })
    }

    /// Builds the packet carrying this message.
    #[must_use]
    pub fn to_packet(&self) -> Packet {
        let mut payload = BytesMut::with_capacity(Self::PAYLOAD_LEN);
        payload.put_slice(self.signature.as_bytes());
        payload.put_slice(self.challenge.as_bytes());
        payload.put_slice(self.public_key.as_bytes());

        Packet {
            packet_type: PacketType::ServerChallengeResponse,
            size: Self::FRAME_SIZE,
            payload: payload.freeze(),
        }
    }
}

/// Final proof: signature over the challenge carried by a
/// [`ServerChallengeResponse`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientChallengeResponse {
    /// Signature over the counter-challenge.
    pub signature: Signature,
}

impl ClientChallengeResponse {
    /// Payload length in bytes.
    pub const PAYLOAD_LEN: usize = SIGNATURE_LEN;
    /// Frame length in bytes, header included.
    pub const FRAME_SIZE: u32 = frame_size(Self::PAYLOAD_LEN);

    /// Reads the message out of a packet, checking type and size.
    pub fn from_packet(packet: &Packet) -> Result<Self, MalformedPacket> {
        let payload = expect_payload(
            packet,
            PacketType::ClientChallengeResponse,
            Self::PAYLOAD_LEN,
        )?;

        let signature = Signature::try_from_slice(payload)
            .ok_or_else(|| field_error(packet, Self::PAYLOAD_LEN))?;

        Ok(Self { signature })
    }

    /// Builds the packet carrying this message.
    #[must_use]
    pub fn to_packet(&self) -> Packet {
        Packet {
            packet_type: PacketType::ClientChallengeResponse,
            size: Self::FRAME_SIZE,
            payload: Bytes::copy_from_slice(self.signature.as_bytes()),
        }
    }
}
