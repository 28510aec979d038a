//! Wire-level building blocks: the length-prefixed packet frame, its codec,
//! and the outbound write capability handed to protocol state machines.

pub mod packet;
pub mod socket;
pub mod stream;

pub use packet::{Packet, PacketError, PacketHeader, PacketType, PACKET_HEADER_SIZE};
pub use socket::PacketWriter;
pub use stream::{CodecError, PacketCodec, PacketStream, DEFAULT_MAX_PACKET_SIZE};
