use core::pin::Pin;
use core::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Sink as FuturesSink, Stream as FuturesStream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::packet::Packet;

mod codec;

pub use codec::{CodecError, PacketCodec};

/// Largest frame accepted by [`PacketStream::new`], header included.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 8 * 1_024 * 1_024;

/// A connection carrying length-prefixed packets in both directions.
#[derive(Debug)]
pub struct PacketStream<T> {
    inner: Framed<T, PacketCodec>,
}

impl<T: AsyncRead + AsyncWrite> PacketStream<T> {
    #[must_use]
    pub fn new(io: T) -> Self {
        Self::with_max_packet_size(io, DEFAULT_MAX_PACKET_SIZE)
    }

    #[must_use]
    pub fn with_max_packet_size(io: T, max_packet_size: usize) -> Self {
        Self {
            inner: Framed::new(io, PacketCodec::new(max_packet_size)),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: AsyncRead + Unpin> FuturesStream for PacketStream<T> {
    type Item = Result<Packet, CodecError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<T: AsyncWrite + Unpin> FuturesSink<Packet> for PacketStream<T> {
    type Error = CodecError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        FuturesSink::<Packet>::poll_ready(Pin::new(&mut self.inner), cx)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Packet) -> Result<(), Self::Error> {
        FuturesSink::start_send(Pin::new(&mut self.inner), item)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        FuturesSink::<Packet>::poll_flush(Pin::new(&mut self.inner), cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        FuturesSink::<Packet>::poll_close(Pin::new(&mut self.inner), cx)
    }
}

/// Frames produced by [`Packet::to_frame`] go out as-is.
impl<T: AsyncWrite + Unpin> FuturesSink<Bytes> for PacketStream<T> {
    type Error = CodecError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        FuturesSink::<Bytes>::poll_ready(Pin::new(&mut self.inner), cx)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Bytes) -> Result<(), Self::Error> {
        FuturesSink::start_send(Pin::new(&mut self.inner), item)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        FuturesSink::<Bytes>::poll_flush(Pin::new(&mut self.inner), cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        FuturesSink::<Bytes>::poll_close(Pin::new(&mut self.inner), cx)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::SinkExt;
    use tokio::io::duplex;

    use super::*;
    use crate::packet::PacketType;

    #[tokio::test]
    async fn test_packets_cross_a_duplex_pipe() {
        let (left, right) = duplex(1_024);
        let mut left = PacketStream::new(left);
        let mut right = PacketStream::new(right);

        let packet = Packet::new(PacketType::ServerChallenge, vec![8; 64]).unwrap();
        left.send(packet.clone()).await.unwrap();
        left.send(packet.to_frame()).await.unwrap();

        assert_eq!(right.next().await.unwrap().unwrap(), packet);
        assert_eq!(right.next().await.unwrap().unwrap(), packet);
    }

    #[tokio::test]
    async fn test_closed_peer_ends_stream() {
        let (left, right) = duplex(64);
        let mut right = PacketStream::new(right);
        drop(left);

        assert!(right.next().await.is_none());
    }
}
