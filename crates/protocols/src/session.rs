//! Runs a handshake over a live packet connection.
//!
//! The state machines in [`handshake`](crate::handshake) only queue frames;
//! the driver here flushes that queue to the connection, feeds inbound
//! packets back in, and bounds the whole exchange by
//! [`HandshakeConfig::timeout`].

use core::time::Duration;
use std::collections::VecDeque;

use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use peerauth_crypto::ChallengeSource;
use peerauth_network_primitives::{CodecError, Packet, PacketStream};
use peerauth_primitives::identity::{KeyPair, PublicKey};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::HandshakeConfig;
use crate::handshake::{Challenger, Handshake, VerificationResult};

/// Why a handshake ended without a [`VerificationResult`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// The exchange did not resolve in time.
    #[error("handshake did not complete within {0:?}")]
    Timeout(Duration),
    /// The remote hung up before the exchange resolved.
    #[error("connection closed during handshake")]
    Closed,
    /// Reading or writing a frame failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Wraps `io` in a packet stream honouring the configured frame limit.
#[must_use]
pub fn packet_stream<T>(io: T, config: &HandshakeConfig) -> PacketStream<T>
where
    T: AsyncRead + AsyncWrite,
{
    PacketStream::with_max_packet_size(io, config.max_packet_size)
}

/// Answers a handshake opened by the remote (peer B).
///
/// Waits for the remote's challenge and returns once the remote has proven
/// it holds `remote_public_key`, or has failed to.
pub async fn authenticate<T, S>(
    stream: &mut T,
    key_pair: KeyPair,
    remote_public_key: PublicKey,
    challenges: S,
    config: &HandshakeConfig,
) -> Result<VerificationResult, SessionError>
where
    T: Stream<Item = Result<Packet, CodecError>> + Sink<Bytes, Error = CodecError> + Unpin,
    S: ChallengeSource,
{
    let mut handshake = Handshake::new(VecDeque::new(), key_pair, remote_public_key, challenges);

    run(stream, &mut handshake, config).await
}

/// Opens a handshake towards the remote (peer A).
pub async fn challenge<T, S>(
    stream: &mut T,
    key_pair: KeyPair,
    remote_public_key: PublicKey,
    challenges: S,
    config: &HandshakeConfig,
) -> Result<VerificationResult, SessionError>
where
    T: Stream<Item = Result<Packet, CodecError>> + Sink<Bytes, Error = CodecError> + Unpin,
    S: ChallengeSource,
{
    let mut challenger = Challenger::new(VecDeque::new(), key_pair, remote_public_key, challenges);
    challenger.start();

    run(stream, &mut challenger, config).await
}

trait Exchange {
    fn outbox(&mut self) -> &mut VecDeque<Bytes>;

    fn result(&self) -> Option<VerificationResult>;

    fn handle_packet(&mut self, packet: &Packet);
}

impl<S: ChallengeSource> Exchange for Handshake<'_, VecDeque<Bytes>, S> {
    fn outbox(&mut self) -> &mut VecDeque<Bytes> {
        self.writer_mut()
    }

    fn result(&self) -> Option<VerificationResult> {
        Self::result(self)
    }

    fn handle_packet(&mut self, packet: &Packet) {
        Self::handle_packet(self, packet);
    }
}

impl<S: ChallengeSource> Exchange for Challenger<'_, VecDeque<Bytes>, S> {
    fn outbox(&mut self) -> &mut VecDeque<Bytes> {
        self.writer_mut()
    }

    fn result(&self) -> Option<VerificationResult> {
        Self::result(self)
    }

    fn handle_packet(&mut self, packet: &Packet) {
        Self::handle_packet(self, packet);
    }
}

async fn run<T, E>(
    stream: &mut T,
    exchange: &mut E,
    config: &HandshakeConfig,
) -> Result<VerificationResult, SessionError>
where
    T: Stream<Item = Result<Packet, CodecError>> + Sink<Bytes, Error = CodecError> + Unpin,
    E: Exchange,
{
    match timeout(config.timeout, drive(stream, exchange)).await {
        Ok(result) => result,
        Err(_elapsed) => {
            warn!(timeout=?config.timeout, "Handshake timed out");
            Err(SessionError::Timeout(config.timeout))
        }
    }
}

async fn drive<T, E>(stream: &mut T, exchange: &mut E) -> Result<VerificationResult, SessionError>
where
    T: Stream<Item = Result<Packet, CodecError>> + Sink<Bytes, Error = CodecError> + Unpin,
    E: Exchange,
{
    loop {
        while let Some(frame) = exchange.outbox().pop_front() {
            stream.feed(frame).await?;
        }
        stream.flush().await?;

        if let Some(result) = exchange.result() {
            return Ok(result);
        }

        let Some(packet) = stream.next().await else {
            debug!("Remote closed the connection mid-handshake");
            return Err(SessionError::Closed);
        };

        exchange.handle_packet(&packet?);
    }
}
