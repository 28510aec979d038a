use core::fmt;

use peerauth_crypto::{Challenge, ChallengeSource};
use peerauth_network_primitives::{Packet, PacketWriter};
use peerauth_primitives::identity::{KeyPair, PublicKey};
use tracing::{debug, info, trace, warn};

use super::challenge::{build_challenge_response, verify_challenge_response};
use super::message::{ClientChallengeResponse, ServerChallenge, ServerChallengeResponse};
use super::notifier::ResultNotifier;
use super::VerificationResult;

/// Where a [`Handshake`] stands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HandshakeState {
    /// Waiting for the remote's challenge. Initial state.
    AwaitingServerChallenge,
    /// Our proof is out; waiting for the remote's signature over `issued`.
    AwaitingClientResponse {
        /// Challenge sent in our `ServerChallengeResponse`.
        issued: Challenge,
    },
    /// The remote proved its identity. Terminal.
    Verified,
    /// The exchange was rejected. Terminal.
    Failed,
}

impl HandshakeState {
    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Failed)
    }
}

/// The answering side of the exchange (peer B).
///
/// Bound to one connection attempt: the local key pair, the key the remote
/// must prove it holds, and the writer for the outbound half of the socket.
/// Packets go in through [`handle_packet`](Self::handle_packet) in arrival
/// order; the single result comes out through
/// [`on_result`](Self::on_result).
///
/// Until resolved the connection must carry authentication packets only: any
/// other packet fails the handshake with
/// [`VerificationResult::MalformedData`]. Once resolved, every packet is
/// ignored, so retransmissions from a legitimate peer are harmless.
pub struct Handshake<'a, W, S> {
    writer: W,
    key_pair: KeyPair,
    remote_public_key: PublicKey,
    challenges: S,
    state: HandshakeState,
    notifier: ResultNotifier<'a>,
}

impl<'a, W: PacketWriter, S: ChallengeSource> Handshake<'a, W, S> {
    /// Starts a handshake in [`HandshakeState::AwaitingServerChallenge`].
    pub fn new(writer: W, key_pair: KeyPair, remote_public_key: PublicKey, challenges: S) -> Self {
        Self {
            writer,
            key_pair,
            remote_public_key,
            challenges,
            state: HandshakeState::AwaitingServerChallenge,
            notifier: ResultNotifier::new(),
        }
    }

    /// Registers the consumer of the result.
    ///
    /// The callback runs at most once. If the result is already known it
    /// runs immediately; a callback registered after delivery is never run.
    pub fn on_result(&mut self, callback: impl FnOnce(VerificationResult) + Send + 'a) {
        self.notifier.subscribe(Box::new(callback));
    }

    /// Drives one transition from a single parsed packet.
    pub fn handle_packet(&mut self, packet: &Packet) {
        match self.state {
            HandshakeState::AwaitingServerChallenge => self.on_server_challenge(packet),
            HandshakeState::AwaitingClientResponse { issued } => {
                self.on_client_response(&issued, packet);
            }
            HandshakeState::Verified | HandshakeState::Failed => {
                trace!(
                    state=?self.state,
                    packet_type=%packet.packet_type,
                    "Ignoring packet after handshake resolution"
                );
            }
        }
    }

    fn on_server_challenge(&mut self, packet: &Packet) {
        let request = match ServerChallenge::from_packet(packet) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "Rejecting first handshake packet");
                return self.finish(VerificationResult::MalformedData);
            }
        };

        let (signature, issued) = match build_challenge_response(
            &request.challenge,
            &self.key_pair,
            &mut self.challenges,
        ) {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "Unable to issue a counter-challenge");
                return self.finish(VerificationResult::FailedChallenge);
            }
        };

        let response = ServerChallengeResponse {
            signature,
            challenge: issued,
            public_key: *self.key_pair.public_key(),
        };

        self.writer.write(response.to_packet().to_frame());
        self.state = HandshakeState::AwaitingClientResponse { issued };

        debug!(
            remote=%self.remote_public_key,
            "Answered server challenge, awaiting client challenge response"
        );
    }

    fn on_client_response(&mut self, issued: &Challenge, packet: &Packet) {
        let response = match ClientChallengeResponse::from_packet(packet) {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "Rejecting client challenge response");
                return self.finish(VerificationResult::MalformedData);
            }
        };

        if verify_challenge_response(issued, &self.remote_public_key, &response.signature) {
            self.finish(VerificationResult::Success);
        } else {
            warn!(
                remote=%self.remote_public_key,
                "Remote failed to prove ownership of its key"
            );
            self.finish(VerificationResult::FailedChallenge);
        }
    }

    fn finish(&mut self, result: VerificationResult) {
        self.state = if result.is_success() {
            HandshakeState::Verified
        } else {
            HandshakeState::Failed
        };

        if self.notifier.resolve(result) {
            if result.is_success() {
                info!(remote=%self.remote_public_key, "Peer authenticated");
            } else {
                debug!(remote=%self.remote_public_key, %result, "Handshake failed");
            }
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// The result, once resolved.
    #[must_use]
    pub const fn result(&self) -> Option<VerificationResult> {
        self.notifier.result()
    }

    /// Key the remote is expected to prove.
    #[must_use]
    pub const fn remote_public_key(&self) -> &PublicKey {
        &self.remote_public_key
    }

    /// The outbound writer.
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// The outbound writer, mutably; used by drivers that queue frames.
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Discards the handshake, keeping its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W, S> fmt::Debug for Handshake<'_, W, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handshake")
            .field("state", &self.state)
            .field("local", self.key_pair.public_key())
            .field("remote", &self.remote_public_key)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
