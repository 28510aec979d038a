use core::fmt;

use peerauth_crypto::{Challenge, ChallengeSource};
use peerauth_network_primitives::{Packet, PacketWriter};
use peerauth_primitives::identity::{KeyPair, PublicKey};
use tracing::{debug, info, trace, warn};

use super::challenge::{fresh_challenge, verify_challenge_response};
use super::message::{ClientChallengeResponse, ServerChallenge, ServerChallengeResponse};
use super::notifier::ResultNotifier;
use super::VerificationResult;

/// Where a [`Challenger`] stands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChallengerState {
    /// Nothing sent yet. Initial state.
    Idle,
    /// Our challenge is out; waiting for the remote's proof over `issued`.
    AwaitingServerResponse {
        /// Challenge sent in our `ServerChallenge`.
        issued: Challenge,
    },
    /// The remote proved its identity and our proof has been sent. Terminal.
    Verified,
    /// The exchange was rejected. Terminal.
    Failed,
}

impl ChallengerState {
    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Failed)
    }
}

/// The opening side of the exchange (peer A).
///
/// Issues the first challenge, checks the remote's proof and its claimed key
/// against the expected one, then proves itself by signing the counter-
/// challenge. Result semantics match [`Handshake`](super::Handshake).
pub struct Challenger<'a, W, S> {
    writer: W,
    key_pair: KeyPair,
    remote_public_key: PublicKey,
    challenges: S,
    state: ChallengerState,
    notifier: ResultNotifier<'a>,
}

impl<'a, W: PacketWriter, S: ChallengeSource> Challenger<'a, W, S> {
    /// Creates a challenger in [`ChallengerState::Idle`].
    pub fn new(writer: W, key_pair: KeyPair, remote_public_key: PublicKey, challenges: S) -> Self {
        Self {
            writer,
            key_pair,
            remote_public_key,
            challenges,
            state: ChallengerState::Idle,
            notifier: ResultNotifier::new(),
        }
    }

    /// Registers the consumer of the result; see [`Handshake::on_result`](super::Handshake::on_result).
    pub fn on_result(&mut self, callback: impl FnOnce(VerificationResult) + Send + 'a) {
        self.notifier.subscribe(Box::new(callback));
    }

    /// Sends the opening challenge. Does nothing unless [`ChallengerState::Idle`].
    pub fn start(&mut self) {
        if self.state != ChallengerState::Idle {
            trace!(state=?self.state, "Challenge already issued");
            return;
        }

        let issued = match fresh_challenge(&mut self.challenges, None) {
            Ok(issued) => issued,
            Err(err) => {
                warn!(%err, "Unable to issue a challenge");
                return self.finish(VerificationResult::FailedChallenge);
            }
        };

        self.writer
            .write(ServerChallenge { challenge: issued }.to_packet().to_frame());
        self.state = ChallengerState::AwaitingServerResponse { issued };

        debug!(remote=%self.remote_public_key, "Issued server challenge");
    }

    /// Drives one transition from a single parsed packet.
    pub fn handle_packet(&mut self, packet: &Packet) {
        match self.state {
            ChallengerState::Idle => {
                warn!(
                    packet_type=%packet.packet_type,
                    "Remote spoke before being challenged"
                );
                self.finish(VerificationResult::MalformedData);
            }
            ChallengerState::AwaitingServerResponse { issued } => {
                self.on_server_response(&issued, packet);
            }
            ChallengerState::Verified | ChallengerState::Failed => {
                trace!(
                    state=?self.state,
                    packet_type=%packet.packet_type,
                    "Ignoring packet after handshake resolution"
                );
            }
        }
    }

    fn on_server_response(&mut self, issued: &Challenge, packet: &Packet) {
        let response = match ServerChallengeResponse::from_packet(packet) {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "Rejecting server challenge response");
                return self.finish(VerificationResult::MalformedData);
            }
        };

        if response.public_key != self.remote_public_key {
            warn!(
                expected=%self.remote_public_key,
                claimed=%response.public_key,
                "Remote claims an unexpected identity"
            );
            return self.finish(VerificationResult::FailedChallenge);
        }

        if !verify_challenge_response(issued, &self.remote_public_key, &response.signature) {
            warn!(
                remote=%self.remote_public_key,
                "Remote failed to prove ownership of its key"
            );
            return self.finish(VerificationResult::FailedChallenge);
        }

        if response.challenge == *issued || response.challenge.is_zero() {
            warn!(
                remote=%self.remote_public_key,
                "Remote returned a degenerate counter-challenge"
            );
            return self.finish(VerificationResult::MalformedData);
        }

        let proof = ClientChallengeResponse {
            signature: self.key_pair.sign(response.challenge.as_bytes()),
        };

        self.writer.write(proof.to_packet().to_frame());
        self.finish(VerificationResult::Success);
    }

    fn finish(&mut self, result: VerificationResult) {
        self.state = if result.is_success() {
            ChallengerState::Verified
        } else {
            ChallengerState::Failed
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
    pub const fn state(&self) -> &ChallengerState {
        &self.state
    }

    /// The result, once resolved.
    #[must_use]
    pub const fn result(&self) -> Option<VerificationResult> {
        self.notifier.result()
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

    /// Discards the challenger, keeping its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W, S> fmt::Debug for Challenger<'_, W, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Challenger")
            .field("state", &self.state)
            .field("local", self.key_pair.public_key())
            .field("remote", &self.remote_public_key)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
