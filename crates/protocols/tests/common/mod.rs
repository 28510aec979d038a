//! Common test utilities for handshake testing
//!
//! Key material, scripted challenge sources and frame helpers shared by the
//! state machine and session tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use bytes::Bytes;
use peerauth_crypto::{Challenge, ChallengeSource, CHALLENGE_LEN};
use peerauth_network_primitives::Packet;
use peerauth_primitives::identity::KeyPair;
use peerauth_protocols::handshake::ServerChallenge;
use peerauth_protocols::VerificationResult;
use rand::thread_rng;
use tracing_subscriber::EnvFilter;

/// Route handshake logs to the test harness; honours `RUST_LOG`
pub fn init_tracing() {
    let _ignored = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Create a fresh random identity
pub fn create_test_key_pair() -> KeyPair {
    KeyPair::generate(&mut thread_rng())
}

/// A challenge with every byte set to `byte`
pub fn challenge(byte: u8) -> Challenge {
    Challenge::from_bytes([byte; CHALLENGE_LEN])
}

/// The opening packet of a handshake carrying `challenge`
pub fn server_challenge(challenge: Challenge) -> Packet {
    ServerChallenge { challenge }.to_packet()
}

/// Parse every frame a state machine wrote
pub fn parse_frames(frames: &[Bytes]) -> Vec<Packet> {
    frames
        .iter()
        .map(|frame| Packet::parse(frame).expect("state machines only write whole frames"))
        .collect()
}

/// Collects every result a callback receives
#[derive(Debug, Default)]
pub struct ResultLog(Mutex<Vec<VerificationResult>>);

impl ResultLog {
    pub fn record(&self) -> impl FnOnce(VerificationResult) + Send + '_ {
        move |result| self.0.lock().unwrap().push(result)
    }

    pub fn results(&self) -> Vec<VerificationResult> {
        self.0.lock().unwrap().clone()
    }
}

/// Replays a fixed list of challenges, then zeros forever
#[derive(Debug)]
pub struct ScriptedChallenges(VecDeque<Challenge>);

impl ScriptedChallenges {
    pub fn new(challenges: impl IntoIterator<Item = Challenge>) -> Self {
        Self(challenges.into_iter().collect())
    }
}

impl ChallengeSource for ScriptedChallenges {
    fn next_challenge(&mut self) -> Challenge {
        self.0.pop_front().unwrap_or_else(|| challenge(0))
    }
}
