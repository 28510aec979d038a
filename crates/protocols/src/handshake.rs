//! Mutual challenge-response authentication.
//!
//! Both sides prove possession of the private key behind the identity they
//! claim. The peer that answers first signs the incoming challenge and
//! attaches a challenge of its own, so the exchange takes two legs instead of
//! four:
//!
//! ```text
//! Challenger (A)                                   Handshake (B)
//!   │                                                   │
//!   │ ── ServerChallenge { c1 } ──────────────────────► │
//!   │                                                   │ sign(c1), draw c2
//!   │ ◄── ServerChallengeResponse { sig(c1), c2, PkB } ─│
//!   │ verify sig(c1) with PkB, sign(c2)                 │
//!   │ ── ClientChallengeResponse { sig(c2) } ─────────► │
//!   │                                                   │ verify sig(c2) with PkA
//!   ▼                                                   ▼
//! ```
//!
//! Both state machines are synchronous and do no I/O beyond handing frames to
//! a [`PacketWriter`](peerauth_network_primitives::PacketWriter). Each
//! produces exactly one [`VerificationResult`]; once it has, every later
//! packet is ignored.

use core::fmt;

use serde::{Deserialize, Serialize};

mod challenge;
mod challenger;
mod message;
mod notifier;
mod responder;

pub use challenge::{
    build_challenge_response, fresh_challenge, verify_challenge_response, ChallengeError,
    MAX_CHALLENGE_DRAWS,
};
pub use challenger::{Challenger, ChallengerState};
pub use message::{ClientChallengeResponse, MalformedPacket, ServerChallenge, ServerChallengeResponse};
pub use responder::{Handshake, HandshakeState};

/// Terminal outcome of one handshake attempt.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationResult {
    /// Both legs of the mutual proof completed.
    Success,
    /// A packet of the wrong type, or of the wrong shape, arrived before the
    /// handshake was resolved.
    MalformedData,
    /// A well-formed response carried a signature that does not verify, or
    /// the local challenge source could not produce a usable challenge
    /// within [`MAX_CHALLENGE_DRAWS`] draws.
    FailedChallenge,
}

impl VerificationResult {
    /// Whether the peer is now authenticated.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Success => "success",
            Self::MalformedData => "malformedData",
            Self::FailedChallenge => "failedChallenge",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_display_matches_serde() {
        for result in [
            VerificationResult::Success,
            VerificationResult::MalformedData,
            VerificationResult::FailedChallenge,
        ] {
            let json = serde_json::to_value(result).unwrap();
            assert_eq!(json, serde_json::Value::String(result.to_string()));
        }
    }

    #[test]
    fn test_only_success_is_success() {
        assert!(VerificationResult::Success.is_success());
        assert!(!VerificationResult::MalformedData.is_success());
        assert!(!VerificationResult::FailedChallenge.is_success());
    }
}
