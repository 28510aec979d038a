use peerauth_crypto::{Challenge, ChallengeSource};
use peerauth_primitives::identity::{KeyPair, PublicKey, Signature};
use thiserror::Error;

/// Draws allowed before a challenge source is considered broken.
pub const MAX_CHALLENGE_DRAWS: usize = 4;

/// The challenge source kept producing unusable values.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("no usable challenge after {draws} draws")]
pub struct ChallengeError {
    /// Number of values drawn and rejected.
    pub draws: usize,
}

/// Draws a challenge that is neither all-zero nor equal to `received`.
///
/// A healthy CSPRNG satisfies this on the first draw; repeated rejections
/// mean the source is degenerate and the handshake must not proceed.
pub fn fresh_challenge<S: ChallengeSource + ?Sized>(
    source: &mut S,
    received: Option<&Challenge>,
) -> Result<Challenge, ChallengeError> {
    for _ in 0..MAX_CHALLENGE_DRAWS {
        let challenge = source.next_challenge();

        if !challenge.is_zero() && received != Some(&challenge) {
            return Ok(challenge);
        }
    }

    Err(ChallengeError {
        draws: MAX_CHALLENGE_DRAWS,
    })
}

/// Signs `received` with the local key and draws a new challenge for the
/// remote, distinct from the one just received.
pub fn build_challenge_response<S: ChallengeSource + ?Sized>(
    received: &Challenge,
    key_pair: &KeyPair,
    source: &mut S,
) -> Result<(Signature, Challenge), ChallengeError> {
    let challenge = fresh_challenge(source, Some(received))?;
    let signature = key_pair.sign(received.as_bytes());

    Ok((signature, challenge))
}

/// Checks that `signature` was made over `issued` by the holder of
/// `remote_public_key`.
#[must_use]
pub fn verify_challenge_response(
    issued: &Challenge,
    remote_public_key: &PublicKey,
    signature: &Signature,
) -> bool {
    remote_public_key.verify(issued.as_bytes(), signature)
}
