use core::fmt;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

pub const CHALLENGE_LEN: usize = 64;

/// A random value a peer must sign to prove it holds a private key.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Challenge([u8; CHALLENGE_LEN]);

impl Challenge {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CHALLENGE_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHALLENGE_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }
}

impl AsRef<[u8]> for Challenge {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&hex::encode(self.0))
    }
}

impl fmt::Debug for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Challenge({self})")
    }
}

/// Where fresh challenges come from.
///
/// Production code uses [`OsChallengeSource`]; tests substitute a
/// deterministic or scripted implementation.
pub trait ChallengeSource {
    fn next_challenge(&mut self) -> Challenge;
}

impl<S: ChallengeSource + ?Sized> ChallengeSource for &mut S {
    fn next_challenge(&mut self) -> Challenge {
        (**self).next_challenge()
    }
}

impl<S: ChallengeSource + ?Sized> ChallengeSource for Box<S> {
    fn next_challenge(&mut self) -> Challenge {
        (**self).next_challenge()
    }
}

/// Challenges drawn from the operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsChallengeSource;

impl ChallengeSource for OsChallengeSource {
    fn next_challenge(&mut self) -> Challenge {
        let mut bytes = [0; CHALLENGE_LEN];
        OsRng.fill_bytes(&mut bytes);

        Challenge(bytes)
    }
}

/// Reproducible challenge stream, for tests and simulations only.
#[derive(Clone, Debug)]
pub struct SeededChallengeSource {
    rng: StdRng,
}

impl SeededChallengeSource {
    #[must_use]
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            rng: StdRng::from_seed(seed),
        }
    }

    #[must_use]
    pub fn from_u64(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ChallengeSource for SeededChallengeSource {
    fn next_challenge(&mut self) -> Challenge {
        let mut bytes = [0; CHALLENGE_LEN];
        self.rng.fill_bytes(&mut bytes);

        Challenge(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_os_source_draws_distinct_non_zero_challenges() {
        let mut source = OsChallengeSource;

        let drawn: HashSet<_> = (0..1_000).map(|_| source.next_challenge()).collect();

        assert_eq!(drawn.len(), 1_000, "challenges must not repeat");
        assert!(drawn.iter().all(|c| !c.is_zero()), "no all-zero challenge");
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let mut a = SeededChallengeSource::from_u64(7);
        let mut b = SeededChallengeSource::from_u64(7);

        for _ in 0..16 {
            assert_eq!(a.next_challenge(), b.next_challenge());
        }
    }

    #[test]
    fn test_seeded_sources_diverge_across_seeds() {
        let mut a = SeededChallengeSource::new([1; 32]);
        let mut b = SeededChallengeSource::new([2; 32]);

        assert_ne!(a.next_challenge(), b.next_challenge());
    }

    #[test]
    fn test_source_through_mutable_reference() {
        fn draw<S: ChallengeSource>(mut source: S) -> Challenge {
            source.next_challenge()
        }

        let mut seeded = SeededChallengeSource::from_u64(3);
        let first = draw(&mut seeded);
        let second = draw(&mut seeded);

        assert_ne!(first, second, "the borrowed source must advance");
    }

    #[test]
    fn test_challenge_from_slice_requires_exact_length() {
        assert!(Challenge::try_from_slice(&[1; CHALLENGE_LEN]).is_some());
        assert!(Challenge::try_from_slice(&[1; CHALLENGE_LEN + 1]).is_none());
    }

    #[test]
    fn test_zero_challenge_detection() {
        assert!(Challenge::from_bytes([0; CHALLENGE_LEN]).is_zero());

        let mut bytes = [0; CHALLENGE_LEN];
        bytes[63] = 1;
        assert!(!Challenge::from_bytes(bytes).is_zero());
    }
}
