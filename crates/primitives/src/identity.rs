#[cfg(test)]
#[path = "tests/identity.rs"]
mod tests;

use core::fmt;
use core::str::FromStr;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::{CryptoRng, Rng};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const PRIVATE_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvalidPublicKey {
    #[error("invalid base58: {0}")]
    Encoding(#[from] bs58::decode::Error),
    #[error("expected {PUBLIC_KEY_LEN} bytes, got {0}")]
    Length(usize),
    #[error("not a valid ed25519 point")]
    Point,
}

/// A node's public identity.
///
/// Only constructible from bytes that decompress to a valid curve point, so a
/// `PublicKey` in hand can always be used to verify.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_LEN]) -> Result<Self, InvalidPublicKey> {
        VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| InvalidPublicKey::Point)
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, InvalidPublicKey> {
        let bytes: &[u8; PUBLIC_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| InvalidPublicKey::Length(bytes.len()))?;

        Self::from_bytes(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; PUBLIC_KEY_LEN] {
        self.0.to_bytes()
    }

    /// Strict ed25519 verification: rejects non-canonical encodings and
    /// small-order components in addition to plain mismatches.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);

        self.0.verify_strict(message, &signature).is_ok()
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&bs58::encode(self.as_bytes()).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&format_args!("{self}")).finish()
    }
}

impl FromStr for PublicKey {
    type Err = InvalidPublicKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; PUBLIC_KEY_LEN];

        let len = bs58::decode(s).onto(&mut bytes)?;
        if len != PUBLIC_KEY_LEN {
            return Err(InvalidPublicKey::Length(len));
        }

        Self::from_bytes(&bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = <String as Deserialize>::deserialize(deserializer)?;

        encoded.parse().map_err(de::Error::custom)
    }
}

/// An ed25519 secret seed. Never printed.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    #[must_use]
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_LEN]) -> Self {
        Self(SigningKey::from_bytes(bytes))
    }

    pub fn random<R: Rng + CryptoRng>(csprng: &mut R) -> Self {
        Self::from_bytes(&csprng.gen())
    }

    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message).to_bytes())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// The local node's identity: a private key and the public key derived from it.
///
/// Immutable once built; the handshake only ever reads from it.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    #[must_use]
    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();

        Self {
            private_key,
            public_key,
        }
    }

    pub fn generate<R: Rng + CryptoRng>(csprng: &mut R) -> Self {
        Self::from_private_key(PrivateKey::random(csprng))
    }

    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.private_key.sign(message)
    }
}

/// A detached 64-byte ed25519 signature as carried on the wire.
///
/// Holds raw bytes; whether they form a valid signature is only decided by
/// [`PublicKey::verify`].
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; SIGNATURE_LEN] {
        self.0
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}
