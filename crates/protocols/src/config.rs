//! Limits applied while driving a handshake over a connection.

use core::time::Duration;

use peerauth_network_primitives::DEFAULT_MAX_PACKET_SIZE;
use serde::{Deserialize, Serialize};

/// Default bound on a whole handshake exchange.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handshake settings, usually read from the `[handshake]` table of the node
/// configuration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[non_exhaustive]
pub struct HandshakeConfig {
    /// Time allowed for the complete exchange before it is abandoned.
    #[serde(
        rename = "timeout_ms",
        with = "serde_duration",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// Largest frame accepted from the peer, header included.
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
}

impl HandshakeConfig {
    /// Builds a configuration from explicit limits.
    #[must_use]
    pub const fn new(timeout: Duration, max_packet_size: usize) -> Self {
        Self {
            timeout,
            max_packet_size,
        }
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_MAX_PACKET_SIZE)
    }
}

const fn default_timeout() -> Duration {
    DEFAULT_HANDSHAKE_TIMEOUT
}

const fn default_max_packet_size() -> usize {
    DEFAULT_MAX_PACKET_SIZE
}

mod serde_duration {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
