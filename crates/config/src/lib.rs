use std::collections::BTreeSet;
use std::fs::{read_to_string, write};

use camino::Utf8Path;
use eyre::{bail, Result as EyreResult, WrapErr};
use peerauth_primitives::identity::PublicKey;
use peerauth_protocols::handshake::ServerChallengeResponse;
use peerauth_protocols::HandshakeConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize, Serialize)]
#[non_exhaustive]
pub struct ConfigFile {
    #[serde(default)]
    pub handshake: HandshakeConfig,

    #[serde(default, rename = "peer", skip_serializing_if = "Vec::is_empty")]
    pub peers: Vec<PeerConfig>,
}

/// A remote node we are willing to authenticate, and the key it must prove.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[non_exhaustive]
pub struct PeerConfig {
    pub alias: String,
    pub public_key: PublicKey,
}

impl PeerConfig {
    #[must_use]
    pub const fn new(alias: String, public_key: PublicKey) -> Self {
        Self { alias, public_key }
    }
}

impl ConfigFile {
    #[must_use]
    pub const fn new(handshake: HandshakeConfig, peers: Vec<PeerConfig>) -> Self {
        Self { handshake, peers }
    }

    #[must_use]
    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    pub fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = read_to_string(&path)
            .wrap_err_with(|| format!("failed to read configuration from {path:?}"))?;

        let config: Self = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse configuration at {path:?}"))?;

        config.validate()?;

        Ok(config)
    }

    pub fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content)
            .wrap_err_with(|| format!("failed to write configuration to {path:?}"))?;

        Ok(())
    }

    /// Only write config file if changes are detected
    pub fn save_if_changed(&self, dir: &Utf8Path) -> EyreResult<bool> {
        let path = dir.join(CONFIG_FILE);
        let new_content = toml::to_string_pretty(self)?;

        let changed = read_to_string(&path).map_or(true, |existing| existing != new_content);

        if changed {
            write(&path, new_content)
                .wrap_err_with(|| format!("failed to write configuration to {path:?}"))?;
        }

        Ok(changed)
    }

    /// Looks up a known peer by alias.
    #[must_use]
    pub fn peer(&self, alias: &str) -> Option<&PeerConfig> {
        self.peers.iter().find(|peer| peer.alias == alias)
    }

    fn validate(&self) -> EyreResult<()> {
        if self.handshake.timeout.is_zero() {
            bail!("handshake.timeout_ms must be greater than zero");
        }

        let min_packet_size = ServerChallengeResponse::FRAME_SIZE as usize;
        if self.handshake.max_packet_size < min_packet_size {
            bail!(
                "handshake.max_packet_size must be at least {min_packet_size} bytes, got {}",
                self.handshake.max_packet_size
            );
        }

        let mut aliases = BTreeSet::new();
        for peer in &self.peers {
            if !aliases.insert(peer.alias.as_str()) {
                bail!("peer alias {:?} is configured more than once", peer.alias);
            }
        }

        Ok(())
    }
}
