//! Peer authentication protocols.
//!
//! Provides the packet-driven handshake state machines that let two nodes
//! prove ownership of their keys to each other, plus an async driver that
//! runs them over a framed connection.
//!
//! # Modules
//!
//! - [`handshake`]: the state machines, pure and synchronous
//! - [`session`]: the reader loop feeding them from a packet stream
//! - [`config`]: handshake limits
//!
//! # Example
//!
//! ```rust,ignore
//! use peerauth_crypto::OsChallengeSource;
//! use peerauth_protocols::session;
//!
//! let result = session::authenticate(
//!     &mut stream,
//!     key_pair,
//!     expected_remote_key,
//!     OsChallengeSource,
//!     &config,
//! )
//! .await?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod handshake;
pub mod session;

pub use config::HandshakeConfig;
pub use handshake::{Challenger, Handshake, VerificationResult};
