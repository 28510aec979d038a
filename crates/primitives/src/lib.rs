//! Value types shared by every peerauth crate.
//!
//! Keys and signatures are thin wrappers around their ed25519 counterparts
//! that fix the wire lengths and give them a stable textual form (base58).

pub mod identity;
