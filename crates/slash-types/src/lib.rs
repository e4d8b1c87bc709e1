//! Foundation types for slashdrive.
//!
//! A drive is built from two append-only logs. Every log is identified by an
//! Ed25519 public key, announced on the network under a discovery key, and
//! optionally encrypted with a symmetric key. This crate provides the
//! fixed-width newtypes for those three identifiers. Every other slashdrive
//! crate depends on `slash-types`.
//!
//! # Key Types
//!
//! - [`PublicKey`] — identity of a log (and of the drive, via its index log)
//! - [`DiscoveryKey`] — network-visible hash of a [`PublicKey`]
//! - [`EncryptionKey`] — symmetric block encryption key shared by both logs

pub mod error;
pub mod key;

pub use error::TypeError;
pub use key::{DiscoveryKey, EncryptionKey, PublicKey, KEY_LENGTH};
