//! Append-only signed logs for slashdrive.
//!
//! A log ("core") is a sequence of blocks owned by one Ed25519 key pair.
//! Only the owner can append; anyone holding the public key can read and
//! verify. This crate provides:
//! - [`Corestore`], a storage root handing out log sessions by name, key
//!   pair, or public key, with [`Corestore::namespace`] sub-roots
//! - [`Core`], a session with `ready`/`update`/`append`/`get`, append hooks,
//!   and peer-discovery tracking
//! - [`ReplicationStream`], an in-memory duplex that replicates every log
//!   two roots have in common
//!
//! Blocks are optionally encrypted with ChaCha20-Poly1305 and always
//! signed; replicated blocks are verified before they are committed.

pub mod core;
pub mod error;
pub mod event;
pub mod replicate;
mod storage;
pub mod store;

pub use crate::core::{Core, FindingPeers};
pub use error::{CoreError, CoreResult, ReplicationError};
pub use event::{AppendCallback, AppendEvent, Subscription};
pub use replicate::{ReplicateOptions, ReplicationStream};
pub use store::{CoreOptions, Corestore};
