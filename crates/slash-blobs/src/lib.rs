//! Blob store for slashdrive.
//!
//! Content is written whole and read whole. [`Blobs::put`] chunks bytes into
//! an append-only log and returns a [`BlobId`] naming the committed span;
//! [`Blobs::get`] reassembles it. The log does the signing, encryption and
//! replication, so a replica holding the same log key (and encryption key)
//! reads blobs the owner wrote.

pub mod blob;
pub mod blobs;
pub mod error;

pub use blob::{BlobId, BlobsConfig, DEFAULT_BLOCK_SIZE};
pub use blobs::Blobs;
pub use error::{BlobError, BlobResult};
