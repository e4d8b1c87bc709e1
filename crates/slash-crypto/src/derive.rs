//! One-way derivations between the keys of a drive.
//!
//! Every derivation here runs through a domain-separated BLAKE3 hash, so no
//! derived value can be inverted back to the material it came from. In
//! particular the encryption key shared by a drive's two logs reveals nothing
//! about the secret key that makes them writable.

use slash_types::{DiscoveryKey, EncryptionKey, PublicKey};

use crate::hasher::ContentHasher;
use crate::signer::KeyPair;

/// The discovery key under which a log is announced to peers.
pub fn discovery_key(public_key: &PublicKey) -> DiscoveryKey {
    DiscoveryKey::from_bytes(ContentHasher::DISCOVERY.hash(public_key.as_bytes()))
}

/// Derive the block encryption key for an owner's logs.
///
/// Deterministic: the same key pair always yields the same key, so an owner
/// reopening a drive can decrypt what it wrote before.
pub fn derive_encryption_key(key_pair: &KeyPair) -> EncryptionKey {
    EncryptionKey::from_bytes(ContentHasher::ENCRYPTION.hash(key_pair.secret_key()))
}

/// Derive the key pair of a named log inside a storage namespace.
///
/// `primary_key` is the storage root's seed and `namespace` the path of
/// namespace labels leading to the log.
pub fn derive_key_pair(primary_key: &[u8; 32], namespace: &[Vec<u8>], name: &str) -> KeyPair {
    let mut parts: Vec<&[u8]> = Vec::with_capacity(namespace.len() + 2);
    parts.push(primary_key);
    parts.extend(namespace.iter().map(Vec::as_slice));
    parts.push(name.as_bytes());
    KeyPair::from_secret_bytes(ContentHasher::KEY_PAIR.hash_parts(&parts))
}
