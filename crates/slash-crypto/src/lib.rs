//! Cryptographic primitives for slashdrive.
//!
//! Provides domain-separated BLAKE3 hashing, one-way key derivation for the
//! drive's two logs, Ed25519 key pairs for log signing, and ChaCha20-Poly1305
//! block encryption.
//!
//! Every primitive comes from an established crate (`blake3`, `ed25519-dalek`,
//! `chacha20poly1305`); nothing here implements cryptography itself.

pub mod cipher;
pub mod derive;
pub mod hasher;
pub mod signer;

pub use cipher::{BlockCipher, CipherError};
pub use derive::{derive_encryption_key, derive_key_pair, discovery_key};
pub use hasher::ContentHasher;
pub use signer::{verify, KeyPair, Signature, SignatureError};
