use slash_crypto::KeyPair;
use slash_types::{EncryptionKey, PublicKey};

use crate::config::DriveConfig;

/// How to open a [`Drive`](crate::Drive).
///
/// An owner supplies `key_pair`; a replica supplies only `key`. Owners
/// asking for `encrypted` get a key derived from their secret key unless
/// `encryption_key` is set. Replicas of an encrypted drive must pass the
/// owner's `encryption_key`; it cannot be recovered from the logs.
#[derive(Clone, Debug, Default)]
pub struct DriveOptions {
    pub key: Option<PublicKey>,
    pub key_pair: Option<KeyPair>,
    pub encrypted: bool,
    pub encryption_key: Option<EncryptionKey>,
    pub config: DriveConfig,
}

impl DriveOptions {
    /// Options for the writer holding `key_pair`.
    pub fn owner(key_pair: KeyPair) -> Self {
        Self {
            key_pair: Some(key_pair),
            ..Self::default()
        }
    }

    /// Options for a read-only replica of the drive `key`.
    pub fn replica(key: PublicKey) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }

    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    pub fn encryption_key(mut self, key: EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }

    pub fn config(mut self, config: DriveConfig) -> Self {
        self.config = config;
        self
    }
}
