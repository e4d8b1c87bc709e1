use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use slash_types::{EncryptionKey, PublicKey};

use crate::hasher::ContentHasher;

/// ChaCha20-Poly1305 cipher for the blocks of one log.
///
/// Nonces are derived from the log's public key and the block index. A
/// drive's two logs share one encryption key, and the public key in the
/// nonce keeps their nonce spaces disjoint. Blocks are append-only and never
/// rewritten, so a (key, nonce) pair is used at most once.
pub struct BlockCipher {
    cipher: ChaCha20Poly1305,
    log: PublicKey,
}

impl BlockCipher {
    /// Create a cipher for the log identified by `log`.
    pub fn new(key: &EncryptionKey, log: PublicKey) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
            log,
        }
    }

    /// Encrypt the block stored at `index`.
    pub fn encrypt(&self, index: u64, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = self.nonce(index);
        self.cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CipherError::Encrypt { index })
    }

    /// Decrypt and authenticate the block stored at `index`.
    pub fn decrypt(&self, index: u64, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let nonce = self.nonce(index);
        self.cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt { index })
    }

    fn nonce(&self, index: u64) -> [u8; 12] {
        let digest = ContentHasher::NONCE.hash_parts(&[self.log.as_bytes(), &index.to_le_bytes()]);
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&digest[..12]);
        nonce
    }
}

/// Errors from block encryption.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("failed to encrypt block {index}")]
    Encrypt { index: u64 },
    /// Wrong key, or the block was tampered with.
    #[error("failed to decrypt block {index}")]
    Decrypt { index: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> PublicKey {
        PublicKey::from_bytes([1; 32])
    }

    #[test]
    fn encrypt_then_decrypt() {
        let cipher = BlockCipher::new(&EncryptionKey::random(), log());
        let ct = cipher.encrypt(0, b"hello").unwrap();
        assert_ne!(ct.as_slice(), b"hello");
        assert_eq!(cipher.decrypt(0, &ct).unwrap(), b"hello");
    }

    #[test]
    fn wrong_key_fails() {
        let ct = BlockCipher::new(&EncryptionKey::random(), log())
            .encrypt(3, b"secret")
            .unwrap();
        let other = BlockCipher::new(&EncryptionKey::random(), log());
        assert_eq!(other.decrypt(3, &ct), Err(CipherError::Decrypt { index: 3 }));
    }

    #[test]
    fn wrong_index_fails() {
        let cipher = BlockCipher::new(&EncryptionKey::random(), log());
        let ct = cipher.encrypt(1, b"block").unwrap();
        assert!(cipher.decrypt(2, &ct).is_err());
    }

    #[test]
    fn logs_sharing_a_key_use_distinct_nonces() {
        let key = EncryptionKey::random();
        let a = BlockCipher::new(&key, PublicKey::from_bytes([1; 32]));
        let b = BlockCipher::new(&key, PublicKey::from_bytes([2; 32]));
        assert_ne!(a.encrypt(0, b"same").unwrap(), b.encrypt(0, b"same").unwrap());
    }
}
