use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width in bytes of every key type in this module.
pub const KEY_LENGTH: usize = 32;

macro_rules! key_bytes_impl {
    ($name:ident) => {
        impl $name {
            /// Create from raw 32 bytes.
            pub const fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
                Self(bytes)
            }

            /// Create from a slice, checking its length.
            pub fn try_from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
                let arr: [u8; KEY_LENGTH] =
                    bytes.try_into().map_err(|_| TypeError::InvalidLength {
                        expected: KEY_LENGTH,
                        actual: bytes.len(),
                    })?;
                Ok(Self(arr))
            }

            /// The raw 32 bytes.
            pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
                &self.0
            }

            /// Full hex-encoded string.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from a 64 character hex string.
            pub fn from_hex(s: &str) -> Result<Self, TypeError> {
                let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
                Self::try_from_slice(&bytes)
            }
        }

        impl From<[u8; KEY_LENGTH]> for $name {
            fn from(bytes: [u8; KEY_LENGTH]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

/// Public key of an append-only log.
///
/// The public key of a drive's index log doubles as the drive's identity:
/// anyone holding it can locate, replicate, and verify the drive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey([u8; KEY_LENGTH]);

key_bytes_impl!(PublicKey);

impl PublicKey {
    /// Short identifier (first 8 hex characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.short_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Network-visible identifier of a log.
///
/// A one-way hash of the [`PublicKey`]: peers can find each other by it
/// without revealing the key needed to verify (or decrypt) the log.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DiscoveryKey([u8; KEY_LENGTH]);

key_bytes_impl!(DiscoveryKey);

impl fmt::Debug for DiscoveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiscoveryKey({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for DiscoveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Symmetric key used to encrypt log blocks at rest and on the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionKey([u8; KEY_LENGTH]);

key_bytes_impl!(EncryptionKey);

impl EncryptionKey {
    /// Generate a random key. Intended for tests; owners derive theirs.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_roundtrip() {
        let key = PublicKey::from_bytes([7; 32]);
        let parsed = PublicKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, parsed);
    }

    #[test]
    fn from_hex_rejects_short_input() {
        let err = PublicKey::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            DiscoveryKey::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn try_from_slice_checks_length() {
        assert!(PublicKey::try_from_slice(&[1; 31]).is_err());
        assert!(PublicKey::try_from_slice(&[1; 32]).is_ok());
    }

    #[test]
    fn short_hex_is_8_chars() {
        let key = PublicKey::from_bytes([0xab; 32]);
        assert_eq!(key.short_hex(), "abababab");
    }

    #[test]
    fn display_is_full_hex() {
        let key = DiscoveryKey::from_bytes([1; 32]);
        assert_eq!(format!("{key}").len(), 64);
    }

    #[test]
    fn debug_redacts_encryption_key() {
        let key = EncryptionKey::random();
        let debug = format!("{key:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains(&key.to_hex()));
    }

    #[test]
    fn random_encryption_keys_differ() {
        assert_ne!(EncryptionKey::random(), EncryptionKey::random());
    }

    #[test]
    fn serde_roundtrip() {
        let key = PublicKey::from_bytes([9; 32]);
        let json = serde_json::to_string(&key).unwrap();
        let parsed: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, parsed);
    }

    proptest! {
        #[test]
        fn any_bytes_survive_hex(bytes in proptest::array::uniform32(any::<u8>())) {
            let key = PublicKey::from_bytes(bytes);
            prop_assert_eq!(PublicKey::from_hex(&key.to_hex()).unwrap(), key);
        }
    }
}
