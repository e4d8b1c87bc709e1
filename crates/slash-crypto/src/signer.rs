use serde::{Deserialize, Serialize};
use slash_types::PublicKey;

/// Ed25519 key pair owning an append-only log.
///
/// Holding the key pair is what makes a log writable. The public half is
/// the log's identity; the secret half never leaves this type except through
/// [`KeyPair::secret_key`], which key derivation reads.
#[derive(Clone)]
pub struct KeyPair(ed25519_dalek::SigningKey);

/// Ed25519 signature over a block digest.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_serde")] ed25519_dalek::Signature);

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// The public key identifying the log this pair signs.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.0.verifying_key().to_bytes())
    }

    /// Raw secret key bytes.
    pub fn secret_key(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }
}

/// Verify `signature` on `message` against a log's public key.
pub fn verify(
    public_key: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    use ed25519_dalek::Verifier;
    let key = ed25519_dalek::VerifyingKey::from_bytes(public_key.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    key.verify(message, &signature.0)
        .map_err(|_| SignatureError::InvalidSignature)
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair({}, <redacted>)", self.public_key().short_hex())
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0.to_bytes()[..8]))
    }
}

/// Errors from signing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key")]
    InvalidKey,
}

mod signature_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(sig: &ed25519_dalek::Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ed25519_dalek::Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&arr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let pair = KeyPair::generate();
        let sig = pair.sign(b"hello world");
        assert!(verify(&pair.public_key(), b"hello world", &sig).is_ok());
    }

    #[test]
    fn verify_fails_on_wrong_message() {
        let pair = KeyPair::generate();
        let sig = pair.sign(b"correct message");
        assert_eq!(
            verify(&pair.public_key(), b"wrong message", &sig),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        let sig = a.sign(b"message");
        assert!(verify(&b.public_key(), b"message", &sig).is_err());
    }

    #[test]
    fn from_secret_bytes_restores_public_key() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_secret_bytes(*pair.secret_key());
        assert_eq!(pair.public_key(), restored.public_key());
    }

    #[test]
    fn signature_serde_roundtrip() {
        let sig = KeyPair::generate().sign(b"test");
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, parsed);
    }

    #[test]
    fn debug_redacts_secret() {
        let pair = KeyPair::generate();
        let debug = format!("{pair:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains(&hex::encode(pair.secret_key())));
    }
}
