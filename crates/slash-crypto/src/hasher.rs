/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag (e.g., `"slashdrive-discovery-v1"`) that
/// is prepended to every hash computation, so the same input hashed for two
/// purposes never yields the same output. A discovery key can therefore never
/// be mistaken for an encryption key derived from the same bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for log discovery keys.
    pub const DISCOVERY: Self = Self {
        domain: "slashdrive-discovery-v1",
    };
    /// Hasher for encryption keys derived from a secret key.
    pub const ENCRYPTION: Self = Self {
        domain: "slashdrive-encryption-v1",
    };
    /// Hasher for the signable digest of a stored block.
    pub const BLOCK: Self = Self {
        domain: "slashdrive-block-v1",
    };
    /// Hasher for per-block cipher nonces.
    pub const NONCE: Self = Self {
        domain: "slashdrive-nonce-v1",
    };
    /// Hasher for named key pair seeds.
    pub const KEY_PAIR: Self = Self {
        domain: "slashdrive-keypair-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        self.hash_parts(&[data])
    }

    /// Hash several byte strings with domain separation.
    ///
    /// Every part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]`
    /// produce different hashes.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(&(part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        *hasher.finalize().as_bytes()
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let h1 = ContentHasher::BLOCK.hash(b"hello world");
        let h2 = ContentHasher::BLOCK.hash(b"hello world");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        let discovery = ContentHasher::DISCOVERY.hash(data);
        let encryption = ContentHasher::ENCRYPTION.hash(data);
        let block = ContentHasher::BLOCK.hash(data);
        assert_ne!(discovery, encryption);
        assert_ne!(discovery, block);
        assert_ne!(encryption, block);
    }

    #[test]
    fn parts_are_length_prefixed() {
        let a = ContentHasher::NONCE.hash_parts(&[b"ab", b"c"]);
        let b = ContentHasher::NONCE.hash_parts(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn domain_hash_differs_from_raw_blake3() {
        let raw = *blake3::hash(b"test").as_bytes();
        assert_ne!(raw, ContentHasher::BLOCK.hash(b"test"));
    }

    #[test]
    fn custom_domain() {
        let hasher = ContentHasher::new("my-custom-domain-v1");
        assert_eq!(hasher.domain(), "my-custom-domain-v1");
        assert_ne!(hasher.hash(b"data"), ContentHasher::BLOCK.hash(b"data"));
    }
}
