use serde::{Deserialize, Serialize};

/// Default size of one content block: 64 KiB.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Location of one blob inside the content log.
///
/// A blob occupies `block_length` consecutive blocks starting at
/// `block_offset`. The byte fields locate the same span in the log's
/// plaintext byte stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId {
    pub block_offset: u64,
    pub block_length: u64,
    pub byte_offset: u64,
    pub byte_length: u64,
}

impl BlobId {
    /// Index one past the last block of this blob.
    pub fn block_end(&self) -> u64 {
        self.block_offset + self.block_length
    }

    /// Returns `true` for a zero-length blob.
    pub fn is_empty(&self) -> bool {
        self.byte_length == 0
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "blocks {}..{} ({} bytes at {})",
            self.block_offset,
            self.block_end(),
            self.byte_length,
            self.byte_offset
        )
    }
}

/// Blob store tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobsConfig {
    /// Maximum bytes per content block.
    pub block_size: usize,
}

impl Default for BlobsConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_span() {
        let id = BlobId {
            block_offset: 2,
            block_length: 3,
            byte_offset: 100,
            byte_length: 40,
        };
        assert_eq!(id.block_end(), 5);
        assert_eq!(id.to_string(), "blocks 2..5 (40 bytes at 100)");
    }

    #[test]
    fn default_block_size() {
        assert_eq!(BlobsConfig::default().block_size, 65536);
        assert!(BlobId::default().is_empty());
    }
}
