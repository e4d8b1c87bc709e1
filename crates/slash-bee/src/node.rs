//! On-log encoding of index blocks.
//!
//! Block 0 of every index log is a [`Header`] naming the index protocol.
//! Every later block is one key mutation: a put carries the new value, a
//! delete carries none. Blocks are bincode-encoded.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{BeeError, BeeResult};

/// Protocol tag written into the header block.
pub const PROTOCOL: &str = "slash-bee";

/// First block of an index log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub protocol: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
        }
    }
}

/// A single committed block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum Block {
    Header(Header),
    Entry {
        key: Vec<u8>,
        /// `None` records a deletion.
        value: Option<Vec<u8>>,
    },
}

impl Block {
    pub(crate) fn encode(&self) -> BeeResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BeeError::Encode(e.to_string()))
    }

    pub(crate) fn decode(seq: u64, bytes: &[u8]) -> BeeResult<Self> {
        bincode::deserialize(bytes).map_err(|e| BeeError::Decode {
            seq,
            reason: e.to_string(),
        })
    }
}

/// A key-value pair read back from the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Log index of the block that last wrote this key.
    pub seq: u64,
    /// The key, relative to the namespace it was read through.
    pub key: Vec<u8>,
    pub value: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_fails_to_decode() {
        let err = Block::decode(4, &[0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(err, BeeError::Decode { seq: 4, .. }));
    }

    #[test]
    fn delete_is_distinct_from_empty_value() {
        let delete = Block::Entry {
            key: b"k".to_vec(),
            value: None,
        };
        let empty = Block::Entry {
            key: b"k".to_vec(),
            value: Some(Vec::new()),
        };
        assert_ne!(delete.encode().unwrap(), empty.encode().unwrap());
        assert_eq!(Block::decode(1, &delete.encode().unwrap()).unwrap(), delete);
    }

    #[test]
    fn default_header_names_protocol() {
        assert_eq!(Header::default().protocol, PROTOCOL);
    }
}
