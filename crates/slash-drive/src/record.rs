//! Object records stored in the index.
//!
//! Each object key maps to a bincode [`ObjectRecord`]: the [`BlobId`] of its
//! bytes plus the caller's metadata as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slash_blobs::BlobId;

use crate::error::{DriveError, DriveResult};

/// Caller-supplied metadata attached to an object.
pub type Metadata = Map<String, Value>;

/// Field added to listed metadata carrying the object's byte length.
pub const CONTENT_LENGTH: &str = "contentLength";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ObjectRecord {
    pub(crate) blob_index: BlobId,
    pub(crate) user_metadata: Option<Vec<u8>>,
}

impl ObjectRecord {
    pub(crate) fn new(key: &str, blob_index: BlobId, metadata: Option<&Metadata>) -> DriveResult<Self> {
        let user_metadata = metadata
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| record_error(key, e))?;
        Ok(Self {
            blob_index,
            user_metadata,
        })
    }

    pub(crate) fn encode(&self, key: &str) -> DriveResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| record_error(key, e))
    }

    pub(crate) fn decode(key: &str, bytes: &[u8]) -> DriveResult<Self> {
        bincode::deserialize(bytes).map_err(|e| record_error(key, e))
    }

    /// Caller metadata merged with the derived content length.
    pub(crate) fn metadata(&self, key: &str) -> DriveResult<Metadata> {
        let mut metadata = match &self.user_metadata {
            Some(bytes) => serde_json::from_slice::<Metadata>(bytes).map_err(|e| record_error(key, e))?,
            None => Metadata::new(),
        };
        metadata.insert(
            CONTENT_LENGTH.to_string(),
            Value::from(self.blob_index.byte_length),
        );
        Ok(metadata)
    }
}

fn record_error(key: &str, e: impl std::fmt::Display) -> DriveError {
    DriveError::Record {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

/// One entry of [`Drive::list`](crate::Drive::list).
#[derive(Clone, Debug, PartialEq)]
pub struct ListEntry {
    pub key: String,
    /// Caller metadata plus `contentLength`.
    pub metadata: Metadata,
}

impl ListEntry {
    pub fn content_length(&self) -> Option<u64> {
        self.metadata.get(CONTENT_LENGTH).and_then(Value::as_u64)
    }
}
