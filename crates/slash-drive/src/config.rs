use serde::{Deserialize, Serialize};
use slash_blobs::{BlobsConfig, DEFAULT_BLOCK_SIZE};

use crate::error::{DriveError, DriveResult};

/// Protocol version written into the header of every new drive.
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Drive tuning, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Version string stored in the header at bootstrap.
    pub protocol_version: String,
    /// Maximum bytes per content block.
    pub blob_block_size: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            blob_block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl DriveConfig {
    /// Parse a config; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> DriveResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| DriveError::Config(e.to_string()))?;
        if config.blob_block_size == 0 {
            return Err(DriveError::Config("blob_block_size must be positive".into()));
        }
        Ok(config)
    }

    pub(crate) fn blobs(&self) -> BlobsConfig {
        BlobsConfig {
            block_size: self.blob_block_size,
        }
    }
}
