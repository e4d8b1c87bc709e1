//! Header entries binding a drive's index log to its content log.
//!
//! The header lives in the `h` namespace of the index and is written once,
//! in a single batch, by the owner's first `ready`.

use slash_types::PublicKey;

/// Index namespace holding the header entries.
pub const HEADER_NAMESPACE: &str = "h";
/// Index namespace holding object records.
pub const OBJECT_NAMESPACE: &str = "o";
/// Header key for the content log's public key (raw bytes).
pub const HEADER_CONTENT: &str = "c";
/// Header key for the protocol version string.
pub const HEADER_SEMVER: &str = "v";

/// Decoded header of a drive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriveHeader {
    pub content_key: PublicKey,
    /// Version recorded at bootstrap, if any. Never checked on read.
    pub semver: Option<String>,
}

impl DriveHeader {
    /// Returns `true` if the stored version differs from `expected`.
    pub fn version_differs(&self, expected: &str) -> bool {
        self.semver.as_deref().is_some_and(|v| v != expected)
    }
}
