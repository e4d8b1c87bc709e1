//! Header reads and replica resolution.
//!
//! A replica learns its content log from the index header. Resolution
//! refreshes the index, checks the header batch has arrived, decodes the
//! content key, and opens the content log with the drive's encryption key.

use bytes::Bytes;
use slash_bee::{Bee, BeeError};
use slash_blobs::Blobs;
use slash_core::{CoreError, CoreOptions};
use slash_types::PublicKey;
use tracing::{debug, info, warn};

use crate::drive::DriveInner;
use crate::error::{DriveError, DriveResult};
use crate::header::{DriveHeader, HEADER_CONTENT, HEADER_SEMVER};

/// Minimum index length holding a header: the index root plus the header batch.
const RESOLVED_LENGTH: u64 = 2;

/// Discover and open the content log of a drive that has none attached.
pub(crate) async fn resolve(inner: &DriveInner) -> DriveResult<Blobs> {
    let index = inner.db.core();
    index.update().await?;

    let length = index.len();
    if length < RESOLVED_LENGTH {
        debug!(drive = %index.key().short_hex(), length, "index too short to resolve");
        return Err(DriveError::UnresolvedDrive { length });
    }

    let header = read_header(&inner.db, &inner.headers)
        .await?
        .ok_or(DriveError::MissingContentKey)?;
    warn_on_version(&header, &inner.config.protocol_version);

    let core = inner.store.get(
        CoreOptions::from_key(header.content_key).encryption_key(index.encryption_key().cloned()),
    )?;
    let blobs = Blobs::with_config(core, inner.config.blobs())?;
    blobs.ready().await?;

    info!(
        drive = %index.key().short_hex(),
        content = %header.content_key.short_hex(),
        "content log attached"
    );
    Ok(blobs)
}

/// Read the header entries. `None` if the content key is absent or empty.
pub(crate) async fn read_header(db: &Bee, headers: &Bee) -> DriveResult<Option<DriveHeader>> {
    let Some(content) = header_entry(db, headers, HEADER_CONTENT).await? else {
        return Ok(None);
    };
    if content.is_empty() {
        return Ok(None);
    }
    let content_key = match PublicKey::try_from_slice(&content) {
        Ok(key) => key,
        Err(e) => return Err(corrupt(db, e).await),
    };
    let semver = header_entry(db, headers, HEADER_SEMVER)
        .await?
        .map(|v| String::from_utf8_lossy(&v).into_owned());

    Ok(Some(DriveHeader {
        content_key,
        semver,
    }))
}

pub(crate) fn warn_on_version(header: &DriveHeader, expected: &str) {
    if header.version_differs(expected) {
        warn!(
            stored = header.semver.as_deref().unwrap_or_default(),
            expected,
            "drive header version differs"
        );
    }
}

async fn header_entry(db: &Bee, headers: &Bee, key: &str) -> DriveResult<Option<Bytes>> {
    match headers.get(key).await {
        Ok(node) => Ok(node.map(|n| n.value)),
        Err(e @ (BeeError::Decode { .. } | BeeError::Core(CoreError::Cipher(_)))) => {
            Err(corrupt(db, e).await)
        }
        Err(e) => Err(e.into()),
    }
}

async fn corrupt(db: &Bee, reason: impl std::fmt::Display) -> DriveError {
    let header_block = db.core().get_raw(1).await.ok().map(|block| block.to_vec());
    debug!(
        drive = %db.core().key().short_hex(),
        header_block = ?header_block,
        "undecodable drive header"
    );
    DriveError::CorruptOrEncryptedDrive {
        reason: reason.to_string(),
        header_block,
    }
}

#[cfg(test)]
mod tests {
    use slash_core::Corestore;
    use slash_crypto::KeyPair;

    use super::*;
    use crate::{Drive, DriveOptions};

    /// An index log owned by `key_pair`, opened where a drive would open it.
    fn raw_index(store: &Corestore, key_pair: &KeyPair) -> Bee {
        let core = store
            .namespace(key_pair.public_key().as_bytes())
            .get(CoreOptions::from_key_pair(key_pair.clone()))
            .unwrap();
        Bee::new(core)
    }

    #[tokio::test]
    async fn index_with_one_block_is_unresolved() {
        let store = Corestore::new();
        let key_pair = KeyPair::generate();
        raw_index(&store, &key_pair).ready().await.unwrap();

        let replica = Drive::open(&store, DriveOptions::replica(key_pair.public_key())).unwrap();
        let err = replica.update().await.unwrap_err();
        assert!(matches!(err, DriveError::UnresolvedDrive { length: 1 }));
    }

    #[tokio::test]
    async fn header_without_content_key() {
        let store = Corestore::new();
        let key_pair = KeyPair::generate();
        raw_index(&store, &key_pair)
            .sub("h")
            .put(HEADER_SEMVER, "1.0.0")
            .await
            .unwrap();

        let replica = Drive::open(&store, DriveOptions::replica(key_pair.public_key())).unwrap();
        assert!(matches!(
            replica.get("/foo").await,
            Err(DriveError::MissingContentKey)
        ));
    }

    #[tokio::test]
    async fn empty_content_key_is_missing() {
        let store = Corestore::new();
        let key_pair = KeyPair::generate();
        let index = raw_index(&store, &key_pair);
        let mut batch = index.sub("h").batch();
        batch.put(HEADER_CONTENT, b"").put(HEADER_SEMVER, "1.0.0");
        batch.flush().await.unwrap();

        let replica = Drive::open(&store, DriveOptions::replica(key_pair.public_key())).unwrap();
        assert!(matches!(
            replica.list("/").await,
            Err(DriveError::MissingContentKey)
        ));
    }

    #[tokio::test]
    async fn short_content_key_is_corrupt() {
        let store = Corestore::new();
        let key_pair = KeyPair::generate();
        let index = raw_index(&store, &key_pair);
        index.sub("h").put(HEADER_CONTENT, b"short").await.unwrap();

        let replica = Drive::open(&store, DriveOptions::replica(key_pair.public_key())).unwrap();
        match replica.update().await {
            Err(DriveError::CorruptOrEncryptedDrive { header_block, .. }) => {
                assert!(header_block.is_some());
            }
            other => panic!("expected corrupt header, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_index_is_corrupt() {
        let store = Corestore::new();
        let key_pair = KeyPair::generate();
        let core = store
            .namespace(key_pair.public_key().as_bytes())
            .get(CoreOptions::from_key_pair(key_pair.clone()))
            .unwrap();
        core.append(&[b"not an index".to_vec(), b"raw header".to_vec()])
            .await
            .unwrap();

        let replica = Drive::open(&store, DriveOptions::replica(key_pair.public_key())).unwrap();
        match replica.update().await {
            Err(DriveError::CorruptOrEncryptedDrive { header_block, .. }) => {
                assert_eq!(header_block.as_deref(), Some(b"raw header".as_slice()));
            }
            other => panic!("expected corrupt header, got {other:?}"),
        }
    }
}
