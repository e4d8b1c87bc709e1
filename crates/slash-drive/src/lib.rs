//! A replicated, content-addressed drive.
//!
//! A [`Drive`] pairs two append-only logs: an ordered index mapping keys to
//! object records, and a blob log holding the bytes. The owner writes both;
//! replicas open the drive by public key and find the blob log through the
//! header the owner wrote on first [`Drive::ready`].
//!
//! ```no_run
//! # async fn demo() -> slash_drive::DriveResult<()> {
//! use slash_core::Corestore;
//! use slash_crypto::KeyPair;
//! use slash_drive::{Drive, DriveOptions};
//!
//! let store = Corestore::new();
//! let drive = Drive::open(&store, DriveOptions::owner(KeyPair::generate()))?;
//! drive.put("/foo", b"hello world", None).await?;
//!
//! let replica = Drive::open(&store, DriveOptions::replica(drive.key()))?;
//! replica.update().await?;
//! assert_eq!(replica.get("/foo").await?.as_deref(), Some(&b"hello world"[..]));
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`drive`] — [`Drive`]: bootstrap, `put`/`get`/`list`, replication hooks
//! - [`header`] — Header and object namespaces, [`DriveHeader`]
//! - [`record`] — Object records, [`Metadata`], [`ListEntry`]
//! - [`options`] — [`DriveOptions`]
//! - [`config`] — [`DriveConfig`] and [`PROTOCOL_VERSION`]
//! - [`error`] — [`DriveError`]

pub mod config;
pub mod drive;
pub mod error;
pub mod header;
pub mod options;
pub mod record;
mod resolver;

pub use config::{DriveConfig, PROTOCOL_VERSION};
pub use drive::Drive;
pub use error::{DriveError, DriveResult};
pub use header::DriveHeader;
pub use options::DriveOptions;
pub use record::{ListEntry, Metadata};
