//! Ordered key-value index over an append-only log.
//!
//! A [`Bee`] stores one mutation per log block behind an index header in
//! block 0. Readers fold the committed blocks into an ordered map, so any
//! session on the same log (owner or replica) sees the same entries once
//! the blocks have arrived.
//!
//! # Modules
//!
//! - [`bee`] — The [`Bee`] handle: `get`/`put`/`del`, namespaced views via
//!   [`Bee::sub`], and [`RangeOptions`] scans
//! - [`batch`] — [`Batch`], mutations committed in a single append
//! - [`node`] — Block encoding and the [`Node`] read type
//! - [`error`] — Error types for index operations

pub mod batch;
pub mod bee;
pub mod error;
pub mod node;

pub use batch::Batch;
pub use bee::{Bee, RangeOptions, SUB_SEPARATOR};
pub use error::{BeeError, BeeResult};
pub use node::{Header, Node, PROTOCOL};
