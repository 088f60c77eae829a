//! # index
//!
//! Per-table primary and secondary index stores (§4.4). No teacher file
//! persists an index separately — the teacher's `SSTableReader::open` loads
//! a file's own index wholesale, and compaction carries no cross-file view
//! at all. This crate adds the persisted, cross-file mapping the spec
//! requires: primary `RecordKey -> (file_id, row_offset)` locators per
//! table, and secondary `column value -> {primary keys}` locators per
//! `(table, column)`.
//!
//! Indexes are lazily loaded per table through a [`blockstore::BlockStore`]
//! and cached in memory; persistence happens after flush and after
//! compaction, under the same atomic commit step as file registration
//! (the catalog crate drives that commit — this crate only knows how to
//! serialize and deserialize its own state).

mod error;
mod primary;
mod rebuild;
mod secondary;
mod store;

pub use error::IndexError;
pub use primary::{Locator, PrimaryIndex};
pub use secondary::{SecondaryIndex, SecondaryIndexKind};
pub use store::IndexStore;
pub use rebuild::{rebuild_index, validate_index, RebuildSource, ValidationReport};

pub type IndexResult<T> = Result<T, IndexError>;
