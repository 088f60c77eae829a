//! # catalog
//!
//! The durable key-value store of table metadata (§6.5): per-table schema,
//! the file list, the checkpoint sequence, and a handle index updates ride
//! along with. Grounded on the teacher's `engine/src/manifest.rs` — a small
//! text file recording which SSTable belongs to which level, rewritten
//! atomically on every flush and compaction — generalized from a single
//! flat `L0:filename` / `L1:filename` list into one structured record per
//! table, persisted through [`blockstore::BlockStore`] instead of a bare
//! `std::fs::rename`.
//!
//! Catalog writes are durable *before* any dependent file is exposed or
//! retired (§4.3 step 4, §4.6's atomic swap): [`Catalog::commit`] is the one
//! call site that registers new files and retires old ones, and it always
//! writes the whole updated record in one `BlockStore::put` before
//! returning.

mod entry;
mod error;
mod file_record;
mod schema;
mod store;

pub use entry::CatalogEntry;
pub use error::CatalogError;
pub use file_record::FileRecord;
pub use schema::{ColumnSchema, ScalarKind, ScalarValue, TableSchema};
pub use store::Catalog;

pub type CatalogResult<T> = Result<T, CatalogError>;
