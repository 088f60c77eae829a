//! Maps every collaborator crate's error type onto [`riptide_core::EngineError`].
//!
//! `EngineError` and the collaborator error enums (`CatalogError`,
//! `IndexError`, `CompactionError`, `WalError`, `BlockStoreError`) are all
//! defined outside this crate, so `impl From<X> for EngineError` would
//! violate the orphan rule — these are plain mapping functions instead,
//! called at every seam where the orchestrator crosses into a collaborator.

use riptide_core::EngineError;

pub fn from_wal(e: wal::WalError) -> EngineError {
    match e {
        wal::WalError::Io(io) => EngineError::Io(io),
        wal::WalError::Corrupt(msg) => EngineError::Corruption(msg),
        wal::WalError::CapacityExceeded(msg) => EngineError::CapacityExceeded(msg),
    }
}

pub fn from_catalog(e: catalog::CatalogError) -> EngineError {
    match e {
        catalog::CatalogError::TableNotFound(t) => EngineError::not_found(format!("table {t}")),
        catalog::CatalogError::TableExists(t) => EngineError::conflict(format!("table {t} already exists")),
        catalog::CatalogError::BlockStore(e) => from_blockstore(e),
        catalog::CatalogError::Serde(e) => EngineError::corruption(format!("catalog record corrupt: {e}")),
    }
}

pub fn from_index(e: index::IndexError) -> EngineError {
    match e {
        index::IndexError::BlockStore(e) => from_blockstore(e),
        index::IndexError::Serde(e) => EngineError::corruption(format!("index record corrupt: {e}")),
        index::IndexError::NotLoaded(t) => EngineError::internal(format!("index for {t} not loaded")),
        index::IndexError::Validation(msg) => EngineError::corruption(msg),
    }
}

pub fn from_compaction(e: compaction::CompactionError) -> EngineError {
    match e {
        compaction::CompactionError::Catalog(e) => from_catalog(e),
        compaction::CompactionError::Io(io) => EngineError::Io(io),
        compaction::CompactionError::SSTable(e) => EngineError::internal(format!("sstable error: {e}")),
        compaction::CompactionError::UnknownInput(id) => EngineError::internal(format!("unknown compaction input {id}")),
    }
}

pub fn from_blockstore(e: blockstore::BlockStoreError) -> EngineError {
    match e {
        blockstore::BlockStoreError::Io(io) => EngineError::Io(io),
        blockstore::BlockStoreError::NotFound(p) => EngineError::not_found(format!("block {p}")),
        blockstore::BlockStoreError::Remote(msg) => EngineError::Unavailable(msg),
    }
}

pub fn from_sstable(e: anyhow::Error) -> EngineError {
    EngineError::corruption(e.to_string())
}
