//! # Memtable
//!
//! An in-memory, sorted, versioned write buffer for the RiptideKV storage
//! engine. The memtable is the first point of contact for every write: it
//! buffers recent inserts, updates, and deletes keyed by [`RecordKey`] before
//! they are flushed to an immutable columnar file.
//!
//! Unlike a single-latest-value buffer, this memtable keeps every live
//! version of an entity that hasn't yet been superseded by compaction —
//! `RecordKey`'s version suffix already sorts a table's entries so that all
//! versions of one entity are contiguous, highest version first. That's what
//! lets [`Memtable::get`] answer a snapshot read with a single forward scan
//! instead of a secondary sort pass.
//!
//! ## Key properties
//! - **Sorted order**: entries are always in ascending `RecordKey` order,
//!   which is also ascending-entity / descending-version order.
//! - **Versioned**: multiple live versions of the same entity coexist until
//!   compaction collapses them.
//! - **Freeze is permanent**: once frozen, a memtable never accepts another
//!   write. Readers already scanning it continue to see a consistent view.
//! - **Deterministic size accounting**: tracks an estimated byte size for
//!   flush-threshold decisions only, never for billing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;

use riptide_core::{EngineError, EngineResult, EntityId, RecordKey, TableId, TenantId, Version, VersionedRecord};

/// An ordered, versioned, in-memory write buffer backed by a `BTreeMap`.
///
/// Concurrent reads and writes are safe: readers take a shared lock and see
/// a consistent `BTreeMap` snapshot for the duration of their call; writers
/// take an exclusive lock only for the mutation itself.
#[derive(Debug)]
pub struct Memtable {
    map: RwLock<BTreeMap<RecordKey, VersionedRecord>>,
    size_bytes: AtomicUsize,
    frozen: AtomicBool,
}

impl Memtable {
    /// Creates a new, empty, writable memtable.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
            size_bytes: AtomicUsize::new(0),
            frozen: AtomicBool::new(false),
        }
    }

    /// Inserts one versioned record.
    ///
    /// Returns [`EngineError::Internal`] if the memtable is already frozen —
    /// a frozen memtable is an immutable snapshot and callers must route
    /// further writes to a newer active memtable instead.
    pub fn put(&self, record: VersionedRecord) -> EngineResult<()> {
        if self.is_frozen() {
            return Err(EngineError::internal("put on a frozen memtable"));
        }

        let size = record.estimated_size();
        let mut map = self.map.write();
        let replaced = map.insert(record.key.clone(), record);
        drop(map);

        self.size_bytes.fetch_add(size, Ordering::Relaxed);
        if let Some(old) = replaced {
            self.size_bytes.fetch_sub(old.estimated_size(), Ordering::Relaxed);
        }
        Ok(())
    }

    /// Returns the visible version of `entity` as of `snapshot`: the first
    /// record (scanning in descending-version order) whose version is
    /// `<= snapshot`. Returns the raw record — including tombstones — so
    /// callers can distinguish "no record at all" from "deleted."
    #[must_use]
    pub fn get(&self, tenant: &TenantId, table: &TableId, entity: &EntityId, snapshot: Version) -> Option<VersionedRecord> {
        let lower = RecordKey::entity_lower_bound(tenant, table, entity);
        let map = self.map.read();
        map.range(&lower..)
            .take_while(|(k, _)| k.same_entity(&lower))
            .find(|(k, _)| k.version() <= snapshot)
            .map(|(_, v)| v.clone())
    }

    /// Returns the latest live version of `entity`, equivalent to
    /// `get(tenant, table, entity, Version(u64::MAX))`.
    #[must_use]
    pub fn get_latest(&self, tenant: &TenantId, table: &TableId, entity: &EntityId) -> Option<VersionedRecord> {
        self.get(tenant, table, entity, Version(u64::MAX))
    }

    /// Returns every record (all versions, including tombstones) whose key
    /// falls in `[start, end)`, in ascending `RecordKey` order. Used by the
    /// flush pipeline and by the MVCC merge step, which applies snapshot
    /// visibility and tombstone suppression on top of this raw stream.
    #[must_use]
    pub fn scan(&self, start: &RecordKey, end: &RecordKey) -> Vec<VersionedRecord> {
        let map = self.map.read();
        map.range(start..end).map(|(_, v)| v.clone()).collect()
    }

    /// Returns every record currently in the memtable, in ascending
    /// `RecordKey` order. Used by flush, which always drains an entire
    /// frozen memtable into one columnar file.
    #[must_use]
    pub fn iter_all(&self) -> Vec<VersionedRecord> {
        let map = self.map.read();
        map.values().cloned().collect()
    }

    /// Marks the memtable permanently read-only. Idempotent: calling this
    /// more than once has no additional effect. Readers already iterating
    /// via [`scan`](Self::scan) or [`iter_all`](Self::iter_all) are
    /// unaffected — they already hold their own copy of the data they read.
    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    /// The deterministic size estimate used for flush-threshold decisions.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes.load(Ordering::Relaxed)
    }

    /// Number of entries, including tombstones and every live version.
    #[must_use]
    pub fn count(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Default for Memtable {
    fn default() -> Self {
        Self::new()
    }
}
