//! Per-`(tenant, table)` routing state: the active memtable new writes land
//! in, the sealed memtables still waiting on the flush worker, and the
//! schema cached from the catalog.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use catalog::TableSchema;
use memtable::Memtable;
use riptide_core::{TableId, TenantId};

/// The catalog/index/block-store key a `(tenant, table)` pair is addressed
/// by. Both `catalog::Catalog` and `index::IndexStore` key their entries by
/// a bare `&str` with no tenant segmentation of their own — qualifying the
/// name here is what keeps two tenants' same-named tables from colliding in
/// either store.
#[must_use]
pub fn qualify(tenant: &TenantId, table: &TableId) -> String {
    format!("{}::{}", tenant.as_str(), table.as_str())
}

pub struct TableRuntime {
    pub tenant: TenantId,
    pub table: TableId,
    pub key: String,
    pub schema: RwLock<TableSchema>,
    active: RwLock<Arc<Memtable>>,
    active_created_at: RwLock<Instant>,
    immutable: RwLock<VecDeque<Arc<Memtable>>>,
    pub checkpoint_sequence: AtomicU64,
}

impl TableRuntime {
    #[must_use]
    pub fn new(tenant: TenantId, table: TableId, schema: TableSchema) -> Self {
        let key = qualify(&tenant, &table);
        Self {
            tenant,
            table,
            key,
            schema: RwLock::new(schema),
            active: RwLock::new(Arc::new(Memtable::new())),
            active_created_at: RwLock::new(Instant::now()),
            immutable: RwLock::new(VecDeque::new()),
            checkpoint_sequence: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn schema_snapshot(&self) -> TableSchema {
        self.schema.read().unwrap().clone()
    }

    #[must_use]
    pub fn active_memtable(&self) -> Arc<Memtable> {
        self.active.read().unwrap().clone()
    }

    #[must_use]
    pub fn active_age(&self) -> std::time::Duration {
        self.active_created_at.read().unwrap().elapsed()
    }

    /// Number of sealed memtables still waiting on the flush worker — the
    /// `memtable.max_immutable` backpressure threshold is checked against
    /// this, not against the active memtable's own size.
    #[must_use]
    pub fn immutable_count(&self) -> usize {
        self.immutable.read().unwrap().len()
    }

    /// Seals the active memtable and queues it for the flush worker if it
    /// holds anything, installing a fresh empty memtable in its place.
    /// Returns the sealed memtable, or `None` if there was nothing to flush.
    pub fn seal_active(&self) -> Option<Arc<Memtable>> {
        let mut active = self.active.write().unwrap();
        if active.is_empty() {
            return None;
        }
        active.freeze();
        let sealed = active.clone();
        *active = Arc::new(Memtable::new());
        drop(active);
        *self.active_created_at.write().unwrap() = Instant::now();
        self.immutable.write().unwrap().push_back(sealed.clone());
        Some(sealed)
    }

    /// Drops a flushed memtable from the immutable queue once its file has
    /// been durably registered in the catalog.
    pub fn retire(&self, flushed: &Arc<Memtable>) {
        let mut queue = self.immutable.write().unwrap();
        if let Some(pos) = queue.iter().position(|m| Arc::ptr_eq(m, flushed)) {
            queue.remove(pos);
        }
    }

    /// Every memtable currently live for this table — the active one first,
    /// then sealed ones newest to oldest. Callers rely on this order: the
    /// first hit for an entity across this sequence is always the visible
    /// one, since sequence numbers only increase over the lifetime of a
    /// table's memtables.
    #[must_use]
    pub fn memtables_newest_first(&self) -> Vec<Arc<Memtable>> {
        let mut all = vec![self.active_memtable()];
        all.extend(self.immutable.read().unwrap().iter().rev().cloned());
        all
    }
}
