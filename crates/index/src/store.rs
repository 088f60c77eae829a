use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use blockstore::BlockStore;

use crate::primary::PrimaryIndex;
use crate::secondary::SecondaryIndex;
use crate::IndexResult;

#[derive(Default, serde::Serialize, serde::Deserialize)]
struct TableIndexSnapshot {
    primary: PrimaryIndex,
    secondary: HashMap<String, SecondaryIndex>,
}

/// Owns every table's primary and secondary indexes, lazily loaded from a
/// [`BlockStore`] on first access and cached in memory thereafter.
///
/// Grounded on the teacher's `SSTableReader::open`-loads-index-wholesale
/// pattern, generalized from "one file's index, reloaded every open" to
/// "one table's cross-file index, loaded once and cached."
pub struct IndexStore {
    block_store: Arc<dyn BlockStore>,
    cache: RwLock<HashMap<String, TableIndexSnapshot>>,
}

impl IndexStore {
    #[must_use]
    pub fn new(block_store: Arc<dyn BlockStore>) -> Self {
        Self { block_store, cache: RwLock::new(HashMap::new()) }
    }

    fn path_for(table: &str) -> String {
        format!("index/{table}.idx")
    }

    fn ensure_loaded(&self, table: &str) -> IndexResult<()> {
        if self.cache.read().unwrap().contains_key(table) {
            return Ok(());
        }
        let snapshot = match self.block_store.get(&Self::path_for(table)) {
            Ok(bytes) => bincode::deserialize(&bytes)?,
            Err(blockstore::BlockStoreError::NotFound(_)) => TableIndexSnapshot::default(),
            Err(e) => return Err(e.into()),
        };
        self.cache.write().unwrap().insert(table.to_string(), snapshot);
        Ok(())
    }

    /// Persists the in-memory state for `table` back through the block
    /// store. Callers (the catalog crate) drive this under the same atomic
    /// commit step that registers a flush or compaction's output files.
    pub fn persist(&self, table: &str) -> IndexResult<()> {
        let cache = self.cache.read().unwrap();
        let Some(snapshot) = cache.get(table) else { return Ok(()) };
        let bytes = bincode::serialize(snapshot)?;
        self.block_store.put(&Self::path_for(table), &bytes)?;
        Ok(())
    }

    pub fn with_primary_mut<R>(&self, table: &str, f: impl FnOnce(&mut PrimaryIndex) -> R) -> IndexResult<R> {
        self.ensure_loaded(table)?;
        let mut cache = self.cache.write().unwrap();
        let snapshot = cache.entry(table.to_string()).or_default();
        Ok(f(&mut snapshot.primary))
    }

    pub fn with_primary<R>(&self, table: &str, f: impl FnOnce(&PrimaryIndex) -> R) -> IndexResult<R> {
        self.ensure_loaded(table)?;
        let cache = self.cache.read().unwrap();
        Ok(f(&cache[table].primary))
    }

    pub fn with_secondary_mut<R>(
        &self,
        table: &str,
        column: &str,
        kind: crate::SecondaryIndexKind,
        f: impl FnOnce(&mut SecondaryIndex) -> R,
    ) -> IndexResult<R> {
        self.ensure_loaded(table)?;
        let mut cache = self.cache.write().unwrap();
        let snapshot = cache.entry(table.to_string()).or_default();
        let index = snapshot.secondary.entry(column.to_string()).or_insert_with(|| SecondaryIndex::new(kind));
        Ok(f(index))
    }

    pub fn with_secondary<R>(&self, table: &str, column: &str, f: impl FnOnce(Option<&SecondaryIndex>) -> R) -> IndexResult<R> {
        self.ensure_loaded(table)?;
        let cache = self.cache.read().unwrap();
        Ok(f(cache[table].secondary.get(column)))
    }

    /// Replaces a table's entire index state (primary and secondary) in one
    /// shot — used by `rebuild_index`'s atomic swap.
    pub fn replace(&self, table: &str, primary: PrimaryIndex, secondary: HashMap<String, SecondaryIndex>) -> IndexResult<()> {
        self.cache.write().unwrap().insert(table.to_string(), TableIndexSnapshot { primary, secondary });
        self.persist(table)
    }

    pub fn drop_table(&self, table: &str) -> IndexResult<()> {
        self.cache.write().unwrap().remove(table);
        self.block_store.delete(&Self::path_for(table))?;
        Ok(())
    }
}
