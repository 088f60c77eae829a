//! §4.3 flush pipeline: a sealed memtable becomes one new level-0 columnar
//! file, its keys are registered in the primary index and (for indexed
//! columns) the secondary indexes, the catalog commit that publishes the
//! file also advances the table's checkpoint sequence, and finally the WAL
//! segments covered by that checkpoint are truncated.
//!
//! The writer only emits a file; it never learns where in it a key ended up.
//! Rather than widen `sstable::SSTableWriter` to report offsets mid-stream,
//! this reopens the just-written file as a reader and asks it directly —
//! the same lookup the read path already trusts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use catalog::FileRecord;
use memtable::Memtable;
use tracing::{info, warn};

use crate::columns::secondary_updates;
use crate::envelope;
use crate::table::TableRuntime;
use crate::EngineInner;

fn now_unix_nanos() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

impl EngineInner {
    /// Data files live under `{data_dir}/{tenant}::{table} with "::" replaced
    /// by "_"}/{file_id}` — a flat per-table directory, since the catalog
    /// already tracks membership and level; no further nesting is needed.
    pub(crate) fn table_data_dir(&self, table_key: &str) -> PathBuf {
        self.data_dir.join(table_key.replace("::", "_"))
    }

    pub(crate) fn flush_sealed(&self, runtime: &Arc<TableRuntime>, sealed: &Arc<Memtable>) -> riptide_core::EngineResult<()> {
        let records = sealed.iter_all();
        if records.is_empty() {
            runtime.retire(sealed);
            return Ok(());
        }

        let min_key = records.first().unwrap().key.as_bytes().to_vec();
        let max_key = records.last().unwrap().key.as_bytes().to_vec();
        let min_seq = records.iter().map(|r| r.sequence.0).min().unwrap();
        let max_seq = records.iter().map(|r| r.sequence.0).max().unwrap();
        let row_count = records.len();

        let table_dir = self.table_data_dir(&runtime.key);
        std::fs::create_dir_all(&table_dir).map_err(|e| riptide_core::EngineError::internal(e.to_string()))?;
        let file_id = format!("{:020}-{}.sst", min_seq, uuid_like(max_seq, row_count));
        let path = table_dir.join(&file_id);

        sstable::SSTableWriter::write_from_records(&path, row_count, records.into_iter(), 0)
            .map_err(crate::error::from_sstable)?;

        let size_bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let schema = runtime.schema_snapshot();

        let reader = sstable::SSTableReader::open(&path).map_err(crate::error::from_sstable)?;
        let keys: Vec<Vec<u8>> = reader.keys().map(|k| k.to_vec()).collect();

        for key_bytes in &keys {
            let offset = reader.offset_of(key_bytes).unwrap_or(0);
            self.index
                .with_primary_mut(&runtime.key, |primary| primary.insert(key_bytes.clone(), file_id.clone(), offset))
                .map_err(crate::error::from_index)?;

            let record = reader.get(key_bytes).map_err(crate::error::from_sstable)?;
            let Some(record) = record else { continue };
            if record.tombstone {
                continue;
            }
            let (_, decoded_columns) = match envelope::decode(&record.payload) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, table = %runtime.key, "skipping secondary index update for an unreadable envelope");
                    continue;
                }
            };
            for update in secondary_updates(&schema, &decoded_columns) {
                self.index
                    .with_secondary_mut(&runtime.key, &update.column, update.kind, |index| {
                        index.insert(update.value_bytes.clone(), key_bytes.clone())
                    })
                    .map_err(crate::error::from_index)?;
            }
        }
        self.index.persist(&runtime.key).map_err(crate::error::from_index)?;

        let file_record = FileRecord {
            file_id,
            min_key,
            max_key,
            row_count,
            min_seq,
            max_seq,
            level: 0,
            size_bytes,
            created_at_unix_nanos: now_unix_nanos(),
            last_access_unix_nanos: now_unix_nanos(),
        };

        self.catalog
            .commit(&runtime.key, vec![file_record], &[], Some(max_seq))
            .map_err(crate::error::from_catalog)?;
        runtime.checkpoint_sequence.store(max_seq, std::sync::atomic::Ordering::SeqCst);

        {
            let mut wal = self.wal.lock().unwrap();
            wal.create_checkpoint(max_seq, now_unix_nanos()).map_err(crate::error::from_wal)?;
        }
        runtime.retire(sealed);
        self.maybe_truncate_wal()?;

        info!(table = %runtime.key, rows = row_count, max_seq, "flushed memtable to a new level-0 file");
        Ok(())
    }

    fn maybe_truncate_wal(&self) -> riptide_core::EngineResult<()> {
        let Some(min_checkpoint) = self.catalog.min_checkpoint_sequence() else { return Ok(()) };
        let mut wal = self.wal.lock().unwrap();
        wal.truncate(min_checkpoint).map_err(crate::error::from_wal)
    }
}

/// A short, deterministic disambiguator appended to a flush's file name so
/// two flushes that happen to share a `min_seq` (impossible under normal
/// operation, since sequences are engine-wide monotonic, but not ruled out
/// for a manually constructed test fixture) don't collide on disk.
fn uuid_like(max_seq: u64, row_count: usize) -> String {
    format!("{:016x}{:08x}", max_seq, row_count as u32)
}
