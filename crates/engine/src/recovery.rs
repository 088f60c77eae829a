//! Startup recovery (§4.7): replays the WAL into fresh per-table memtables
//! and resumes the sequence/version counters past anything already durable,
//! then sweeps any file left behind by a crash between a flush's file write
//! and its catalog commit.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use catalog::Catalog;
use riptide_core::{Operation, SequenceNumber, TableId, TenantId, VersionedRecord};
use tracing::warn;
use wal::{WalEntry, WalReader};

use crate::table::TableRuntime;
use crate::wal_codec;

pub struct RecoveredState {
    pub tables: HashMap<String, Arc<TableRuntime>>,
    pub next_sequence: u64,
    pub next_version: u64,
}

/// Replays every WAL segment into the table runtimes pre-created from the
/// catalog's already-registered tables, then bounds the resumed
/// sequence/version counters by whatever the catalog's own files already
/// recorded — covers the case where the WAL was truncated past a flush
/// whose records no longer appear in replay at all.
pub fn recover(wal_dir: &Path, data_dir: &Path, catalog: &Catalog) -> riptide_core::EngineResult<RecoveredState> {
    let mut tables: HashMap<String, Arc<TableRuntime>> = HashMap::new();
    let mut max_version = 0u64;

    for table_key in catalog.table_ids() {
        let schema = catalog.schema(&table_key).map_err(crate::error::from_catalog)?;
        let tenant = TenantId::new(schema.tenant.clone());
        let table = TableId::new(schema.table.clone());
        tables.insert(table_key.clone(), Arc::new(TableRuntime::new(tenant, table, schema)));
    }

    let reader = WalReader::new(wal_dir);
    let mut replay_err = None;
    let next_seq_from_wal = reader
        .replay(|entry: WalEntry| {
            if replay_err.is_some() || entry.operation == Operation::Checkpoint {
                return;
            }
            let (key, value) = match wal_codec::decode(&entry.payload) {
                Ok(v) => v,
                Err(e) => {
                    replay_err = Some(e);
                    return;
                }
            };
            let table_key = format!("{}::{}", key.tenant_str(), key.table_str());
            let Some(runtime) = tables.get(&table_key) else {
                warn!(table = %table_key, "wal entry for a table not present in the catalog; skipping");
                return;
            };
            max_version = max_version.max(key.version().0);
            let record = VersionedRecord {
                version: key.version(),
                key,
                sequence: SequenceNumber(entry.sequence),
                timestamp_unix_nanos: entry.timestamp_unix_nanos,
                payload: value,
                tombstone: entry.operation == Operation::Delete,
            };
            if let Err(e) = runtime.active_memtable().put(record) {
                warn!(error = %e, table = %table_key, "failed to replay a wal entry into its memtable");
            }
        })
        .map_err(crate::error::from_wal)?;

    if let Some(e) = replay_err {
        return Err(e);
    }

    let mut max_seq_seen = next_seq_from_wal.saturating_sub(1);
    for table_key in tables.keys() {
        let Ok(files) = catalog.files(table_key) else { continue };
        let table_dir = data_dir.join(table_key.replace("::", "_"));
        for file in files {
            max_seq_seen = max_seq_seen.max(file.max_seq);
            // `FileRecord` doesn't carry a max-version field of its own (it
            // wasn't needed until recovery had to bound a version counter
            // that might have been truncated out of the WAL entirely), so
            // fall back to the file's own footer.
            if let Ok(reader) = sstable::SSTableReader::open(table_dir.join(&file.file_id)) {
                if let Some((_, max_v)) = reader.stats().version_range {
                    max_version = max_version.max(max_v);
                }
            }
        }
    }

    Ok(RecoveredState { tables, next_sequence: max_seq_seen + 1, next_version: max_version + 1 })
}

/// Deletes every file under a table's data prefix that the catalog does not
/// reference (§4.3: a file written between a flush's file-write step and
/// its catalog commit, orphaned by a crash in between). Safe to run
/// unconditionally at startup, before the engine enters `running` and
/// starts serving readers that could otherwise race a deletion.
pub fn gc_unreferenced(data_dir: &Path, catalog: &Catalog, table_key: &str) -> riptide_core::EngineResult<()> {
    let prefix = table_key.replace("::", "_");
    let orphans = catalog.unreferenced_files(table_key, &prefix).map_err(crate::error::from_catalog)?;
    for relative_path in orphans {
        let _ = std::fs::remove_file(data_dir.join(relative_path));
    }
    Ok(())
}
