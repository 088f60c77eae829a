//! §4.5/§4.6 read path: a snapshot-bounded point lookup or range scan over a
//! table's memtables and registered files, merged through [`mvcc::merge`].
//!
//! The secondary index only ever reflects flushed data (it's built at flush
//! time, not at ingest time — see [`crate::flush`]), so a query that names
//! an indexed filter column still falls back to a full memtable scan; only
//! the file side of the read benefits from the narrower candidate set.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use catalog::FileRecord;
use riptide_core::{CancellationToken, EntityId, RecordKey, TableId, TenantId, Version, VersionedRecord};
use sstable::SSTableReader;

use crate::envelope;
use crate::record::{ColumnValue, QueryFilter, QueryRecord, QueryRequest};
use crate::table::TableRuntime;
use crate::EngineInner;

fn table_lower_bound(tenant: &TenantId, table: &TableId) -> RecordKey {
    RecordKey::entity_lower_bound(tenant, table, &EntityId::new(Vec::new()))
}

/// One past the largest possible key for this table: the real separator
/// byte following a table name is always `0x00`, so `0x01` in that position
/// sorts after every real entity's keys.
fn table_upper_bound(tenant: &TenantId, table: &TableId) -> RecordKey {
    let mut bytes = tenant.as_str().as_bytes().to_vec();
    bytes.push(0);
    bytes.extend_from_slice(table.as_str().as_bytes());
    bytes.push(1);
    RecordKey::from_bytes(bytes)
}

/// One past the largest key any version of `entity` can take.
fn entity_upper_bound(tenant: &TenantId, table: &TableId, entity: &EntityId) -> RecordKey {
    let max_key = RecordKey::new(tenant, table, entity, Version(0));
    let mut bytes = max_key.as_bytes().to_vec();
    bytes.push(0);
    RecordKey::from_bytes(bytes)
}

fn matches_filters(filters: &[QueryFilter], columns: &BTreeMap<String, ColumnValue>) -> bool {
    filters.iter().all(|f| columns.get(&f.column) == Some(&f.value))
}

fn apply_projection(mut columns: BTreeMap<String, ColumnValue>, projection: Option<&[String]>) -> BTreeMap<String, ColumnValue> {
    let Some(names) = projection else { return columns };
    columns.retain(|k, _| names.iter().any(|n| n == k));
    columns
}

impl EngineInner {
    pub fn get_record(
        &self,
        tenant: &TenantId,
        table: &TableId,
        entity_id: &EntityId,
        snapshot: Option<Version>,
        cancel: &CancellationToken,
    ) -> riptide_core::EngineResult<Option<QueryRecord>> {
        let request = QueryRequest {
            start_entity: Some(entity_id.clone()),
            end_entity: Some(entity_id.clone()),
            filters: Vec::new(),
            projection: None,
            limit: Some(1),
            snapshot,
        };
        Ok(self.query(tenant, table, &request, cancel)?.into_iter().next())
    }

    pub fn query(
        &self,
        tenant: &TenantId,
        table: &TableId,
        request: &QueryRequest,
        cancel: &CancellationToken,
    ) -> riptide_core::EngineResult<Vec<QueryRecord>> {
        cancel.check()?;
        self.require_running()?;
        let runtime = self.table_runtime(tenant, table)?;
        let snapshot = request.snapshot.unwrap_or_else(|| self.mvcc.snapshot());

        let start = match &request.start_entity {
            Some(e) => RecordKey::entity_lower_bound(tenant, table, e),
            None => table_lower_bound(tenant, table),
        };
        let end = match &request.end_entity {
            Some(e) => entity_upper_bound(tenant, table, e),
            None => table_upper_bound(tenant, table),
        };

        let memtable_results = self.scan_memtables(&runtime, &start, &end);

        cancel.check()?;

        let file_results = self.scan_files(&runtime, tenant, table, &start, &end, request)?;

        let merged = mvcc::merge(memtable_results, file_results, snapshot);

        let mut out = Vec::with_capacity(merged.len());
        for record in merged {
            cancel.check()?;
            let (payload, columns) = envelope::decode(&record.payload)?;
            if !matches_filters(&request.filters, &columns) {
                continue;
            }
            let columns = apply_projection(columns, request.projection.as_deref());
            out.push(QueryRecord {
                entity_id: record.key.entity_id(),
                version: record.version,
                sequence: record.sequence,
                payload,
                columns,
            });
            if let Some(limit) = request.limit {
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    fn scan_memtables(&self, runtime: &Arc<TableRuntime>, start: &RecordKey, end: &RecordKey) -> Vec<VersionedRecord> {
        let mut results = Vec::new();
        for memtable in runtime.memtables_newest_first() {
            results.extend(memtable.scan(start, end));
        }
        results
    }

    fn scan_files(
        &self,
        runtime: &Arc<TableRuntime>,
        tenant: &TenantId,
        table: &TableId,
        start: &RecordKey,
        end: &RecordKey,
        request: &QueryRequest,
    ) -> riptide_core::EngineResult<Vec<VersionedRecord>> {
        let files = self.catalog.files(&runtime.key).map_err(crate::error::from_catalog)?;
        let table_dir = self.table_data_dir(&runtime.key);
        let start_bytes = start.as_bytes();
        let end_bytes = end.as_bytes();

        let overlapping: Vec<&FileRecord> =
            files.iter().filter(|f| f.min_key.as_slice() < end_bytes && start_bytes <= f.max_key.as_slice()).collect();
        if overlapping.is_empty() {
            return Ok(Vec::new());
        }

        let mut open_readers: HashMap<&str, SSTableReader> = HashMap::new();
        for file in &overlapping {
            match SSTableReader::open(table_dir.join(&file.file_id)) {
                Ok(reader) => {
                    open_readers.insert(file.file_id.as_str(), reader);
                }
                Err(e) => return Err(crate::error::from_sstable(e)),
            }
        }

        if let Some(candidate_keys) = self.narrowed_candidates(runtime, tenant, table, request)? {
            let mut results = Vec::new();
            for key_bytes in candidate_keys {
                if key_bytes.as_slice() < start_bytes || key_bytes.as_slice() >= end_bytes {
                    continue;
                }
                for reader in open_readers.values() {
                    if let Some(record) = reader.get(&key_bytes).map_err(crate::error::from_sstable)? {
                        results.push(record);
                    }
                }
            }
            return Ok(results);
        }

        let mut results = Vec::new();
        for reader in open_readers.values() {
            for key_bytes in reader.keys() {
                if key_bytes < start_bytes || key_bytes >= end_bytes {
                    continue;
                }
                if let Some(record) = reader.get(key_bytes).map_err(crate::error::from_sstable)? {
                    results.push(record);
                }
            }
        }
        Ok(results)
    }

    /// If the request's first filter names a column the table maintains a
    /// secondary index for, returns the set of primary-key candidates that
    /// index narrows the file scan to. `None` means "no usable index for
    /// this request" — the caller should fall back to a full file scan.
    fn narrowed_candidates(
        &self,
        runtime: &Arc<TableRuntime>,
        _tenant: &TenantId,
        _table: &TableId,
        request: &QueryRequest,
    ) -> riptide_core::EngineResult<Option<Vec<Vec<u8>>>> {
        let Some(filter) = request.filters.first() else { return Ok(None) };
        let schema = runtime.schema_snapshot();
        let Some(column) = schema.column(&filter.column) else { return Ok(None) };
        if column.secondary_index.is_none() {
            return Ok(None);
        }
        let value_bytes = filter.value.to_scalar().to_index_bytes();
        let candidates =
            self.index.with_secondary(&runtime.key, &filter.column, |idx| idx.map(|i| i.lookup(&value_bytes)).unwrap_or_default());
        let candidates = candidates.map_err(crate::error::from_index)?;
        Ok(Some(candidates))
    }
}
