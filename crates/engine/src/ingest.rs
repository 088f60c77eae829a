//! §4.1/§4.2 write path: validate columns against the table's schema,
//! allocate a version and a sequence number per record, append to the WAL,
//! then apply to the table's active memtable — in that order, since a
//! record is only durable once its WAL append returns.

use std::time::{SystemTime, UNIX_EPOCH};

use riptide_core::{
    CancellationToken, EngineError, EngineResult, Operation, RecordKey, SequenceNumber, TableId, TenantId, Version,
    VersionedRecord,
};

use crate::columns::validate_columns;
use crate::envelope;
use crate::record::Record;
use crate::wal_codec;
use crate::EngineInner;

fn now_unix_nanos() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

/// A record with its version/key already assigned and its on-disk value
/// already envelope-encoded, waiting on a sequence number and a WAL append.
struct Prepared {
    key: RecordKey,
    operation: Operation,
    /// The envelope-encoded value (empty for a delete) — what lands in the
    /// memtable's `VersionedRecord::payload`.
    value: Vec<u8>,
    tombstone: bool,
}

impl EngineInner {
    pub fn ingest_record(
        &self,
        tenant: &TenantId,
        table: &TableId,
        record: Record,
        cancel: &CancellationToken,
    ) -> EngineResult<(SequenceNumber, Version)> {
        let (first, _, versions) = self.ingest_many(tenant, table, vec![record], cancel)?;
        Ok((first, versions[0]))
    }

    pub fn ingest_batch(
        &self,
        tenant: &TenantId,
        table: &TableId,
        records: Vec<Record>,
        cancel: &CancellationToken,
    ) -> EngineResult<(SequenceNumber, SequenceNumber)> {
        if records.is_empty() {
            return Err(EngineError::invalid_input("ingest_batch requires at least one record"));
        }
        let (first, last, _) = self.ingest_many(tenant, table, records, cancel)?;
        Ok((first, last))
    }

    fn ingest_many(
        &self,
        tenant: &TenantId,
        table: &TableId,
        records: Vec<Record>,
        cancel: &CancellationToken,
    ) -> EngineResult<(SequenceNumber, SequenceNumber, Vec<Version>)> {
        cancel.check()?;
        self.require_running()?;
        let runtime = self.table_runtime(tenant, table)?;
        self.wait_for_backpressure(&runtime, cancel)?;

        let schema = runtime.schema_snapshot();
        let mut prepared = Vec::with_capacity(records.len());
        let mut versions = Vec::with_capacity(records.len());

        for record in records {
            if !record.delete {
                validate_columns(&schema, &record.columns)?;
            }
            let version = self.mvcc.new_version();
            versions.push(version);
            let key = RecordKey::new(tenant, table, &record.entity_id, version);
            let value = if record.delete { Vec::new() } else { envelope::encode(&record.payload, &record.columns) };
            prepared.push(Prepared {
                key,
                operation: if record.delete { Operation::Delete } else { Operation::Insert },
                value,
                tombstone: record.delete,
            });
        }

        cancel.check()?;

        let timestamp = now_unix_nanos();
        let sequences: Vec<SequenceNumber> = prepared.iter().map(|_| self.seq.allocate()).collect();
        let wal_payloads: Vec<Vec<u8>> = prepared.iter().map(|p| wal_codec::encode(&p.key, &p.value)).collect();
        let entries: Vec<(u64, u64, Operation, &[u8])> = sequences
            .iter()
            .zip(prepared.iter())
            .zip(wal_payloads.iter())
            .map(|((seq, p), wal_payload)| (seq.0, timestamp, p.operation, wal_payload.as_slice()))
            .collect();

        {
            let mut wal = self.wal.lock().unwrap();
            wal.append_batch(&entries).map_err(crate::error::from_wal)?;
        }

        cancel.check()?;

        let active = runtime.active_memtable();
        for (p, seq) in prepared.into_iter().zip(sequences.iter()) {
            let version = p.key.version();
            active.put(VersionedRecord {
                key: p.key,
                version,
                sequence: *seq,
                timestamp_unix_nanos: timestamp,
                payload: p.value,
                tombstone: p.tombstone,
            })?;
        }

        self.maybe_seal(&runtime)?;

        let first = *sequences.first().unwrap();
        let last = *sequences.last().unwrap();
        Ok((first, last, versions))
    }
}
