//! # mvcc
//!
//! The read-path merge step (§4.5). Grounded on the teacher's
//! `engine/src/read.rs` `merge_entry` closure — which picked the entry
//! with the higher sequence number whenever the memtable and an SSTable
//! disagreed about a key during `scan` — generalized from "highest
//! sequence wins" (the teacher had only one live value per key) to
//! "highest version `<=` snapshot wins, tiebreak by sequence" now that
//! multiple live versions of an entity can coexist.

mod resolver;

pub use resolver::MvccResolver;

use riptide_core::VersionedRecord;

/// Merges a memtable's raw scan results and a file's raw scan results
/// (each already in ascending `RecordKey` order, i.e. ascending entity /
/// descending version) into the set of records visible at `snapshot`.
///
/// For each entity, the returned result is the first record (scanning in
/// descending-version order across *both* inputs combined) whose version
/// is `<= snapshot`. If that record is a tombstone, the entity is omitted
/// from the result entirely — a delete shadows every older version just as
/// effectively as it shadows a live read. Two records that share the same
/// `(entity, version)` — only possible if a retried ingest landed in both
/// the memtable and a file — are resolved by keeping the one with the
/// higher `sequence` (Invariant 1 guarantees sequences are never equal).
#[must_use]
pub fn merge(
    memtable_results: Vec<VersionedRecord>,
    file_results: Vec<VersionedRecord>,
    snapshot: riptide_core::Version,
) -> Vec<VersionedRecord> {
    let mut combined: Vec<VersionedRecord> = Vec::with_capacity(memtable_results.len() + file_results.len());
    combined.extend(memtable_results);
    combined.extend(file_results);
    combined.sort_by(|a, b| a.key.cmp(&b.key));

    // Collapse exact key duplicates (same entity, same version) down to the
    // single highest-sequence record before per-entity resolution.
    let mut deduped: Vec<VersionedRecord> = Vec::with_capacity(combined.len());
    for record in combined {
        match deduped.last_mut() {
            Some(prev) if prev.key == record.key => {
                if record.sequence > prev.sequence {
                    *prev = record;
                }
            }
            _ => deduped.push(record),
        }
    }

    let mut visible = Vec::new();
    let mut i = 0;
    while i < deduped.len() {
        let entity_start = i;
        while i < deduped.len() && deduped[i].key.same_entity(&deduped[entity_start].key) {
            i += 1;
        }
        let entity_group = &deduped[entity_start..i];
        if let Some(record) = entity_group.iter().find(|r| r.version <= snapshot) {
            if !record.is_tombstone() {
                visible.push(record.clone());
            }
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use riptide_core::{EntityId, Operation, RecordKey, SequenceNumber, TableId, TenantId, Version};

    fn record(entity: &str, version: u64, sequence: u64, tombstone: bool, payload: &str) -> VersionedRecord {
        let tenant = TenantId::new("t1");
        let table = TableId::new("orders");
        let key = RecordKey::new(&tenant, &table, &EntityId::from(entity), Version(version));
        VersionedRecord {
            key,
            version: Version(version),
            sequence: SequenceNumber(sequence),
            timestamp_unix_nanos: 0,
            payload: payload.as_bytes().to_vec(),
            tombstone,
        }
    }
    #[allow(dead_code)]
    fn op_marker() -> Operation {
        Operation::Insert
    }

    #[test]
    fn picks_highest_version_within_snapshot() {
        let mem = vec![record("k1", 3, 3, false, "v3")];
        let files = vec![record("k1", 1, 1, false, "v1"), record("k1", 2, 2, false, "v2")];
        let result = merge(mem, files, Version(2));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].payload, b"v2");
    }

    #[test]
    fn tombstone_suppresses_entity() {
        let mem = vec![record("k1", 2, 2, true, "")];
        let files = vec![record("k1", 1, 1, false, "v1")];
        let result = merge(mem, files, Version(5));
        assert!(result.is_empty());
    }

    #[test]
    fn tie_breaks_on_sequence() {
        let mem = vec![record("k1", 1, 5, false, "from-mem")];
        let files = vec![record("k1", 1, 2, false, "from-file")];
        let result = merge(mem, files, Version(1));
        assert_eq!(result[0].payload, b"from-mem");
    }

    #[test]
    fn version_above_snapshot_is_invisible() {
        let mem = vec![record("k1", 10, 10, false, "too-new")];
        let result = merge(mem, Vec::new(), Version(1));
        assert!(result.is_empty());
    }
}
