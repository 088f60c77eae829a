use catalog::FileRecord;
use riptide_core::VersionedRecord;
use sstable::{MergeIterator, SSTableReader};

/// The entity-identifying prefix of a composite `RecordKey`'s encoded bytes
/// (everything but the trailing 8-byte version descriptor). Two keys with
/// the same prefix address different versions of the same entity.
fn entity_prefix(key: &[u8]) -> &[u8] {
    let len = key.len();
    if len >= 8 {
        &key[..len - 8]
    } else {
        key
    }
}

/// True if no file outside the current compaction's inputs — tracked here
/// as `other_files` — could hold an older version of `key`'s entity at a
/// deeper level. Only then is it safe to drop a tombstone for good: a
/// shallower level dropping it while a deeper level still holds *any*
/// version of the entity would resurrect that value on the next compaction
/// pass. Compared at the entity level (ignoring the version suffix), since
/// a file's `min_key`/`max_key` are exact versioned keys and an exact-key
/// comparison would miss a deeper file holding a different version of the
/// same entity.
fn is_deepest_for_key(key: &[u8], output_level: u32, other_files: &[FileRecord]) -> bool {
    let key_entity = entity_prefix(key);
    !other_files.iter().any(|f| {
        f.level > output_level
            && key_entity >= entity_prefix(&f.min_key)
            && key_entity <= entity_prefix(&f.max_key)
    })
}

/// The result of merging a compaction run's input files: the surviving
/// records in ascending key order, plus how many tombstones were collected
/// for good versus carried forward because a deeper level might still need
/// them to shadow older data.
pub struct MergedRun {
    pub records: Vec<VersionedRecord>,
    pub tombstones_dropped: usize,
}

/// Performs the k-way merge over `readers`, resolving duplicate keys by
/// highest sequence number (the reader-level tiebreak `MergeIterator`
/// already applies) and dropping tombstones only at the deepest level that
/// still holds data for their key.
pub fn merge_inputs(
    readers: &[SSTableReader],
    output_level: u32,
    other_files: &[FileRecord],
) -> anyhow::Result<MergedRun> {
    let mut merge = MergeIterator::new(readers);
    let mut records = Vec::new();
    let mut tombstones_dropped = 0;

    while let Some(record) = merge.next_entry()? {
        if record.tombstone && is_deepest_for_key(record.key.as_bytes(), output_level, other_files) {
            tombstones_dropped += 1;
            continue;
        }
        records.push(record);
    }

    Ok(MergedRun { records, tombstones_dropped })
}
