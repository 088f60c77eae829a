use memtable::Memtable;
use riptide_core::{EntityId, RecordKey, SequenceNumber, TableId, TenantId, Version, VersionedRecord};
use tempfile::tempdir;

use crate::format::{read_footer_versioned, Footer};
use crate::merge::MergeIterator;
use crate::{SSTableReader, SSTableWriter};

fn tenant() -> TenantId {
    TenantId::new("acme")
}
fn table() -> TableId {
    TableId::new("users")
}

fn rec(entity: &str, version: u64, seq: u64, payload: &[u8], tombstone: bool) -> VersionedRecord {
    let e = EntityId::from(entity);
    VersionedRecord {
        key: RecordKey::new(&tenant(), &table(), &e, Version(version)),
        version: Version(version),
        sequence: SequenceNumber(seq),
        timestamp_unix_nanos: 1000,
        payload: payload.to_vec(),
        tombstone,
    }
}

fn sample_memtable() -> Memtable {
    let mt = Memtable::new();
    mt.put(rec("a", 1, 1, b"apple", false)).unwrap();
    mt.put(rec("b", 1, 2, b"banana", false)).unwrap();
    mt.put(rec("c", 1, 3, b"", false)).unwrap();
    mt.put(rec("d", 1, 4, b"", true)).unwrap();
    mt
}

#[test]
fn write_empty_memtable_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.sst");
    let mem = Memtable::new();
    let result = SSTableWriter::write_from_memtable(&path, &mem, 0);
    assert!(result.is_err());
    assert!(!path.exists());
}

#[test]
fn write_then_read_roundtrips_values_and_tombstones() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.sst");
    let mem = sample_memtable();
    SSTableWriter::write_from_memtable(&path, &mem, 0).unwrap();

    let reader = SSTableReader::open(&path).unwrap();
    assert_eq!(reader.len(), 4);

    let a_key = RecordKey::new(&tenant(), &table(), &EntityId::from("a"), Version(1));
    let got = reader.get(a_key.as_bytes()).unwrap().unwrap();
    assert_eq!(got.payload, b"apple");
    assert!(!got.is_tombstone());

    let d_key = RecordKey::new(&tenant(), &table(), &EntityId::from("d"), Version(1));
    let tomb = reader.get(d_key.as_bytes()).unwrap().unwrap();
    assert!(tomb.is_tombstone());
}

#[test]
fn get_missing_key_returns_none() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.sst");
    SSTableWriter::write_from_memtable(&path, &sample_memtable(), 0).unwrap();

    let reader = SSTableReader::open(&path).unwrap();
    let missing = RecordKey::new(&tenant(), &table(), &EntityId::from("zzz"), Version(1));
    assert!(reader.get(missing.as_bytes()).unwrap().is_none());
}

#[test]
fn footer_is_v4_and_tracks_seq_and_version_bounds() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.sst");
    let mem = Memtable::new();
    mem.put(rec("a", 1, 10, b"x", false)).unwrap();
    mem.put(rec("a", 2, 11, b"y", false)).unwrap();
    SSTableWriter::write_from_memtable(&path, &mem, 3).unwrap();

    let mut f = std::fs::File::open(&path).unwrap();
    let footer = read_footer_versioned(&mut f).unwrap();
    match footer {
        Footer::V4 { min_seq, max_seq, min_version, max_version, level, .. } => {
            assert_eq!(min_seq, 10);
            assert_eq!(max_seq, 11);
            assert_eq!(min_version, 1);
            assert_eq!(max_version, 2);
            assert_eq!(level, 3);
        }
        other => panic!("expected v4 footer, got {:?}", other),
    }

    let reader = SSTableReader::open(&path).unwrap();
    let stats = reader.stats();
    assert_eq!(stats.row_count, 2);
    assert_eq!(stats.level, 3);
    assert_eq!(stats.version_range, Some((1, 2)));
}

#[test]
fn bloom_filter_rejects_absent_keys_without_disk_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out.sst");
    SSTableWriter::write_from_memtable(&path, &sample_memtable(), 0).unwrap();

    let reader = SSTableReader::open(&path).unwrap();
    assert!(reader.has_bloom());
    let missing = RecordKey::new(&tenant(), &table(), &EntityId::from("not-there"), Version(1));
    assert!(reader.get(missing.as_bytes()).unwrap().is_none());
}

#[test]
fn merge_iterator_combines_files_in_key_order_keeping_highest_sequence() {
    let dir = tempdir().unwrap();

    let mem1 = Memtable::new();
    mem1.put(rec("a", 1, 1, b"old-a", false)).unwrap();
    mem1.put(rec("c", 1, 3, b"c-value", false)).unwrap();
    let path1 = dir.path().join("one.sst");
    SSTableWriter::write_from_memtable(&path1, &mem1, 0).unwrap();

    let mem2 = Memtable::new();
    mem2.put(rec("a", 1, 5, b"new-a", false)).unwrap(); // same key, higher seq
    mem2.put(rec("b", 1, 2, b"b-value", false)).unwrap();
    let path2 = dir.path().join("two.sst");
    SSTableWriter::write_from_memtable(&path2, &mem2, 0).unwrap();

    let readers = vec![SSTableReader::open(&path1).unwrap(), SSTableReader::open(&path2).unwrap()];
    let mut merge = MergeIterator::new(&readers);
    let all = merge.collect_all().unwrap();

    assert_eq!(all.len(), 3);
    assert_eq!(all[0].payload, b"new-a"); // higher seq wins on duplicate key
    assert_eq!(all[1].payload, b"b-value");
    assert_eq!(all[2].payload, b"c-value");
}

#[test]
fn write_from_records_respects_an_arbitrary_iterator() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream.sst");
    let records = vec![rec("a", 1, 1, b"1", false), rec("b", 1, 2, b"2", false)];
    SSTableWriter::write_from_records(&path, records.len(), records.into_iter(), 1).unwrap();

    let reader = SSTableReader::open(&path).unwrap();
    assert_eq!(reader.len(), 2);
    assert_eq!(reader.stats().level, 1);
}
