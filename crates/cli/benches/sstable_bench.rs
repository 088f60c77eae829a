use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use memtable::Memtable;
use riptide_core::{RecordKey, SequenceNumber, TableId, TenantId, Version, VersionedRecord};
use sstable::{SSTableReader, SSTableWriter};
use tempfile::tempdir;

const N_KEYS: usize = 10_000;
const VALUE_SIZE: usize = 100;

fn tenant() -> TenantId {
    TenantId::new("bench-tenant")
}

fn table() -> TableId {
    TableId::new("bench-table")
}

fn build_memtable() -> Memtable {
    let mem = Memtable::new();
    let (t, tbl) = (tenant(), table());
    for i in 0..N_KEYS {
        let entity = format!("key{i}").into();
        let key = RecordKey::new(&t, &tbl, &entity, Version(i as u64));
        mem.put(VersionedRecord {
            key,
            version: Version(i as u64),
            sequence: SequenceNumber(i as u64),
            timestamp_unix_nanos: 0,
            payload: vec![b'x'; VALUE_SIZE],
            tombstone: false,
        })
        .unwrap();
    }
    mem
}

fn sstable_write_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_write_from_memtable_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.sst");
                let mem = build_memtable();
                (dir, path, mem)
            },
            |(_dir, path, mem)| {
                SSTableWriter::write_from_memtable(&path, &mem, 0).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

fn sstable_get_hit_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_get_hit_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.sst");

                let mem = build_memtable();
                SSTableWriter::write_from_memtable(&path, &mem, 0).unwrap();

                let reader = SSTableReader::open(&path).unwrap();
                let (t, tbl) = (tenant(), table());
                let keys: Vec<Vec<u8>> =
                    (0..N_KEYS).map(|i| RecordKey::new(&t, &tbl, &format!("key{i}").into(), Version(i as u64)).as_bytes().to_vec()).collect();
                (dir, reader, keys)
            },
            |(_dir, reader, keys)| {
                for key in &keys {
                    let v = reader.get(key).unwrap();
                    assert!(v.is_some());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn sstable_get_miss_benchmark(c: &mut Criterion) {
    c.bench_function("sstable_get_miss_10k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let path = dir.path().join("bench.sst");

                let mem = build_memtable();
                SSTableWriter::write_from_memtable(&path, &mem, 0).unwrap();

                let reader = SSTableReader::open(&path).unwrap();
                let (t, tbl) = (tenant(), table());
                let keys: Vec<Vec<u8>> = (0..N_KEYS)
                    .map(|i| RecordKey::new(&t, &tbl, &format!("missing{i}").into(), Version(0)).as_bytes().to_vec())
                    .collect();
                (dir, reader, keys)
            },
            |(_dir, reader, keys)| {
                for key in &keys {
                    let v = reader.get(key).unwrap();
                    assert!(v.is_none());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    sstable_write_benchmark,
    sstable_get_hit_benchmark,
    sstable_get_miss_benchmark
);
criterion_main!(benches);
