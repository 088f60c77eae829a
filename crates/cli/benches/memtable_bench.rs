use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use memtable::Memtable;
use riptide_core::{RecordKey, SequenceNumber, TableId, TenantId, Version, VersionedRecord};

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

fn memtable_put_benchmark(c: &mut Criterion) {
    c.bench_function("memtable_put_10k", |b| {
        b.iter_batched(
            || (Memtable::new(), tenant(), table()),
            |(mem, t, tbl)| {
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
            },
            BatchSize::LargeInput,
        );
    });
}

fn memtable_get_hit_benchmark(c: &mut Criterion) {
    c.bench_function("memtable_get_hit_10k", |b| {
        b.iter_batched(
            || (build_memtable(), tenant(), table()),
            |(mem, t, tbl)| {
                for i in 0..N_KEYS {
                    let entity = format!("key{i}").into();
                    let found = mem.get(&t, &tbl, &entity, Version(u64::MAX));
                    assert!(found.is_some());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

fn memtable_scan_benchmark(c: &mut Criterion) {
    c.bench_function("memtable_scan_all_10k", |b| {
        b.iter_batched(
            || {
                let mem = build_memtable();
                let t = tenant();
                let tbl = table();
                let start = RecordKey::entity_lower_bound(&t, &tbl, &"key0".into());
                let mut end_bytes = RecordKey::entity_lower_bound(&t, &tbl, &"key9999".into()).as_bytes().to_vec();
                end_bytes.push(0xff);
                let end = RecordKey::from_bytes(end_bytes);
                (mem, start, end)
            },
            |(mem, start, end)| {
                let results = mem.scan(&start, &end);
                assert!(!results.is_empty());
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, memtable_put_benchmark, memtable_get_hit_benchmark, memtable_scan_benchmark);
criterion_main!(benches);
