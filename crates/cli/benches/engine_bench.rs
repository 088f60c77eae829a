use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use config::Config;
use engine::{CancellationToken, Engine, QueryRequest, Record, TableId, TenantId};
use tempfile::tempdir;

const N_RECORDS: usize = 2_000;

fn open_engine(dir: &std::path::Path) -> Engine {
    let mut config = Config::default();
    config.wal.dir = dir.join("wal").to_string_lossy().into_owned();
    config.storage.data_dir = dir.join("data").to_string_lossy().into_owned();
    config.memtable.flush_size = 8 * 1024 * 1024;
    Engine::open(config).unwrap()
}

fn engine_ingest_benchmark(c: &mut Criterion) {
    c.bench_function("engine_ingest_record_2k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let engine = open_engine(dir.path());
                let tenant = TenantId::new("bench-tenant");
                let table = TableId::new("bench-table");
                engine.create_table(&tenant, &table, Vec::new()).unwrap();
                (dir, engine, tenant, table, CancellationToken::new())
            },
            |(_dir, engine, tenant, table, cancel)| {
                for i in 0..N_RECORDS {
                    let record = Record::insert(format!("key{i}"), format!("value{i}").into_bytes());
                    engine.ingest_record(&tenant, &table, record, &cancel).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn engine_query_benchmark(c: &mut Criterion) {
    c.bench_function("engine_query_scan_2k", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let engine = open_engine(dir.path());
                let tenant = TenantId::new("bench-tenant");
                let table = TableId::new("bench-table");
                engine.create_table(&tenant, &table, Vec::new()).unwrap();
                let cancel = CancellationToken::new();
                for i in 0..N_RECORDS {
                    let record = Record::insert(format!("key{i}"), format!("value{i}").into_bytes());
                    engine.ingest_record(&tenant, &table, record, &cancel).unwrap();
                }
                engine.checkpoint(&tenant, &table).unwrap();
                (dir, engine, tenant, table, cancel)
            },
            |(_dir, engine, tenant, table, cancel)| {
                let request = QueryRequest::default();
                let results = engine.query(&tenant, &table, &request, &cancel).unwrap();
                assert_eq!(results.len(), N_RECORDS);
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, engine_ingest_benchmark, engine_query_benchmark);
criterion_main!(benches);
