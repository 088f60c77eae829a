use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use riptide_core::Operation;
use tempfile::tempdir;
use wal::{SyncPolicy, WalWriter};

const N_APPENDS: u64 = 1_000;

fn append_n(policy: SyncPolicy) {
    let dir = tempdir().unwrap();
    let mut writer = WalWriter::create(dir.path(), 1, policy).unwrap();
    for seq in 1..=N_APPENDS {
        writer.append(seq, 0, Operation::Insert, b"benchmark-payload").unwrap();
    }
}

fn wal_append_immediate_benchmark(c: &mut Criterion) {
    c.bench_function("wal_append_immediate_1k", |b| {
        b.iter_batched(|| (), |()| append_n(SyncPolicy::Immediate), BatchSize::SmallInput);
    });
}

fn wal_append_batch_benchmark(c: &mut Criterion) {
    c.bench_function("wal_append_batch_1k", |b| {
        b.iter_batched(
            || (),
            |()| append_n(SyncPolicy::Batch { max_batch: 128, max_delay: std::time::Duration::from_millis(5) }),
            BatchSize::SmallInput,
        );
    });
}

fn wal_append_periodic_benchmark(c: &mut Criterion) {
    c.bench_function("wal_append_periodic_1k", |b| {
        b.iter_batched(
            || (),
            |()| append_n(SyncPolicy::Periodic { interval: std::time::Duration::from_millis(200) }),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, wal_append_immediate_benchmark, wal_append_batch_benchmark, wal_append_periodic_benchmark);
criterion_main!(benches);
