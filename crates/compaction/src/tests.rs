use std::sync::Arc;

use blockstore::LocalBlockStore;
use catalog::{Catalog, ColumnSchema, FileRecord, ScalarKind, TableSchema};
use memtable::Memtable;
use riptide_core::{EntityId, RecordKey, SequenceNumber, TableId, TenantId, Version, VersionedRecord};
use sstable::SSTableWriter;

use crate::executor::{run_compaction, CompactionPlan};
use crate::size_tiered::SizeTiered;
use crate::strategy::{CompactionStrategy, LevelView};
use crate::time_window::TimeWindow;

fn record(entity: &str, version: u64, seq: u64, tombstone: bool) -> VersionedRecord {
    let tenant = TenantId::new("acme");
    let table = TableId::new("orders");
    VersionedRecord {
        key: RecordKey::new(&tenant, &table, &EntityId::from(entity), Version(version)),
        version: Version(version),
        sequence: SequenceNumber(seq),
        timestamp_unix_nanos: 0,
        payload: if tombstone { Vec::new() } else { b"payload".to_vec() },
        tombstone,
    }
}

fn write_sstable(dir: &std::path::Path, name: &str, records: Vec<VersionedRecord>, level: u32) -> FileRecord {
    let mem = Memtable::new();
    let count = records.len();
    let min_seq = records.iter().map(|r| r.sequence.0).min().unwrap_or(0);
    let max_seq = records.iter().map(|r| r.sequence.0).max().unwrap_or(0);
    let min_key = records.iter().map(|r| r.key.as_bytes().to_vec()).min().unwrap();
    let max_key = records.iter().map(|r| r.key.as_bytes().to_vec()).max().unwrap();
    for r in records {
        mem.put(r).unwrap();
    }
    let path = dir.join(name);
    SSTableWriter::write_from_memtable(&path, &mem, level).unwrap();
    let size_bytes = std::fs::metadata(&path).unwrap().len();
    FileRecord {
        file_id: name.to_string(),
        min_key,
        max_key,
        row_count: count,
        min_seq,
        max_seq,
        level,
        size_bytes,
        created_at_unix_nanos: 0,
        last_access_unix_nanos: 0,
    }
}

#[test]
fn size_tiered_selects_once_bucket_reaches_threshold() {
    let files: Vec<catalog::FileRecord> = (0..4)
        .map(|i| FileRecord {
            file_id: format!("f{i}"),
            min_key: vec![0],
            max_key: vec![0xff],
            row_count: 1,
            min_seq: 0,
            max_seq: 0,
            level: 0,
            size_bytes: 1000,
            created_at_unix_nanos: 0,
            last_access_unix_nanos: 0,
        })
        .collect();
    let view = LevelView { level: 0, files: &files };
    let strategy = SizeTiered::default();
    assert_eq!(strategy.select(&view).len(), 4);
    assert!(strategy.priority(&view) > 0.0);
}

#[test]
fn size_tiered_ignores_small_buckets() {
    let files = vec![FileRecord {
        file_id: "f0".into(),
        min_key: vec![0],
        max_key: vec![0xff],
        row_count: 1,
        min_seq: 0,
        max_seq: 0,
        level: 0,
        size_bytes: 1000,
        created_at_unix_nanos: 0,
        last_access_unix_nanos: 0,
    }];
    let view = LevelView { level: 0, files: &files };
    let strategy = SizeTiered::default();
    assert!(strategy.select(&view).is_empty());
    assert_eq!(strategy.priority(&view), 0.0);
}

#[test]
fn time_window_requires_two_aged_files_in_same_window() {
    let files = vec![
        FileRecord {
            file_id: "f0".into(),
            min_key: vec![0],
            max_key: vec![0xff],
            row_count: 1,
            min_seq: 0,
            max_seq: 0,
            level: 0,
            size_bytes: 10,
            created_at_unix_nanos: 0,
            last_access_unix_nanos: 0,
        },
        FileRecord {
            file_id: "f1".into(),
            min_key: vec![0],
            max_key: vec![0xff],
            row_count: 1,
            min_seq: 0,
            max_seq: 0,
            level: 0,
            size_bytes: 10,
            created_at_unix_nanos: 100,
            last_access_unix_nanos: 0,
        },
    ];
    let view = LevelView { level: 0, files: &files };
    let strategy = TimeWindow::with_clock(
        std::time::Duration::from_secs(3600),
        std::time::Duration::from_secs(1),
        || 10_000_000_000,
    );
    assert_eq!(strategy.select(&view).len(), 2);
}

#[test]
fn run_compaction_merges_and_retires_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalBlockStore::new(dir.path()).unwrap());
    let catalog = Catalog::new(store);
    let schema = TableSchema::new(
        "acme",
        "orders",
        vec![ColumnSchema { name: "id".into(), kind: ScalarKind::Int64, secondary_index: None }],
    );
    catalog.create_table(schema).unwrap();

    let f0 = write_sstable(dir.path(), "f0.sst", vec![record("e1", 1, 1, false)], 0);
    let f1 = write_sstable(dir.path(), "f1.sst", vec![record("e1", 2, 2, false), record("e2", 1, 3, false)], 0);
    catalog.commit("orders", vec![f0, f1], &[], None).unwrap();

    let plan = CompactionPlan {
        table: "orders".to_string(),
        input_file_ids: vec!["f0.sst".to_string(), "f1.sst".to_string()],
        output_level: 1,
        output_file_id: "merged.sst".to_string(),
    };

    let retired_paths = run_compaction(&catalog, dir.path(), &plan).unwrap();
    assert_eq!(retired_paths.len(), 2);

    let files = catalog.files("orders").unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_id, "merged.sst");
    assert_eq!(files[0].row_count, 2);
}

#[test]
fn run_compaction_drops_tombstone_at_deepest_level() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalBlockStore::new(dir.path()).unwrap());
    let catalog = Catalog::new(store);
    let schema = TableSchema::new(
        "acme",
        "orders",
        vec![ColumnSchema { name: "id".into(), kind: ScalarKind::Int64, secondary_index: None }],
    );
    catalog.create_table(schema).unwrap();

    let f0 = write_sstable(dir.path(), "f0.sst", vec![record("e1", 1, 1, true)], 1);
    catalog.commit("orders", vec![f0], &[], None).unwrap();

    let plan = CompactionPlan {
        table: "orders".to_string(),
        input_file_ids: vec!["f0.sst".to_string()],
        output_level: 1,
        output_file_id: "merged.sst".to_string(),
    };

    run_compaction(&catalog, dir.path(), &plan).unwrap();

    // The sole tombstone had nothing deeper to shadow, so it was dropped
    // entirely and no output file was registered.
    let files = catalog.files("orders").unwrap();
    assert!(files.is_empty());
}

#[test]
fn run_compaction_keeps_tombstone_when_deeper_level_holds_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalBlockStore::new(dir.path()).unwrap());
    let catalog = Catalog::new(store);
    let schema = TableSchema::new(
        "acme",
        "orders",
        vec![ColumnSchema { name: "id".into(), kind: ScalarKind::Int64, secondary_index: None }],
    );
    catalog.create_table(schema).unwrap();

    let f0 = write_sstable(dir.path(), "f0.sst", vec![record("e1", 2, 2, true)], 0);
    let deeper = write_sstable(dir.path(), "deep.sst", vec![record("e1", 1, 1, false)], 2);
    catalog.commit("orders", vec![f0, deeper], &[], None).unwrap();

    let plan = CompactionPlan {
        table: "orders".to_string(),
        input_file_ids: vec!["f0.sst".to_string()],
        output_level: 1,
        output_file_id: "merged.sst".to_string(),
    };

    run_compaction(&catalog, dir.path(), &plan).unwrap();

    let files = catalog.files("orders").unwrap();
    assert!(files.iter().any(|f| f.file_id == "merged.sst"));
}
