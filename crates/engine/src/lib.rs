//! # engine
//!
//! The Storage Manager (§4.7, §6.1): wires every other crate together into
//! one multi-tenant, multi-table orchestrator. Grounded on the teacher's
//! single-tenant `Engine` (a struct owning a memtable, a WAL writer, a
//! manifest, and `l0`/`l1` SSTable vectors, with `write`/`read`/`compaction`
//! submodules hung off it) — generalized so the single memtable/WAL/
//! compaction state becomes per-`(tenant, table)` routing state behind a
//! table name, while the WAL, the sequence counter, and the MVCC version
//! counter stay engine-wide singletons shared by every table.
//!
//! `EngineInner` holds all of that shared state; [`Engine`] is a thin
//! `Arc<EngineInner>` handle callers actually construct and hold, so
//! cloning an `Engine` to hand a reference to a background thread is just
//! an `Arc` bump.

mod background;
mod columns;
mod compact;
mod envelope;
mod error;
mod flush;
mod ingest;
mod query;
mod record;
mod recovery;
mod table;
mod wal_codec;

pub use catalog::{ColumnSchema, ScalarKind, TableSchema};
pub use config::Config;
pub use record::{ColumnValue, QueryFilter, QueryRecord, QueryRequest, Record};
pub use riptide_core::{CancellationToken, EngineError, EngineResult, EntityId, SequenceNumber, TableId, TenantId, Version};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{mpsc, Arc, Mutex, RwLock};

use blockstore::BlockStore;
use catalog::Catalog;
use compaction::{Adaptive, CompactionStrategy, GraceQueue, Leveled, SizeTiered, TimeWindow};
use index::IndexStore;
use mvcc::MvccResolver;
use riptide_core::SequenceCounter;
use tracing::{info, instrument, warn};

use crate::background::{FlushSignal, Workers};
use crate::table::TableRuntime;

/// `idle → running → draining → stopped`, per §4.7. `open` moves an engine
/// straight from idle to running as its last construction step, so no
/// running engine is ever observed in the idle state. Stored as a plain
/// `AtomicU8` rather than an `RwLock<enum>` — every check is a single load
/// on a hot path (ingest, query), and the only writes are the one-way
/// transitions a running engine ever makes.
#[allow(dead_code)]
const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_DRAINING: u8 = 2;
const STATE_STOPPED: u8 = 3;

/// Everything an [`Engine`] handle shares across clones and background
/// threads. Never constructed directly outside of [`Engine::open`] — the
/// fields are `pub(crate)` so every other module in this crate can reach
/// them, but nothing outside the crate sees this type at all.
pub(crate) struct EngineInner {
    pub(crate) config: Config,
    pub(crate) data_dir: PathBuf,
    pub(crate) wal: Mutex<wal::WalWriter>,
    pub(crate) seq: SequenceCounter,
    pub(crate) mvcc: MvccResolver,
    pub(crate) catalog: Catalog,
    pub(crate) index: IndexStore,
    pub(crate) tables: RwLock<HashMap<String, Arc<TableRuntime>>>,
    pub(crate) compaction_strategy: Box<dyn CompactionStrategy>,
    pub(crate) grace_queue: Mutex<GraceQueue>,
    pub(crate) cancel: riptide_core::CancellationToken,
    pub(crate) flush_tx: mpsc::Sender<FlushSignal>,
    state: AtomicU8,
}

impl EngineInner {
    pub(crate) fn is_stopped(&self) -> bool {
        self.state.load(Ordering::SeqCst) >= STATE_DRAINING
    }

    pub(crate) fn require_running(&self) -> EngineResult<()> {
        if self.state.load(Ordering::SeqCst) == STATE_RUNNING {
            Ok(())
        } else {
            Err(EngineError::Unavailable("engine is not running".to_string()))
        }
    }

    pub(crate) fn table_runtime(&self, tenant: &TenantId, table: &TableId) -> EngineResult<Arc<TableRuntime>> {
        let key = table::qualify(tenant, table);
        self.tables
            .read()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("table {key:?} does not exist")))
    }

    /// §4.2 backpressure: blocks (polling, cooperating with `cancel`) while
    /// the immutable queue is at `max_immutable`, or fails fast with
    /// `CapacityExceeded` when `backpressure_blocks` is off.
    pub(crate) fn wait_for_backpressure(&self, runtime: &Arc<TableRuntime>, cancel: &riptide_core::CancellationToken) -> EngineResult<()> {
        let limit = self.config.memtable.max_immutable;
        loop {
            if runtime.immutable_count() < limit {
                return Ok(());
            }
            if !self.config.memtable.backpressure_blocks {
                return Err(EngineError::CapacityExceeded(format!(
                    "table {:?} has {} immutable memtables queued, at the configured limit of {limit}",
                    runtime.key,
                    runtime.immutable_count()
                )));
            }
            cancel.check()?;
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    /// §4.2 size-triggered flush: seals the active memtable once it has
    /// grown past `memtable.flush_size`, handing it to the flush worker
    /// over `flush_tx` rather than flushing it inline on the ingest path.
    pub(crate) fn maybe_seal(&self, runtime: &Arc<TableRuntime>) -> EngineResult<()> {
        if runtime.active_memtable().size_bytes() < self.config.memtable.flush_size {
            return Ok(());
        }
        if let Some(sealed) = runtime.seal_active() {
            let _ = self.flush_tx.send((Arc::clone(runtime), sealed));
        }
        Ok(())
    }

    pub(crate) fn stats_snapshot(&self) -> EngineStats {
        let tables = self.tables.read().unwrap();
        let table_stats = tables
            .values()
            .map(|runtime| {
                let files = self.catalog.files(&runtime.key).unwrap_or_default();
                TableStats {
                    tenant: runtime.tenant.as_str().to_string(),
                    table: runtime.table.as_str().to_string(),
                    row_count: files.iter().map(|f| f.row_count).sum::<usize>() + runtime.active_memtable().count(),
                    file_count: files.len(),
                    immutable_memtables: runtime.immutable_count(),
                    checkpoint_sequence: runtime.checkpoint_sequence.load(Ordering::SeqCst),
                }
            })
            .collect();
        EngineStats { tables: table_stats, current_sequence: self.seq.current().0, current_version: self.mvcc.snapshot().0 }
    }
}

/// Per-table summary surfaced by [`Engine::stats`].
#[derive(Debug, Clone)]
pub struct TableStats {
    pub tenant: String,
    pub table: String,
    pub row_count: usize,
    pub file_count: usize,
    pub immutable_memtables: usize,
    pub checkpoint_sequence: u64,
}

/// Engine-wide summary surfaced by [`Engine::stats`] and logged
/// periodically by the metrics worker.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub tables: Vec<TableStats>,
    pub current_sequence: u64,
    pub current_version: u64,
}

/// A handle to a running storage engine instance. Cheap to clone (an `Arc`
/// bump) — every clone shares the same tables, WAL, and background
/// workers.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
    workers: Arc<Mutex<Option<Workers>>>,
}

fn build_compaction_strategy(cfg: &config::CompactionConfig) -> Box<dyn CompactionStrategy> {
    match cfg.strategy {
        config::CompactionStrategyKind::SizeTiered => {
            Box::new(SizeTiered { min_sstable_count: cfg.min_sstable_count, max_sstable_count: cfg.max_sstable_count, size_ratio: 1.2 })
        }
        config::CompactionStrategyKind::Leveled => Box::new(Leveled),
        config::CompactionStrategyKind::TimeWindow => Box::new(TimeWindow::new(cfg.window_size, cfg.compaction_delay)),
        config::CompactionStrategyKind::Adaptive => Box::new(Adaptive::new(cfg.switch_interval, cfg.window_size, cfg.compaction_delay)),
    }
}

fn build_block_store(cfg: &config::StorageConfig) -> EngineResult<Arc<dyn BlockStore>> {
    match cfg.backend {
        config::StorageBackendKind::Local => {
            let store = blockstore::LocalBlockStore::new(&cfg.data_dir).map_err(crate::error::from_blockstore)?;
            Ok(Arc::new(store))
        }
        config::StorageBackendKind::S3 => {
            let bucket =
                cfg.s3_bucket.as_deref().ok_or_else(|| EngineError::invalid_input("storage.s3_bucket is required when backend = s3"))?;
            let region = cfg.s3_region.as_deref().unwrap_or("us-east-1");
            let store = blockstore::S3BlockStore::new(bucket, region, cfg.s3_endpoint.as_deref()).map_err(crate::error::from_blockstore)?;
            Ok(Arc::new(store))
        }
    }
}

fn sync_policy_from_config(cfg: &config::WalConfig) -> wal::SyncPolicy {
    match cfg.sync_policy {
        config::SyncPolicyKind::Immediate => wal::SyncPolicy::Immediate,
        config::SyncPolicyKind::Batch => wal::SyncPolicy::Batch { max_batch: cfg.batch_max_size, max_delay: cfg.batch_max_delay },
        config::SyncPolicyKind::Periodic => wal::SyncPolicy::Periodic { interval: cfg.sync_interval },
    }
}

impl Engine {
    /// Builds and starts an engine instance (§4.7 startup): construct the
    /// configured block store, load the catalog, replay the WAL into fresh
    /// memtables, resume the sequence/version counters past everything
    /// durable, sweep orphaned flush output, then spawn the background
    /// workers and start serving requests.
    #[instrument(skip(config))]
    pub fn open(config: Config) -> EngineResult<Self> {
        let data_dir = PathBuf::from(&config.storage.data_dir);
        let wal_dir = PathBuf::from(&config.wal.dir);

        let block_store = build_block_store(&config.storage)?;
        let catalog = Catalog::new(Arc::clone(&block_store));
        catalog.load_all().map_err(crate::error::from_catalog)?;
        let index = IndexStore::new(Arc::clone(&block_store));

        let recovered = recovery::recover(&wal_dir, &data_dir, &catalog)?;
        for table_key in recovered.tables.keys() {
            recovery::gc_unreferenced(&data_dir, &catalog, table_key)?;
        }

        let wal_writer = wal::WalWriter::create(&wal_dir, recovered.next_sequence, sync_policy_from_config(&config.wal))
            .map_err(crate::error::from_wal)?
            .with_segment_size(config.wal.segment_size);

        let seq = SequenceCounter::starting_at(recovered.next_sequence.saturating_sub(1));
        let mvcc = MvccResolver::resume_at(recovered.next_version.saturating_sub(1));
        let compaction_strategy = build_compaction_strategy(&config.compaction);

        let (flush_tx, flush_rx) = mpsc::channel();

        let inner = Arc::new(EngineInner {
            config,
            data_dir,
            wal: Mutex::new(wal_writer),
            seq,
            mvcc,
            catalog,
            index,
            tables: RwLock::new(recovered.tables),
            compaction_strategy,
            grace_queue: Mutex::new(GraceQueue::new()),
            cancel: riptide_core::CancellationToken::new(),
            flush_tx,
            state: AtomicU8::new(STATE_RUNNING),
        });

        let workers = inner.spawn_workers(flush_rx);
        info!(tables = inner.tables.read().unwrap().len(), "engine started");
        Ok(Self { inner, workers: Arc::new(Mutex::new(Some(workers))) })
    }

    /// The cooperative cancellation token tied to this engine's own
    /// lifecycle — distinct from the per-call token every operation below
    /// also accepts, which lets a caller cancel one request without
    /// touching any other.
    #[must_use]
    pub fn cancellation_token(&self) -> riptide_core::CancellationToken {
        self.inner.cancel.clone()
    }

    /// Registers a new table under `tenant` (§6.1 `create_table`). Errors
    /// `conflict` if the qualified `(tenant, table)` pair already exists.
    #[instrument(skip(self, columns))]
    pub fn create_table(&self, tenant: &TenantId, table: &TableId, columns: Vec<ColumnSchema>) -> EngineResult<()> {
        self.inner.require_running()?;
        let key = table::qualify(tenant, table);
        let schema = TableSchema::new(tenant.as_str(), key.clone(), columns);
        self.inner.catalog.create_table(schema.clone()).map_err(crate::error::from_catalog)?;
        let runtime = Arc::new(TableRuntime::new(tenant.clone(), table.clone(), schema));
        self.inner.tables.write().unwrap().insert(key, runtime);
        Ok(())
    }

    /// Drops a table and everything it owns: catalog entry, index state,
    /// and its on-disk data directory (§6.1 `drop_table`). Best-effort on
    /// the filesystem cleanup — a failure there doesn't roll back the
    /// catalog/index removal, since the table is already unreachable once
    /// those succeed.
    #[instrument(skip(self))]
    pub fn drop_table(&self, tenant: &TenantId, table: &TableId) -> EngineResult<()> {
        self.inner.require_running()?;
        let key = table::qualify(tenant, table);
        self.inner.catalog.drop_table(&key).map_err(crate::error::from_catalog)?;
        self.inner.index.drop_table(&key).map_err(crate::error::from_index)?;
        self.inner.tables.write().unwrap().remove(&key);
        let _ = std::fs::remove_dir_all(self.inner.table_data_dir(&key));
        Ok(())
    }

    pub fn ingest_record(
        &self,
        tenant: &TenantId,
        table: &TableId,
        record: Record,
        cancel: &riptide_core::CancellationToken,
    ) -> EngineResult<(SequenceNumber, Version)> {
        self.inner.ingest_record(tenant, table, record, cancel)
    }

    pub fn ingest_batch(
        &self,
        tenant: &TenantId,
        table: &TableId,
        records: Vec<Record>,
        cancel: &riptide_core::CancellationToken,
    ) -> EngineResult<(SequenceNumber, SequenceNumber)> {
        self.inner.ingest_batch(tenant, table, records, cancel)
    }

    pub fn query(
        &self,
        tenant: &TenantId,
        table: &TableId,
        request: &QueryRequest,
        cancel: &riptide_core::CancellationToken,
    ) -> EngineResult<Vec<QueryRecord>> {
        self.inner.query(tenant, table, request, cancel)
    }

    pub fn get_record(
        &self,
        tenant: &TenantId,
        table: &TableId,
        entity_id: &EntityId,
        snapshot: Option<Version>,
        cancel: &riptide_core::CancellationToken,
    ) -> EngineResult<Option<QueryRecord>> {
        self.inner.get_record(tenant, table, entity_id, snapshot, cancel)
    }

    /// Forces an immediate checkpoint of one table (§6.1 `checkpoint`):
    /// seals the active memtable (if non-empty) and flushes it inline,
    /// bypassing the size/age triggers the background flush worker
    /// otherwise waits on. Used by the CLI's `FLUSH` command and by tests
    /// that need a durable, queryable-from-disk state deterministically.
    #[instrument(skip(self))]
    pub fn checkpoint(&self, tenant: &TenantId, table: &TableId) -> EngineResult<()> {
        self.inner.require_running()?;
        let runtime = self.inner.table_runtime(tenant, table)?;
        if let Some(sealed) = runtime.seal_active() {
            self.inner.flush_sealed(&runtime, &sealed)?;
        }
        Ok(())
    }

    /// Runs one compaction pass immediately instead of waiting for the
    /// background worker's next tick. Used by the CLI's `COMPACT` command.
    pub fn compact_now(&self) -> EngineResult<()> {
        self.inner.require_running()?;
        self.inner.compaction_tick()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.inner.stats_snapshot()
    }

    /// §4.7 shutdown: stops accepting new operations, flushes every
    /// table's active memtable so nothing is left only in memory, then
    /// signals and joins the background workers.
    #[instrument(skip(self))]
    pub fn shutdown(&self) -> EngineResult<()> {
        self.inner.state.store(STATE_DRAINING, Ordering::SeqCst);
        let runtimes: Vec<Arc<TableRuntime>> = self.inner.tables.read().unwrap().values().cloned().collect();
        for runtime in &runtimes {
            if let Some(sealed) = runtime.seal_active() {
                if let Err(e) = self.inner.flush_sealed(runtime, &sealed) {
                    warn!(table = %runtime.key, error = %e, "failed to flush during shutdown");
                }
            }
        }
        self.inner.state.store(STATE_STOPPED, Ordering::SeqCst);

        if let Some(workers) = self.workers.lock().unwrap().take() {
            let _ = workers.flush.join();
            let _ = workers.compaction.join();
            let _ = workers.metrics.join();
        }
        info!("engine stopped");
        Ok(())
    }
}
