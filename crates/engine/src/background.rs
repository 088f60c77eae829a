//! Background worker threads (§4.3, §4.6, §6.2): a flush worker draining the
//! mpsc channel [`crate::EngineInner::maybe_seal`] signals on, a compaction
//! worker ticking [`crate::EngineInner::compaction_tick`] on a fixed
//! interval, and a metrics worker that logs a periodic stats snapshot.
//!
//! Memtables signal readiness to flush over a channel rather than holding a
//! back-pointer to the engine — a sealed memtable has no way to call back
//! into `EngineInner` itself without one, and a channel keeps the dependency
//! one-directional.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use memtable::Memtable;
use tracing::{info, warn};

use crate::table::TableRuntime;
use crate::EngineInner;

pub(crate) type FlushSignal = (Arc<TableRuntime>, Arc<Memtable>);

const IDLE_POLL: Duration = Duration::from_millis(200);

pub(crate) struct Workers {
    pub flush: std::thread::JoinHandle<()>,
    pub compaction: std::thread::JoinHandle<()>,
    pub metrics: std::thread::JoinHandle<()>,
}

impl EngineInner {
    pub(crate) fn spawn_workers(self: &Arc<Self>, flush_rx: Receiver<FlushSignal>) -> Workers {
        let flush = {
            let engine = Arc::clone(self);
            std::thread::Builder::new()
                .name("riptide-flush".into())
                .spawn(move || engine.flush_worker_loop(flush_rx))
                .expect("failed to spawn flush worker thread")
        };
        let compaction = {
            let engine = Arc::clone(self);
            std::thread::Builder::new()
                .name("riptide-compaction".into())
                .spawn(move || engine.compaction_worker_loop())
                .expect("failed to spawn compaction worker thread")
        };
        let metrics = {
            let engine = Arc::clone(self);
            std::thread::Builder::new()
                .name("riptide-metrics".into())
                .spawn(move || engine.metrics_worker_loop())
                .expect("failed to spawn metrics worker thread")
        };
        Workers { flush, compaction, metrics }
    }

    fn flush_worker_loop(&self, flush_rx: Receiver<FlushSignal>) {
        loop {
            match flush_rx.recv_timeout(IDLE_POLL) {
                Ok((runtime, sealed)) => {
                    if let Err(e) = self.flush_sealed(&runtime, &sealed) {
                        warn!(table = %runtime.key, error = %e, "flush failed");
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.is_stopped() {
                        break;
                    }
                    self.seal_aged_tables();
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("flush worker stopped");
    }

    /// Age-based flush (§4.2): a table whose active memtable has been open
    /// longer than `memtable.flush_interval`, even if it never hit
    /// `flush_size`, gets sealed and flushed inline by the same worker.
    fn seal_aged_tables(&self) {
        let runtimes: Vec<Arc<TableRuntime>> = self.tables.read().unwrap().values().cloned().collect();
        for runtime in runtimes {
            if runtime.active_age() < self.config.memtable.flush_interval {
                continue;
            }
            if let Some(sealed) = runtime.seal_active() {
                if let Err(e) = self.flush_sealed(&runtime, &sealed) {
                    warn!(table = %runtime.key, error = %e, "age-triggered flush failed");
                }
            }
        }
    }

    fn compaction_worker_loop(&self) {
        loop {
            if self.sleep_or_stop(self.config.compaction.interval) {
                break;
            }
            if let Err(e) = self.compaction_tick() {
                warn!(error = %e, "compaction tick failed");
            }
        }
        info!("compaction worker stopped");
    }

    fn metrics_worker_loop(&self) {
        loop {
            if self.sleep_or_stop(Duration::from_secs(30)) {
                break;
            }
            let stats = self.stats_snapshot();
            info!(
                tables = stats.tables.len(),
                total_rows = stats.tables.iter().map(|t| t.row_count).sum::<usize>(),
                "engine metrics tick"
            );
        }
        info!("metrics worker stopped");
    }

    /// Sleeps in short slices so a shutdown doesn't wait out a full-length
    /// interval; returns `true` if the engine stopped during the sleep.
    fn sleep_or_stop(&self, total: Duration) -> bool {
        let mut remaining = total;
        while remaining > Duration::ZERO {
            if self.is_stopped() {
                return true;
            }
            let slice = remaining.min(IDLE_POLL);
            std::thread::sleep(slice);
            remaining -= slice;
        }
        self.is_stopped()
    }
}
