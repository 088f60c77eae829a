//! §4.6 background compaction tick: scores every table/level with the
//! configured [`compaction::CompactionStrategy`], runs the highest-priority
//! candidates up to the configured concurrency, and reconciles the primary
//! index and grace queue afterward.
//!
//! Secondary index entries are not rewritten by a compaction run — a
//! compacted file keeps the same column values for every surviving key, so
//! the only index work a compaction needs is retiring primary locators for
//! unlinked input files and registering locators for the new output file.

use std::sync::atomic::{AtomicU64, Ordering};

use compaction::{pick_for_tick, rank_candidates, run_compaction, CompactionPlan, CompactionStrategy};
use tracing::{info, warn};

use crate::EngineInner;

static COMPACTION_FILE_SEQ: AtomicU64 = AtomicU64::new(0);

impl EngineInner {
    pub(crate) fn compaction_tick(&self) -> riptide_core::EngineResult<()> {
        let table_keys: Vec<String> = self.tables.read().unwrap().keys().cloned().collect();
        if table_keys.is_empty() {
            return Ok(());
        }

        let strategy: &dyn CompactionStrategy = self.compaction_strategy.as_ref();
        let candidates = rank_candidates(&self.catalog, &table_keys, strategy);
        let picked = pick_for_tick(candidates, self.config.compaction.parallelism);

        for candidate in picked {
            self.cancel.check()?;
            if let Err(e) = self.run_one_compaction(&candidate.table, candidate.level, strategy) {
                warn!(table = %candidate.table, level = candidate.level, error = %e, "compaction run failed");
            }
        }

        self.grace_queue.lock().unwrap().sweep(self.config.compaction.compaction_delay);
        Ok(())
    }

    fn run_one_compaction(&self, table_key: &str, level: u32, strategy: &dyn CompactionStrategy) -> riptide_core::EngineResult<()> {
        let files = self.catalog.files(table_key).map_err(crate::error::from_catalog)?;
        let level_files: Vec<_> = files.iter().filter(|f| f.level == level).cloned().collect();
        if level_files.is_empty() {
            return Ok(());
        }
        let view = compaction::LevelView { level, files: &level_files };
        let selected = strategy.select(&view);
        if selected.is_empty() {
            return Ok(());
        }

        let seq = COMPACTION_FILE_SEQ.fetch_add(1, Ordering::Relaxed);
        let output_file_id = format!("compacted-{}-{}-{:08x}.sst", level + 1, now_unix_nanos(), seq);
        let plan = CompactionPlan {
            table: table_key.to_string(),
            input_file_ids: selected.clone(),
            output_level: level + 1,
            output_file_id: output_file_id.clone(),
        };

        let table_dir = self.table_data_dir(table_key);
        let retired_paths = run_compaction(&self.catalog, &table_dir, &plan).map_err(crate::error::from_compaction)?;

        self.index
            .with_primary_mut(table_key, |primary| {
                for file_id in &selected {
                    primary.remove_file(file_id);
                }
            })
            .map_err(crate::error::from_index)?;

        let output_path = table_dir.join(&output_file_id);
        if output_path.exists() {
            if let Ok(reader) = sstable::SSTableReader::open(&output_path) {
                self.index
                    .with_primary_mut(table_key, |primary| {
                        for key_bytes in reader.keys() {
                            if let Some(offset) = reader.offset_of(key_bytes) {
                                primary.insert(key_bytes.to_vec(), output_file_id.clone(), offset);
                            }
                        }
                    })
                    .map_err(crate::error::from_index)?;
            }
        }
        self.index.persist(table_key).map_err(crate::error::from_index)?;

        self.grace_queue.lock().unwrap().enqueue(retired_paths);

        info!(table = %table_key, level, inputs = selected.len(), "compaction committed");
        Ok(())
    }
}

fn now_unix_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}
