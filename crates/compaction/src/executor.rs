use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use catalog::{Catalog, FileRecord};
use sstable::{SSTableReader, SSTableWriter};
use tracing::{info, instrument};

use crate::error::CompactionError;
use crate::merge::merge_inputs;

/// One compaction run's instructions, as produced by a [`crate::strategy::CompactionStrategy`]
/// and a naming decision from the caller (the engine owns file-id allocation
/// so ids stay unique across tables without this crate needing a counter).
pub struct CompactionPlan {
    pub table: String,
    pub input_file_ids: Vec<String>,
    pub output_level: u32,
    pub output_file_id: String,
}

fn now_unix_nanos() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

/// Runs one compaction plan against a table's registered files: opens the
/// input readers, merges and GCs tombstones, writes the output file (if
/// anything survived), and commits the catalog swap atomically. Deletion of
/// the now-retired input files is left to the caller: §4.6 requires a
/// bounded grace period before unlinking, which this function does not
/// enforce itself — it returns the input paths for the caller's grace queue.
#[instrument(skip(catalog, data_dir), fields(table = %plan.table, inputs = plan.input_file_ids.len()))]
pub fn run_compaction(
    catalog: &Catalog,
    data_dir: &Path,
    plan: &CompactionPlan,
) -> Result<Vec<PathBuf>, CompactionError> {
    let all_files = catalog.files(&plan.table)?;

    let mut inputs = Vec::with_capacity(plan.input_file_ids.len());
    for file_id in &plan.input_file_ids {
        let record = all_files
            .iter()
            .find(|f| &f.file_id == file_id)
            .cloned()
            .ok_or_else(|| CompactionError::UnknownInput(file_id.clone()))?;
        inputs.push(record);
    }

    let other_files: Vec<FileRecord> =
        all_files.into_iter().filter(|f| !plan.input_file_ids.contains(&f.file_id)).collect();

    let input_paths: Vec<PathBuf> = inputs.iter().map(|f| data_dir.join(&f.file_id)).collect();
    let readers: Vec<SSTableReader> =
        input_paths.iter().map(SSTableReader::open).collect::<anyhow::Result<_>>()?;

    let merged = merge_inputs(&readers, plan.output_level, &other_files)?;

    if merged.records.is_empty() {
        info!(tombstones_dropped = merged.tombstones_dropped, "compaction produced no surviving records");
        catalog.commit(&plan.table, Vec::new(), &plan.input_file_ids, None)?;
        drop(readers);
        return Ok(input_paths);
    }

    let min_key = merged.records.first().map(|r| r.key.as_bytes().to_vec()).unwrap_or_default();
    let max_key = merged.records.last().map(|r| r.key.as_bytes().to_vec()).unwrap_or_default();
    let min_seq = merged.records.iter().map(|r| r.sequence.0).min().unwrap_or(0);
    let max_seq = merged.records.iter().map(|r| r.sequence.0).max().unwrap_or(0);
    let row_count = merged.records.len();
    let created_at = now_unix_nanos();

    let output_path = data_dir.join(&plan.output_file_id);
    let count = merged.records.len();
    SSTableWriter::write_from_records(&output_path, count, merged.records.into_iter(), plan.output_level)?;

    let size_bytes = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);

    let output_record = FileRecord {
        file_id: plan.output_file_id.clone(),
        min_key,
        max_key,
        row_count,
        min_seq,
        max_seq,
        level: plan.output_level,
        size_bytes,
        created_at_unix_nanos: created_at,
        last_access_unix_nanos: created_at,
    };

    drop(readers);
    catalog.commit(&plan.table, vec![output_record], &plan.input_file_ids, None)?;

    info!(
        output_file = %plan.output_file_id,
        tombstones_dropped = merged.tombstones_dropped,
        "compaction committed"
    );
    Ok(input_paths)
}
