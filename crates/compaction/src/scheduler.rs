use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use catalog::Catalog;
use tracing::{info, warn};

use crate::strategy::{CompactionStrategy, LevelView};

/// A `(table, level)` pair scored for this tick, ready to feed into a
/// selected strategy's `select`.
pub struct Candidate {
    pub table: String,
    pub level: u32,
    pub priority: f64,
}

/// Scores every `(table, level)` pair a strategy registry covers and
/// returns them ranked highest-priority first, L0 carrying the 2x
/// multiplier named in §4.6 regardless of which strategy scored it.
pub fn rank_candidates(
    catalog: &Catalog,
    tables: &[String],
    strategy: &dyn CompactionStrategy,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for table in tables {
        let files = match catalog.files(table) {
            Ok(f) => f,
            Err(_) => continue,
        };
        let max_level = files.iter().map(|f| f.level).max().unwrap_or(0);

        for level in 0..=max_level {
            let level_files: Vec<_> = files.iter().filter(|f| f.level == level).cloned().collect();
            if level_files.is_empty() {
                continue;
            }
            let view = LevelView { level, files: &level_files };
            let mut priority = strategy.priority(&view);
            if level == 0 {
                priority *= 2.0;
            }
            if priority > 0.0 {
                candidates.push(Candidate { table: table.clone(), level, priority });
            }
        }
    }

    candidates.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));
    candidates
}

/// Picks at most `max_concurrent` candidates for this tick, highest
/// priority first. The scheduler itself does not run compactions — it only
/// decides which `(table, level)` pairs get a run this tick, leaving
/// execution to the caller (the engine's background worker).
#[must_use]
pub fn pick_for_tick(mut candidates: Vec<Candidate>, max_concurrent: usize) -> Vec<Candidate> {
    candidates.truncate(max_concurrent);
    candidates
}

/// A file path retired by a compaction commit, waiting out the grace period
/// before the engine unlinks it from the block store. Grounded on the
/// manifest-era "delete old files after manifest.save()" step, generalized
/// into a bounded delay so an in-flight reader opened against the old
/// catalog state before the commit still finds the file on disk.
struct Pending {
    path: PathBuf,
    retired_at: Instant,
}

#[derive(Default)]
pub struct GraceQueue {
    pending: HashMap<PathBuf, Pending>,
}

impl GraceQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, paths: Vec<PathBuf>) {
        let now = Instant::now();
        for path in paths {
            self.pending.insert(path.clone(), Pending { path, retired_at: now });
        }
    }

    /// Deletes every pending path whose grace period has elapsed. Safe to
    /// call on an idle timer; does nothing when the queue is empty.
    pub fn sweep(&mut self, grace_period: Duration) {
        let now = Instant::now();
        let ready: Vec<PathBuf> = self
            .pending
            .values()
            .filter(|p| now.duration_since(p.retired_at) >= grace_period)
            .map(|p| p.path.clone())
            .collect();

        for path in ready {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "retired compaction input unlinked");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to unlink retired compaction input"),
            }
            self.pending.remove(&path);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
