use catalog::FileRecord;

/// The files registered at one `(table, level)` pair, as seen by a strategy.
/// A narrow read-only view — strategies never mutate the catalog directly,
/// they only name which files the scheduler should feed to the merger.
pub struct LevelView<'a> {
    pub level: u32,
    pub files: &'a [FileRecord],
}

impl<'a> LevelView<'a> {
    #[must_use]
    pub fn total_size_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

/// The narrow seam every compaction strategy implements (no inheritance
/// tree — a strategy is just "which files, how urgently"). `select` returns
/// the file ids of one compaction run's inputs; `priority` scores how badly
/// this level wants to run right now, used by the scheduler to rank
/// `(table, level)` pairs against each other.
pub trait CompactionStrategy: Send + Sync {
    fn select(&self, view: &LevelView) -> Vec<String>;
    fn priority(&self, view: &LevelView) -> f64;
}
