use std::time::Duration;

use crate::strategy::{CompactionStrategy, LevelView};

/// Groups files by the creation-time window they fall in and compacts a
/// window once enough of its files have aged past `compaction_delay` — the
/// workload this suits is time-series data, where files from the same
/// window are read together and rarely touch files from other windows.
pub struct TimeWindow {
    pub window: Duration,
    pub compaction_delay: Duration,
    now_unix_nanos: fn() -> u64,
}

impl TimeWindow {
    #[must_use]
    pub fn new(window: Duration, compaction_delay: Duration) -> Self {
        Self { window, compaction_delay, now_unix_nanos: default_now }
    }

    /// Test seam: build with an injected clock instead of the wall clock.
    #[must_use]
    pub fn with_clock(window: Duration, compaction_delay: Duration, now_unix_nanos: fn() -> u64) -> Self {
        Self { window, compaction_delay, now_unix_nanos }
    }

    fn window_of(&self, created_at_unix_nanos: u64) -> u64 {
        let window_nanos = self.window.as_nanos().max(1) as u64;
        created_at_unix_nanos / window_nanos
    }

    fn aged_count(&self, view: &LevelView) -> usize {
        let now = (self.now_unix_nanos)();
        let delay_nanos = self.compaction_delay.as_nanos() as u64;
        view.files.iter().filter(|f| now.saturating_sub(f.created_at_unix_nanos) >= delay_nanos).count()
    }
}

fn default_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

impl CompactionStrategy for TimeWindow {
    fn select(&self, view: &LevelView) -> Vec<String> {
        let now = (self.now_unix_nanos)();
        let delay_nanos = self.compaction_delay.as_nanos() as u64;

        let mut windows: std::collections::BTreeMap<u64, Vec<&catalog::FileRecord>> = std::collections::BTreeMap::new();
        for file in view.files {
            if now.saturating_sub(file.created_at_unix_nanos) >= delay_nanos {
                windows.entry(self.window_of(file.created_at_unix_nanos)).or_default().push(file);
            }
        }

        windows
            .into_values()
            .find(|files| files.len() >= 2)
            .map(|files| files.into_iter().map(|f| f.file_id.clone()).collect())
            .unwrap_or_default()
    }

    fn priority(&self, view: &LevelView) -> f64 {
        self.aged_count(view) as f64
    }
}
