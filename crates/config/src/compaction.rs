use std::time::Duration;

/// `compaction.strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactionStrategyKind {
    SizeTiered,
    Leveled,
    TimeWindow,
    Adaptive,
}

impl Default for CompactionStrategyKind {
    fn default() -> Self {
        CompactionStrategyKind::SizeTiered
    }
}

/// `compaction.*` config section.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompactionConfig {
    pub strategy: CompactionStrategyKind,
    /// `compaction.interval` — how often the scheduler re-evaluates
    /// `(table, level)` priorities.
    #[serde(with = "crate::duration_millis")]
    pub interval: Duration,
    /// `compaction.parallelism` — max concurrently running compactions.
    pub parallelism: usize,
    /// size-tiered: minimum similar-size file count that triggers a run.
    pub min_sstable_count: usize,
    /// size-tiered: maximum files selected into one run.
    pub max_sstable_count: usize,
    /// time-window: window width.
    #[serde(with = "crate::duration_millis")]
    pub window_size: Duration,
    /// time-window: minimum age before a file counts as "aged".
    #[serde(with = "crate::duration_millis")]
    pub compaction_delay: Duration,
    /// adaptive: how often the strategy re-selects among the other three.
    #[serde(with = "crate::duration_millis")]
    pub switch_interval: Duration,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            strategy: CompactionStrategyKind::default(),
            interval: Duration::from_secs(30),
            parallelism: 2,
            min_sstable_count: 4,
            max_sstable_count: 32,
            window_size: Duration::from_secs(3600),
            compaction_delay: Duration::from_secs(3600),
            switch_interval: Duration::from_secs(3600),
        }
    }
}
