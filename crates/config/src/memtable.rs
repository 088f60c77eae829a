use std::time::Duration;

/// `memtable.*` config section.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MemtableConfig {
    /// `memtable.flush_size` — byte-size threshold that seals and flushes
    /// the active memtable.
    pub flush_size: usize,
    /// `memtable.flush_interval` — age threshold that seals and flushes the
    /// active memtable even if it hasn't hit `flush_size`.
    #[serde(with = "crate::duration_millis")]
    pub flush_interval: Duration,
    /// `memtable.max_immutable` — backpressure threshold: once this many
    /// frozen memtables are waiting on the flush worker, new writes block
    /// (or fail fast, see `backpressure_blocks`).
    pub max_immutable: usize,
    /// If `true`, writers block when `max_immutable` is exceeded. If
    /// `false`, writes fail fast with `capacity_exceeded` instead.
    pub backpressure_blocks: bool,
}

impl Default for MemtableConfig {
    fn default() -> Self {
        Self {
            flush_size: 64 * 1024 * 1024,
            flush_interval: Duration::from_secs(300),
            max_immutable: 4,
            backpressure_blocks: true,
        }
    }
}
