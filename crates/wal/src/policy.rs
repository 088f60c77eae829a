use std::time::Duration;

/// Governs when an append becomes durable.
///
/// - `Immediate` — `fsync` after every append; the append call blocks until
///   the record is on disk.
/// - `Batch` — appends return as soon as they're in the OS buffer; a
///   background coalescer fsyncs once `max_batch` appends have accumulated
///   or `max_delay` has elapsed, whichever comes first. Callers that need to
///   know a specific append is durable should use `WalWriter::sync_to_disk`.
/// - `Periodic` — a background timer fsyncs every `interval` regardless of
///   append volume; appends never block on durability. Accepts a bounded
///   data-loss window on crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    Immediate,
    Batch { max_batch: usize, max_delay: Duration },
    Periodic { interval: Duration },
}

impl SyncPolicy {
    #[must_use]
    pub fn blocks_on_append(self) -> bool {
        matches!(self, SyncPolicy::Immediate)
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        SyncPolicy::Batch {
            max_batch: 128,
            max_delay: Duration::from_millis(5),
        }
    }
}
