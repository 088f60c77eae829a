use std::time::Duration;

/// `wal.sync_policy` — see §5.3 / §6.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPolicyKind {
    Immediate,
    Batch,
    Periodic,
}

impl Default for SyncPolicyKind {
    fn default() -> Self {
        SyncPolicyKind::Batch
    }
}

/// `wal.*` config section.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WalConfig {
    /// `wal.dir` — segment directory.
    pub dir: String,
    /// `wal.segment_size` — rotate threshold in bytes.
    pub segment_size: u64,
    /// `wal.sync_policy`.
    pub sync_policy: SyncPolicyKind,
    /// `wal.sync_interval` — periodic fsync cadence, used only when
    /// `sync_policy = periodic`.
    #[serde(with = "duration_millis")]
    pub sync_interval: Duration,
    /// Appends per batch before a group-commit fsync fires, used only when
    /// `sync_policy = batch`.
    pub batch_max_size: usize,
    /// Max delay before a group-commit fsync fires even if `batch_max_size`
    /// hasn't been reached, used only when `sync_policy = batch`.
    #[serde(with = "duration_millis")]
    pub batch_max_delay: Duration,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            dir: "data/wal".to_string(),
            segment_size: 64 * 1024 * 1024,
            sync_policy: SyncPolicyKind::default(),
            sync_interval: Duration::from_millis(200),
            batch_max_size: 128,
            batch_max_delay: Duration::from_millis(5),
        }
    }
}

use crate::duration_millis;
