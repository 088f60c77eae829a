use crate::ids::RecordKey;
use crate::version::{SequenceNumber, Version};

/// The kind of mutation a WAL entry or memtable write represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Checkpoint,
}

impl Operation {
    #[must_use]
    pub fn as_wire_tag(self) -> u8 {
        match self {
            Operation::Insert => 1,
            Operation::Update => 2,
            Operation::Delete => 3,
            Operation::Checkpoint => 4,
        }
    }

    pub fn from_wire_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Operation::Insert),
            2 => Some(Operation::Update),
            3 => Some(Operation::Delete),
            4 => Some(Operation::Checkpoint),
            _ => None,
        }
    }
}

/// A single versioned record as it lives in a memtable or columnar file.
///
/// `tombstone` records a logical delete: the payload is empty and the record
/// exists only to shadow older versions of the same entity until compaction
/// reaches the deepest level and can drop it for good (Invariant 8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRecord {
    pub key: RecordKey,
    pub version: Version,
    pub sequence: SequenceNumber,
    pub timestamp_unix_nanos: u64,
    pub payload: Vec<u8>,
    pub tombstone: bool,
}

impl VersionedRecord {
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.tombstone
    }

    /// The deterministic size estimator used only for flush-threshold
    /// accounting (§4.2) — key bytes plus payload bytes plus a fixed
    /// per-record overhead for the scalar fields that aren't part of either.
    #[must_use]
    pub fn estimated_size(&self) -> usize {
        const FIXED_OVERHEAD: usize = 8 /* version */ + 8 /* sequence */ + 8 /* timestamp */ + 1 /* tombstone */;
        self.key.as_bytes().len() + self.payload.len() + FIXED_OVERHEAD
    }
}
