use std::sync::atomic::{AtomicU64, Ordering};

/// WAL-local total order. Assigned once per WAL entry, strictly increasing,
/// never reused across restarts (recovered as `max(last_seq of all segments) + 1`).
///
/// Distinct from [`Version`] — see the crate root docs for why the two
/// counters are kept independent rather than unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    pub const ZERO: SequenceNumber = SequenceNumber(0);

    #[must_use]
    pub fn next(self) -> Self {
        SequenceNumber(self.0 + 1)
    }
}

impl From<u64> for SequenceNumber {
    fn from(v: u64) -> Self {
        SequenceNumber(v)
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// MVCC-local visibility counter, assigned at ingest. A retry of a failed
/// ingest may reuse a version (unlike `SequenceNumber`, which the WAL never
/// reuses); visibility merges key on `(entity_id, version)` with sequence as
/// the tiebreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Version(pub u64);

impl Version {
    pub const ZERO: Version = Version(0);
}

impl From<u64> for Version {
    fn from(v: u64) -> Self {
        Version(v)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-engine-instance monotonic counter. Deliberately not a process-global
/// static — an engine constructed twice in one process (as in tests) must
/// not observe the other instance's sequence space.
#[derive(Debug, Default)]
pub struct SequenceCounter(AtomicU64);

impl SequenceCounter {
    #[must_use]
    pub fn starting_at(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Atomically allocates the next sequence number.
    pub fn allocate(&self) -> SequenceNumber {
        SequenceNumber(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[must_use]
    pub fn current(&self) -> SequenceNumber {
        SequenceNumber(self.0.load(Ordering::SeqCst))
    }

    /// Advances the counter to at least `value`, used during WAL recovery
    /// when replay discovers a higher sequence than the counter's initial value.
    pub fn advance_to_at_least(&self, value: u64) {
        self.0.fetch_max(value, Ordering::SeqCst);
    }
}

/// Per-engine-instance monotonic MVCC version counter.
#[derive(Debug, Default)]
pub struct VersionCounter(AtomicU64);

impl VersionCounter {
    #[must_use]
    pub fn starting_at(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    pub fn allocate(&self) -> Version {
        Version(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[must_use]
    pub fn current(&self) -> Version {
        Version(self.0.load(Ordering::SeqCst))
    }
}
