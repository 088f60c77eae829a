use riptide_core::{Version, VersionCounter};

/// Owns the per-engine-instance MVCC version counter and answers the two
/// visibility questions every ingest/read needs: "what version does this
/// write get" and "what's the latest version a new reader should see."
///
/// Deliberately not a process-global — an `Engine` constructed twice in one
/// process (as in tests) gets two independent `MvccResolver`s, each with
/// its own version space, per the Open Question resolution in `core`.
#[derive(Debug, Default)]
pub struct MvccResolver {
    versions: VersionCounter,
}

impl MvccResolver {
    #[must_use]
    pub fn new() -> Self {
        Self { versions: VersionCounter::default() }
    }

    /// Resumes a resolver after recovery, seeding the counter so the next
    /// `new_version` call picks up strictly after the highest version seen
    /// in replayed WAL entries or loaded files.
    #[must_use]
    pub fn resume_at(last_version: u64) -> Self {
        Self { versions: VersionCounter::starting_at(last_version) }
    }

    /// Allocates the version a new ingest will be stamped with.
    pub fn new_version(&self) -> Version {
        self.versions.allocate()
    }

    /// Captures the latest committed version a new reader's snapshot should
    /// pin to — every record with `version <= snapshot()` is stable and
    /// visible for the lifetime of that reader's operation.
    #[must_use]
    pub fn snapshot(&self) -> Version {
        self.versions.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_monotonic_and_independent_per_instance() {
        let a = MvccResolver::new();
        let b = MvccResolver::new();
        assert_eq!(a.new_version(), Version(1));
        assert_eq!(a.new_version(), Version(2));
        assert_eq!(b.new_version(), Version(1));
    }

    #[test]
    fn snapshot_reflects_latest_allocated_version() {
        let resolver = MvccResolver::new();
        resolver.new_version();
        resolver.new_version();
        assert_eq!(resolver.snapshot(), Version(2));
    }
}
