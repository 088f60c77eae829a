/// `mvcc.*` config section.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MvccConfig {
    /// `mvcc.retain_versions` — GC horizon: how many superseded versions of
    /// an entity compaction keeps around before they become eligible for
    /// collection, independent of the tombstone-at-deepest-level rule.
    pub retain_versions: u32,
}

impl Default for MvccConfig {
    fn default() -> Self {
        Self { retain_versions: 1 }
    }
}
