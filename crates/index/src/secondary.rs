use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Whether a `(table, column)` secondary index is backed by a hash map
/// (fast point lookup, no range scan) or an ordered map (supports range
/// scans over the column's values, at a higher per-insert cost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SecondaryIndexKind {
    Hash,
    Ordered,
}

/// Maps one column's values back to the set of primary keys (`RecordKey`
/// bytes) of every record that carried that value at ingest time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum SecondaryIndex {
    Hash(HashMap<Vec<u8>, HashSet<Vec<u8>>>),
    Ordered(BTreeMap<Vec<u8>, BTreeSet<Vec<u8>>>),
}

impl SecondaryIndex {
    #[must_use]
    pub fn new(kind: SecondaryIndexKind) -> Self {
        match kind {
            SecondaryIndexKind::Hash => SecondaryIndex::Hash(HashMap::new()),
            SecondaryIndexKind::Ordered => SecondaryIndex::Ordered(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> SecondaryIndexKind {
        match self {
            SecondaryIndex::Hash(_) => SecondaryIndexKind::Hash,
            SecondaryIndex::Ordered(_) => SecondaryIndexKind::Ordered,
        }
    }

    pub fn insert(&mut self, value: Vec<u8>, primary_key: Vec<u8>) {
        match self {
            SecondaryIndex::Hash(map) => {
                map.entry(value).or_default().insert(primary_key);
            }
            SecondaryIndex::Ordered(map) => {
                map.entry(value).or_default().insert(primary_key);
            }
        }
    }

    pub fn remove(&mut self, value: &[u8], primary_key: &[u8]) {
        match self {
            SecondaryIndex::Hash(map) => {
                if let Some(set) = map.get_mut(value) {
                    set.remove(primary_key);
                    if set.is_empty() {
                        map.remove(value);
                    }
                }
            }
            SecondaryIndex::Ordered(map) => {
                if let Some(set) = map.get_mut(value) {
                    set.remove(primary_key);
                    if set.is_empty() {
                        map.remove(value);
                    }
                }
            }
        }
    }

    /// Primary keys recorded against the exact `value`.
    #[must_use]
    pub fn lookup(&self, value: &[u8]) -> Vec<Vec<u8>> {
        match self {
            SecondaryIndex::Hash(map) => map.get(value).map(|s| s.iter().cloned().collect()).unwrap_or_default(),
            SecondaryIndex::Ordered(map) => map.get(value).map(|s| s.iter().cloned().collect()).unwrap_or_default(),
        }
    }

    /// Primary keys recorded against a value range `[start, end)`. Only
    /// meaningful for `Ordered` indexes; a `Hash` index returns an empty
    /// result since it cannot answer range queries.
    #[must_use]
    pub fn range(&self, start: &[u8], end: &[u8]) -> Vec<Vec<u8>> {
        match self {
            SecondaryIndex::Hash(_) => Vec::new(),
            SecondaryIndex::Ordered(map) => {
                map.range(start.to_vec()..end.to_vec()).flat_map(|(_, set)| set.iter().cloned()).collect()
            }
        }
    }
}
