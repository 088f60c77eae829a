use std::collections::BTreeMap;

/// A locator pointing at one record inside one file: which file, and the
/// byte offset of its data-section record. `length` is omitted — the
/// columnar format's records are self-delimiting (length-prefixed payload),
/// so a reader only ever needs the starting offset.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Locator {
    pub file_id: String,
    pub row_offset: u64,
}

/// Ordered mapping from a table's `RecordKey` bytes to the locator(s) that
/// hold a copy of that exact key. Multiple locators occur only transiently,
/// between a compaction's output-file registration and the retirement of
/// its inputs — the index is rebuilt to a single locator per key by the
/// next `rebuild_index` pass, but compaction's atomic swap updates this
/// structure directly rather than waiting on a rebuild.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PrimaryIndex {
    entries: BTreeMap<Vec<u8>, Vec<Locator>>,
}

impl PrimaryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key` lives in `file_id` at `row_offset`. Idempotent:
    /// inserting the same `(key, file_id)` pair twice keeps only the latest
    /// offset for that file.
    pub fn insert(&mut self, key: Vec<u8>, file_id: impl Into<String>, row_offset: u64) {
        let file_id = file_id.into();
        let locators = self.entries.entry(key).or_default();
        if let Some(existing) = locators.iter_mut().find(|l| l.file_id == file_id) {
            existing.row_offset = row_offset;
        } else {
            locators.push(Locator { file_id, row_offset });
        }
    }

    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[Locator]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Removes every locator pointing at `file_id`, used when a file is
    /// retired after compaction. Keys left with no remaining locator are
    /// dropped entirely.
    pub fn remove_file(&mut self, file_id: &str) {
        self.entries.retain(|_, locators| {
            locators.retain(|l| l.file_id != file_id);
            !locators.is_empty()
        });
    }

    /// Keys in `[start, end)`, ascending.
    pub fn range(&self, start: &[u8], end: &[u8]) -> impl Iterator<Item = (&[u8], &[Locator])> {
        self.entries.range(start.to_vec()..end.to_vec()).map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Every entry, ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[Locator])> {
        self.entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
