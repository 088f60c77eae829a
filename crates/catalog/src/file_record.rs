/// A registered columnar file, as tracked by the catalog. Mirrors the
/// `File` entity from §3.1, plus `last_access` for the leveled-compaction
/// strategy's least-recently-accessed selection.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub min_key: Vec<u8>,
    pub max_key: Vec<u8>,
    pub row_count: usize,
    pub min_seq: u64,
    pub max_seq: u64,
    pub level: u32,
    pub size_bytes: u64,
    pub created_at_unix_nanos: u64,
    pub last_access_unix_nanos: u64,
}

impl FileRecord {
    #[must_use]
    pub fn overlaps(&self, other: &FileRecord) -> bool {
        self.min_key <= other.max_key && other.min_key <= self.max_key
    }
}
