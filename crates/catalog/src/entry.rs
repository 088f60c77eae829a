use crate::file_record::FileRecord;
use crate::schema::TableSchema;

/// Everything the catalog tracks for one table: its schema, the currently
/// registered files, and the WAL sequence checkpointed by the last
/// successful flush — the number truncate uses to decide which segments
/// are safe to delete.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogEntry {
    pub schema: TableSchema,
    pub files: Vec<FileRecord>,
    pub checkpoint_sequence: u64,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(schema: TableSchema) -> Self {
        Self { schema, files: Vec::new(), checkpoint_sequence: 0 }
    }

    #[must_use]
    pub fn files_at_level(&self, level: u32) -> Vec<&FileRecord> {
        self.files.iter().filter(|f| f.level == level).collect()
    }
}
