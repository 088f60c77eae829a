/// `storage.backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    Local,
    S3,
}

impl Default for StorageBackendKind {
    fn default() -> Self {
        StorageBackendKind::Local
    }
}

/// `storage.*` config section.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `storage.data_dir` — SSTable, catalog, and index root. Used directly
    /// by the `local` backend; used as a key prefix when `backend = s3`.
    pub data_dir: String,
    /// `storage.backend`.
    pub backend: StorageBackendKind,
    /// S3 bucket name, required when `backend = s3`.
    pub s3_bucket: Option<String>,
    /// S3 region, required when `backend = s3`.
    pub s3_region: Option<String>,
    /// Optional S3-compatible endpoint override (e.g. for MinIO).
    pub s3_endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            backend: StorageBackendKind::default(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
        }
    }
}
