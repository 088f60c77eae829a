use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("block store error: {0}")]
    BlockStore(#[from] blockstore::BlockStoreError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("table already exists: {0}")]
    TableExists(String),
}
