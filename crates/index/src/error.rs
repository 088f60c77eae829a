use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("block store error: {0}")]
    BlockStore(#[from] blockstore::BlockStoreError),

    #[error("serialization error: {0}")]
    Serde(#[from] Box<bincode::ErrorKind>),

    #[error("index for table {0:?} not loaded")]
    NotLoaded(String),

    #[error("validation failure: {0}")]
    Validation(String),
}
