use thiserror::Error;

/// Errors a [`crate::BlockStore`] implementor can return.
#[derive(Debug, Error)]
pub enum BlockStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("block not found: {0}")]
    NotFound(String),

    #[error("remote block store error: {0}")]
    Remote(String),
}
