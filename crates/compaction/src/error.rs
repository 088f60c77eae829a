use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompactionError {
    #[error("catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("file i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sstable error: {0}")]
    SSTable(#[from] anyhow::Error),

    #[error("input file not registered in catalog: {0}")]
    UnknownInput(String),
}
