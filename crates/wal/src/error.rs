use std::io;
use thiserror::Error;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record failed CRC validation, contained an unknown op code, or a
    /// segment header failed to parse.
    #[error("corrupt wal: {0}")]
    Corrupt(String),

    /// Disk is full; existing segments are left uncorrupted.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
}
