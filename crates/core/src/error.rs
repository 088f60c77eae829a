use thiserror::Error;

/// The engine-wide error taxonomy. Every public operation returns
/// `EngineResult<T>`. Variants map 1:1 onto the propagation policy: retryable
/// classes (`Unavailable`, transient `CapacityExceeded`) are retried
/// internally with bounded backoff before ever reaching a caller;
/// `Corruption` is never silently retried; everything else surfaces with its
/// cause chain intact.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Schema or request validation failed; no state was changed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The table or record does not exist at the requested snapshot.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate table creation, or a write lost a version race.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Disk full, or memtable full with backpressure enabled.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// CRC mismatch, missing segment, or otherwise structurally invalid
    /// on-disk state. The affected table should be treated as tainted —
    /// writes blocked until an operator intervenes.
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// The caller's cancellation token fired before the operation completed.
    #[error("operation cancelled")]
    Cancelled,

    /// A storage backend (block store, catalog) is unreachable; safe to
    /// retry with backoff.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// An invariant was violated — a bug, not a caller mistake. Logged and
    /// failed rather than panicking, so the rest of the engine stays up.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wraps an I/O failure that doesn't obviously belong to one of the
    /// categories above (caller should usually match on `.source()`).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Unavailable(_) | EngineError::CapacityExceeded(_))
    }

    #[must_use]
    pub fn is_serious(&self) -> bool {
        matches!(self, EngineError::Corruption(_) | EngineError::Internal(_))
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        EngineError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        EngineError::Conflict(msg.into())
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        EngineError::Corruption(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        EngineError::Internal(msg.into())
    }
}

/// Result alias used throughout the workspace.
pub type EngineResult<T> = Result<T, EngineError>;
