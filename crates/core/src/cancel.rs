use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::EngineError;

/// A cooperative cancellation signal shared between a caller and the engine
/// operation it issued. Checked at the boundaries named in the concurrency
/// model: before a WAL write commits, before a memtable mutation applies, at
/// each scan record boundary, and at each background-worker tick.
///
/// An in-flight fsync cannot itself be interrupted — by the time a check
/// would fire, the record is already durable, so cancellation there still
/// returns `Cancelled` to the caller even though the write survives and will
/// be replayed on recovery.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Convenience checkpoint: returns `Err(EngineError::Cancelled)` if the
    /// token has fired, `Ok(())` otherwise.
    pub fn check(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
