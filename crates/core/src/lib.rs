//! # riptide-core
//!
//! Shared primitives for the RiptideKV storage engine: tenant/table/record
//! identity, the sequence/version counters, the error taxonomy, and the
//! cooperative cancellation signal. Every other crate in the workspace
//! depends on this one; it depends on nothing engine-specific.

mod cancel;
mod error;
mod ids;
mod record;
mod version;

pub use cancel::CancellationToken;
pub use error::{EngineError, EngineResult};
pub use ids::{EntityId, RecordKey, TableId, TenantId};
pub use record::{Operation, VersionedRecord};
pub use version::{SequenceCounter, SequenceNumber, Version, VersionCounter};

#[cfg(test)]
mod tests;
