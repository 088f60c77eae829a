//! Public record and query types for the orchestrator's ingest/query surface
//! (§6.1). Distinct from `riptide_core::VersionedRecord`, which is the
//! internal on-disk/in-memory representation — these are what a caller
//! hands in and gets back.

use std::collections::BTreeMap;

use riptide_core::{EntityId, SequenceNumber, Version};

/// One record as submitted to [`crate::Engine::ingest_record`] or
/// [`crate::Engine::ingest_batch`].
///
/// `payload` is returned byte-for-byte by a later read. `columns` is an
/// optional, separate typed view of the same write used only to maintain
/// secondary indexes and evaluate query filters (§4.4, §9 "dynamic record
/// payload") — the engine does not require `payload` to encode `columns` in
/// any particular way, and a record with no declared columns behaves exactly
/// like an opaque byte blob.
#[derive(Debug, Clone)]
pub struct Record {
    pub entity_id: EntityId,
    pub payload: Vec<u8>,
    pub columns: BTreeMap<String, ColumnValue>,
    pub delete: bool,
}

impl Record {
    #[must_use]
    pub fn insert(entity_id: impl Into<EntityId>, payload: impl Into<Vec<u8>>) -> Self {
        Self { entity_id: entity_id.into(), payload: payload.into(), columns: BTreeMap::new(), delete: false }
    }

    #[must_use]
    pub fn delete(entity_id: impl Into<EntityId>) -> Self {
        Self { entity_id: entity_id.into(), payload: Vec::new(), columns: BTreeMap::new(), delete: true }
    }

    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.columns.insert(name.into(), value);
        self
    }
}

/// A typed column value, validated at ingest against the table's declared
/// [`catalog::ScalarKind`] and (when the column carries a secondary index)
/// recorded there.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

impl ColumnValue {
    #[must_use]
    pub fn to_scalar(&self) -> catalog::ScalarValue {
        match self {
            ColumnValue::Int64(v) => catalog::ScalarValue::Int64(*v),
            ColumnValue::Float64(v) => catalog::ScalarValue::Float64(*v),
            ColumnValue::Bool(v) => catalog::ScalarValue::Bool(*v),
            ColumnValue::String(v) => catalog::ScalarValue::String(v.clone()),
            ColumnValue::Bytes(v) => catalog::ScalarValue::Bytes(v.clone()),
        }
    }
}

/// A point-in-time query filter: the entity must carry `value` for `column`.
/// Evaluated against the column value recorded at ingest time, not against
/// `payload`.
#[derive(Debug, Clone)]
pub struct QueryFilter {
    pub column: String,
    pub value: ColumnValue,
}

/// Arguments to [`crate::Engine::query`] (§6.1).
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub start_entity: Option<EntityId>,
    pub end_entity: Option<EntityId>,
    pub filters: Vec<QueryFilter>,
    pub projection: Option<Vec<String>>,
    pub limit: Option<usize>,
    pub snapshot: Option<Version>,
}

/// One record returned by [`crate::Engine::query`] or
/// [`crate::Engine::get_record`].
///
/// `columns` is the typed view decoded back out of the write that produced
/// this record, restricted to `projection` when the request set one. It is
/// not `Eq`-comparable against float columns, so this type only derives
/// `PartialEq`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub entity_id: EntityId,
    pub version: Version,
    pub sequence: SequenceNumber,
    pub payload: Vec<u8>,
    pub columns: BTreeMap<String, ColumnValue>,
}
