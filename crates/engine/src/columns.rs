//! Bridges the orchestrator's [`crate::record::ColumnValue`] ingest-time
//! values onto a table's declared schema (§4.4, §9 "dynamic record
//! payload"): validates a column's value matches its declared
//! [`catalog::ScalarKind`], and derives the secondary-index entries a write
//! needs to record.

use std::collections::BTreeMap;

use catalog::TableSchema;
use riptide_core::{EngineError, EngineResult};

use crate::record::ColumnValue;

/// Rejects a write whose declared columns disagree with the schema. Columns
/// not named in the schema pass through unchecked — the schema only
/// constrains the columns it explicitly declares.
pub fn validate_columns(schema: &TableSchema, columns: &BTreeMap<String, ColumnValue>) -> EngineResult<()> {
    for (name, value) in columns {
        if let Some(col) = schema.column(name) {
            let actual = value.to_scalar().kind();
            if actual != col.kind {
                return Err(EngineError::invalid_input(format!(
                    "column {name:?}: expected {:?}, got {:?}",
                    col.kind, actual
                )));
            }
        }
    }
    Ok(())
}

/// One secondary-index update a write must record: the column it belongs
/// to, which backing the schema declared, and the value encoded for that
/// backing.
pub struct SecondaryUpdate {
    pub column: String,
    pub kind: index::SecondaryIndexKind,
    pub value_bytes: Vec<u8>,
}

/// The secondary-index entries a record's columns contribute, limited to
/// columns the schema actually configured a `secondary_index` backing for.
#[must_use]
pub fn secondary_updates(schema: &TableSchema, columns: &BTreeMap<String, ColumnValue>) -> Vec<SecondaryUpdate> {
    let mut updates = Vec::new();
    for (name, value) in columns {
        let Some(col) = schema.column(name) else { continue };
        let Some(backing) = &col.secondary_index else { continue };
        let kind = match backing.as_str() {
            "ordered" => index::SecondaryIndexKind::Ordered,
            _ => index::SecondaryIndexKind::Hash,
        };
        updates.push(SecondaryUpdate { column: name.clone(), kind, value_bytes: value.to_scalar().to_index_bytes() });
    }
    updates
}
