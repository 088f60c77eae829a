/// The scalar kinds a record's typed fields can carry, per the "dynamic
/// record payload" design note: the source treats records as untyped maps;
/// this models that as a tagged variant over primitive scalar kinds plus
/// opaque bytes, so schema-driven validation at ingest can convert a
/// generic carrier into a typed value before the WAL append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Int64,
    Float64,
    Bool,
    String,
    Bytes,
}

/// A decoded scalar value, tagged with the [`ScalarKind`] it was validated
/// against. Produced at ingest from the generic payload carrier (see the
/// `columns` module docs in the `engine` crate) before a secondary index
/// entry is recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

impl ScalarValue {
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Int64(_) => ScalarKind::Int64,
            ScalarValue::Float64(_) => ScalarKind::Float64,
            ScalarValue::Bool(_) => ScalarKind::Bool,
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Bytes(_) => ScalarKind::Bytes,
        }
    }

    /// A byte encoding that preserves the value's natural ordering, so an
    /// `Ordered` secondary index range-scan over the encoded bytes matches
    /// a range scan over the original typed values. Integers and floats are
    /// bias-shifted so two's-complement/IEEE-754 negative values still sort
    /// before positive ones under plain byte comparison.
    #[must_use]
    pub fn to_index_bytes(&self) -> Vec<u8> {
        match self {
            ScalarValue::Int64(v) => (*v as u64 ^ (1 << 63)).to_be_bytes().to_vec(),
            ScalarValue::Float64(v) => {
                let bits = v.to_bits();
                let flipped = if *v < 0.0 { !bits } else { bits ^ (1 << 63) };
                flipped.to_be_bytes().to_vec()
            }
            ScalarValue::Bool(v) => vec![if *v { 1 } else { 0 }],
            ScalarValue::String(v) => v.as_bytes().to_vec(),
            ScalarValue::Bytes(v) => v.clone(),
        }
    }
}

/// One column of a table's schema.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ScalarKind,
    /// If set, a secondary index is maintained for this column (§4.4) using
    /// the given backing (`index::SecondaryIndexKind`, kept as a plain
    /// string here to avoid a catalog -> index dependency).
    pub secondary_index: Option<String>,
}

/// A table's schema, as supplied to `create_table`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TableSchema {
    pub tenant: String,
    pub table: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    #[must_use]
    pub fn new(tenant: impl Into<String>, table: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self { tenant: tenant.into(), table: table.into(), columns }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}
