use crate::version::Version;
use std::sync::Arc;

/// An opaque tenant identifier. Cheaply cloneable (`Arc<str>`) since the same
/// tenant id is copied into every key of every record the tenant writes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TenantId(Arc<str>);

impl TenantId {
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An opaque table identifier, scoped within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TableId(Arc<str>);

impl TableId {
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TableId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The caller-supplied identity of a record within a table. Opaque bytes —
/// the engine never interprets the contents beyond lexicographic ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct EntityId(pub Vec<u8>);

impl EntityId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for EntityId {
    fn from(b: &[u8]) -> Self {
        Self(b.to_vec())
    }
}

/// `tenant | table | entity_id | version_desc`, the lexicographic composite
/// key every memtable and columnar file is sorted by.
///
/// `version_desc` is `u64::MAX - version.0` so that within one entity, a
/// lexicographic ascending scan visits the *highest* version first — this is
/// what lets the MVCC merge step take "first record with version <= snapshot"
/// without a secondary sort pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    bytes: Vec<u8>,
    tenant_len: usize,
    table_len: usize,
    entity_len: usize,
}

impl RecordKey {
    pub fn new(tenant: &TenantId, table: &TableId, entity: &EntityId, version: Version) -> Self {
        let tenant_bytes = tenant.as_str().as_bytes();
        let table_bytes = table.as_str().as_bytes();
        let entity_bytes = &entity.0;

        let mut bytes = Vec::with_capacity(
            tenant_bytes.len() + table_bytes.len() + entity_bytes.len() + 1 + 8,
        );
        bytes.extend_from_slice(tenant_bytes);
        bytes.push(0); // separator: tenant/table names cannot contain NUL
        bytes.extend_from_slice(table_bytes);
        bytes.push(0);
        bytes.extend_from_slice(entity_bytes);
        bytes.push(0);
        let version_desc = u64::MAX - version.0;
        bytes.extend_from_slice(&version_desc.to_be_bytes());

        Self {
            tenant_len: tenant_bytes.len(),
            table_len: table_bytes.len(),
            entity_len: entity_bytes.len(),
            bytes,
        }
    }

    /// Builds a key that compares as the smallest possible key for a given
    /// `(tenant, table, entity)`, useful as a scan lower bound that includes
    /// every version of that entity.
    pub fn entity_lower_bound(tenant: &TenantId, table: &TableId, entity: &EntityId) -> Self {
        Self::new(tenant, table, entity, Version(u64::MAX))
    }

    /// Reconstructs a `RecordKey` from its raw on-disk encoding (as stored
    /// in a WAL payload or a columnar file's key field). `tenant_len` and
    /// `table_len` are recovered by splitting on the first two NUL
    /// separators, which tenant/table names cannot themselves contain.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let tenant_len = bytes.iter().position(|&b| b == 0).unwrap_or(0);
        let after_tenant = tenant_len + 1;
        let table_len = bytes[after_tenant..].iter().position(|&b| b == 0).unwrap_or(0);
        let entity_start = after_tenant + table_len + 1;
        let entity_len = bytes.len().saturating_sub(8).saturating_sub(entity_start);
        Self { bytes, tenant_len, table_len, entity_len }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        let start = self.tenant_len + 1 + self.table_len + 1;
        let end = self.bytes.len() - 8;
        EntityId(self.bytes[start..end].to_vec())
    }

    #[must_use]
    pub fn version(&self) -> Version {
        let len = self.bytes.len();
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.bytes[len - 8..]);
        let version_desc = u64::from_be_bytes(buf);
        Version(u64::MAX - version_desc)
    }

    /// True if `other` addresses the same `(tenant, table, entity)`,
    /// ignoring the version suffix.
    #[must_use]
    pub fn same_entity(&self, other: &RecordKey) -> bool {
        let a = &self.bytes[..self.bytes.len() - 8];
        let b = &other.bytes[..other.bytes.len() - 8];
        a == b
    }

    /// The tenant name this key was encoded with. Used by WAL replay to
    /// route a decoded entry back to its owning table without threading a
    /// separate tenant/table pair through the payload.
    #[must_use]
    pub fn tenant_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.tenant_len]).unwrap_or("")
    }

    /// The table name this key was encoded with. See [`tenant_str`](Self::tenant_str).
    #[must_use]
    pub fn table_str(&self) -> &str {
        let start = self.tenant_len + 1;
        std::str::from_utf8(&self.bytes[start..start + self.table_len]).unwrap_or("")
    }
}

impl PartialOrd for RecordKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}
