//! The WAL payload framing the orchestrator puts around a [`riptide_core::RecordKey`]
//! and its (already envelope-encoded) value, independent of the WAL crate's
//! own record framing (length prefix, CRC32C) which wraps this again.
//!
//! Format: `key_len(u32 LE) | key_bytes | value_bytes`.

use riptide_core::{EngineError, EngineResult, RecordKey};

pub fn encode(key: &RecordKey, value: &[u8]) -> Vec<u8> {
    let key_bytes = key.as_bytes();
    let mut buf = Vec::with_capacity(4 + key_bytes.len() + value.len());
    buf.extend_from_slice(&(key_bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(key_bytes);
    buf.extend_from_slice(value);
    buf
}

pub fn decode(bytes: &[u8]) -> EngineResult<(RecordKey, Vec<u8>)> {
    if bytes.len() < 4 {
        return Err(EngineError::corruption("wal payload shorter than its length prefix"));
    }
    let key_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if bytes.len() < 4 + key_len {
        return Err(EngineError::corruption("wal payload key truncated"));
    }
    let key_bytes = bytes[4..4 + key_len].to_vec();
    let value = bytes[4 + key_len..].to_vec();
    Ok((RecordKey::from_bytes(key_bytes), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use riptide_core::{EntityId, TableId, TenantId, Version};

    #[test]
    fn round_trips_key_and_value() {
        let tenant = TenantId::new("acme");
        let table = TableId::new("orders");
        let key = RecordKey::new(&tenant, &table, &EntityId::from("e1"), Version(3));
        let encoded = encode(&key, b"hello");
        let (decoded_key, decoded_value) = decode(&encoded).unwrap();
        assert_eq!(decoded_key, key);
        assert_eq!(decoded_value, b"hello");
    }
}
