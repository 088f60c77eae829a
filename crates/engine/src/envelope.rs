//! The on-disk encoding of a write's `(payload, columns)` pair, stored
//! verbatim as a [`riptide_core::VersionedRecord`]'s opaque `payload` bytes
//! (§9 "dynamic record payload").
//!
//! The WAL, memtable, and columnar file formats only ever see one opaque
//! byte blob per record — none of them know a column exists. Bundling the
//! typed columns into that same blob, rather than threading them through a
//! side channel, is what lets a crash recover secondary-index state from
//! nothing but the WAL: whatever a reader needs to rebuild an index entry
//! rides along in the same bytes that are already durable before the
//! ingest call returns.
//!
//! Wire format: `payload_len(u32 LE) | payload | column_count(u16 LE) |
//! column*`, where each column is `name_len(u16 LE) | name |
//! kind_tag(u8) | value`. `value` is fixed-width for `Int64`/`Float64`/
//! `Bool` and length-prefixed (`u32 LE`) for `String`/`Bytes`.

use std::collections::BTreeMap;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use riptide_core::{EngineError, EngineResult};

use crate::record::ColumnValue;

const KIND_INT64: u8 = 0;
const KIND_FLOAT64: u8 = 1;
const KIND_BOOL: u8 = 2;
const KIND_STRING: u8 = 3;
const KIND_BYTES: u8 = 4;

/// Encodes `payload` and `columns` into the bytes a [`riptide_core::VersionedRecord`]
/// carries as its payload. Writing to an in-memory `Vec<u8>` cannot fail, so
/// this never returns a `Result`.
#[must_use]
pub fn encode(payload: &[u8], columns: &BTreeMap<String, ColumnValue>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(payload.len() + 16 * columns.len() + 6);
    buf.write_u32::<LittleEndian>(payload.len() as u32).expect("vec write cannot fail");
    buf.extend_from_slice(payload);
    buf.write_u16::<LittleEndian>(columns.len() as u16).expect("vec write cannot fail");

    for (name, value) in columns {
        let name_bytes = name.as_bytes();
        buf.write_u16::<LittleEndian>(name_bytes.len() as u16).expect("vec write cannot fail");
        buf.extend_from_slice(name_bytes);
        match value {
            ColumnValue::Int64(v) => {
                buf.write_u8(KIND_INT64).unwrap();
                buf.write_i64::<LittleEndian>(*v).unwrap();
            }
            ColumnValue::Float64(v) => {
                buf.write_u8(KIND_FLOAT64).unwrap();
                buf.write_f64::<LittleEndian>(*v).unwrap();
            }
            ColumnValue::Bool(v) => {
                buf.write_u8(KIND_BOOL).unwrap();
                buf.write_u8(if *v { 1 } else { 0 }).unwrap();
            }
            ColumnValue::String(v) => {
                buf.write_u8(KIND_STRING).unwrap();
                buf.write_u32::<LittleEndian>(v.len() as u32).unwrap();
                buf.extend_from_slice(v.as_bytes());
            }
            ColumnValue::Bytes(v) => {
                buf.write_u8(KIND_BYTES).unwrap();
                buf.write_u32::<LittleEndian>(v.len() as u32).unwrap();
                buf.extend_from_slice(v);
            }
        }
    }
    buf
}

/// Decodes the bytes [`encode`] produced back into the original payload and
/// columns. Untrusted input (a corrupt file, a torn WAL tail that still
/// passed its frame CRC) is rejected as [`EngineError::Corruption`] rather
/// than panicking.
pub fn decode(bytes: &[u8]) -> EngineResult<(Vec<u8>, BTreeMap<String, ColumnValue>)> {
    let mut cursor = bytes;
    let payload_len = cursor.read_u32::<LittleEndian>().map_err(too_short)? as usize;
    if cursor.len() < payload_len {
        return Err(EngineError::corruption("envelope payload truncated"));
    }
    let payload = cursor[..payload_len].to_vec();
    cursor = &cursor[payload_len..];

    let column_count = cursor.read_u16::<LittleEndian>().map_err(too_short)? as usize;
    let mut columns = BTreeMap::new();
    for _ in 0..column_count {
        let name_len = cursor.read_u16::<LittleEndian>().map_err(too_short)? as usize;
        if cursor.len() < name_len {
            return Err(EngineError::corruption("envelope column name truncated"));
        }
        let name = std::str::from_utf8(&cursor[..name_len])
            .map_err(|_| EngineError::corruption("envelope column name is not valid utf-8"))?
            .to_string();
        cursor = &cursor[name_len..];

        let kind_tag = cursor.read_u8().map_err(too_short)?;
        let value = match kind_tag {
            KIND_INT64 => ColumnValue::Int64(cursor.read_i64::<LittleEndian>().map_err(too_short)?),
            KIND_FLOAT64 => ColumnValue::Float64(cursor.read_f64::<LittleEndian>().map_err(too_short)?),
            KIND_BOOL => ColumnValue::Bool(cursor.read_u8().map_err(too_short)? != 0),
            KIND_STRING => {
                let len = cursor.read_u32::<LittleEndian>().map_err(too_short)? as usize;
                if cursor.len() < len {
                    return Err(EngineError::corruption("envelope string value truncated"));
                }
                let s = std::str::from_utf8(&cursor[..len])
                    .map_err(|_| EngineError::corruption("envelope string value is not valid utf-8"))?
                    .to_string();
                cursor = &cursor[len..];
                ColumnValue::String(s)
            }
            KIND_BYTES => {
                let len = cursor.read_u32::<LittleEndian>().map_err(too_short)? as usize;
                if cursor.len() < len {
                    return Err(EngineError::corruption("envelope bytes value truncated"));
                }
                let b = cursor[..len].to_vec();
                cursor = &cursor[len..];
                ColumnValue::Bytes(b)
            }
            other => return Err(EngineError::corruption(format!("unknown envelope column kind tag {other}"))),
        };
        columns.insert(name, value);
    }

    Ok((payload, columns))
}

fn too_short(_: std::io::Error) -> EngineError {
    EngineError::corruption("envelope bytes truncated")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_empty_columns() {
        let encoded = encode(b"hello", &BTreeMap::new());
        let (payload, columns) = decode(&encoded).unwrap();
        assert_eq!(payload, b"hello");
        assert!(columns.is_empty());
    }

    #[test]
    fn round_trips_every_scalar_kind() {
        let mut columns = BTreeMap::new();
        columns.insert("id".to_string(), ColumnValue::Int64(-7));
        columns.insert("score".to_string(), ColumnValue::Float64(3.5));
        columns.insert("active".to_string(), ColumnValue::Bool(true));
        columns.insert("name".to_string(), ColumnValue::String("alice".to_string()));
        columns.insert("blob".to_string(), ColumnValue::Bytes(vec![1, 2, 3]));

        let encoded = encode(b"payload-bytes", &columns);
        let (payload, decoded) = decode(&encoded).unwrap();
        assert_eq!(payload, b"payload-bytes");
        assert_eq!(decoded, columns);
    }

    #[test]
    fn rejects_truncated_bytes() {
        let encoded = encode(b"x", &BTreeMap::new());
        let truncated = &encoded[..encoded.len() - 1];
        assert!(decode(truncated).is_err());
    }
}
