use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use riptide_core::Operation;

use crate::error::WalError;

/// 64 MiB safety cap on a single record's payload, mirroring the guard the
/// teacher's reader used against absurd `record_len` values on a corrupt file.
pub const MAX_RECORD_SIZE: u32 = 64 * 1024 * 1024;

/// One encoded WAL record, ready to append.
///
/// Layout: `len(4,LE) | sequence(8,LE) | timestamp_unix_nanos(8,LE) | op(1) |
/// flags(1) | crc32c(4) | payload(len-22)`. `len` covers everything from
/// `sequence` through `payload` but not itself. `crc32c` covers `sequence`
/// through `payload`, even though it is framed ahead of `payload` on disk.
pub struct WalFrame;

const HEADER_LEN: usize = 8 + 8 + 1 + 1;

impl WalFrame {
    /// Encodes a record into `buf`, appending to whatever is already there.
    pub fn encode(
        buf: &mut Vec<u8>,
        sequence: u64,
        timestamp_unix_nanos: u64,
        operation: Operation,
        payload: &[u8],
    ) -> Result<(), WalError> {
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.write_u64::<LittleEndian>(sequence).expect("vec write cannot fail");
        header.write_u64::<LittleEndian>(timestamp_unix_nanos).expect("vec write cannot fail");
        header.write_u8(operation.as_wire_tag()).expect("vec write cannot fail");
        header.write_u8(0).expect("vec write cannot fail"); // flags, unused

        // The CRC covers sequence, timestamp, op, flags, payload in that
        // logical order, regardless of where the crc32c field itself sits
        // in the on-disk frame.
        let mut crc_region = Vec::with_capacity(header.len() + payload.len());
        crc_region.extend_from_slice(&header);
        crc_region.extend_from_slice(payload);
        let crc = crc32c::crc32c(&crc_region);

        // len covers header + crc32c + payload, not itself.
        let len = header.len() + 4 + payload.len();
        if len > u32::MAX as usize {
            return Err(WalError::Corrupt("record exceeds u32::MAX bytes".into()));
        }

        buf.write_u32::<LittleEndian>(len as u32).expect("vec write cannot fail");
        buf.extend_from_slice(&header);
        buf.write_u32::<LittleEndian>(crc).expect("vec write cannot fail");
        buf.extend_from_slice(payload);

        Ok(())
    }

    /// Total on-disk size of a frame carrying `payload_len` bytes, including
    /// the 4-byte length prefix. Used by the writer to decide when a segment
    /// would overflow its configured size.
    #[must_use]
    pub fn framed_size(payload_len: usize) -> usize {
        4 + HEADER_LEN + 4 + payload_len
    }

    /// Decodes one frame's body (post length-prefix) and verifies its CRC.
    /// Returns `(sequence, timestamp, operation, payload)`.
    pub fn decode_body(body: &[u8]) -> Result<(u64, u64, Operation, Vec<u8>), WalError> {
        if body.len() < HEADER_LEN + 4 {
            return Err(WalError::Corrupt("record body too short".into()));
        }
        let header = &body[..HEADER_LEN];
        let mut cursor = header;
        let sequence = cursor.read_u64::<LittleEndian>()?;
        let timestamp = cursor.read_u64::<LittleEndian>()?;
        let op_tag = cursor.read_u8()?;
        let _flags = cursor.read_u8()?;

        let mut crc_bytes = &body[HEADER_LEN..HEADER_LEN + 4];
        let crc = crc_bytes.read_u32::<LittleEndian>()?;
        let payload = &body[HEADER_LEN + 4..];

        let mut crc_region = Vec::with_capacity(header.len() + payload.len());
        crc_region.extend_from_slice(header);
        crc_region.extend_from_slice(payload);
        let actual = crc32c::crc32c(&crc_region);
        if actual != crc {
            return Err(WalError::Corrupt(format!(
                "crc32c mismatch: stored {:#010x}, computed {:#010x}",
                crc, actual
            )));
        }

        let operation = Operation::from_wire_tag(op_tag)
            .ok_or_else(|| WalError::Corrupt(format!("unknown op code {}", op_tag)))?;

        Ok((sequence, timestamp, operation, payload.to_vec()))
    }
}
