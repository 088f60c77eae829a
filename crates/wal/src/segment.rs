use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::error::WalError;

/// Magic identifying a RiptideKV WAL segment file: ASCII "WAL1".
pub const WAL_MAGIC: u32 = 0x5741_4C31;

/// Current on-disk segment format version.
pub const SEGMENT_FORMAT_VERSION: u16 = 1;

/// Fixed size of a segment header in bytes.
pub const SEGMENT_HEADER_SIZE: usize = 32;

/// Lifecycle state of a WAL segment. `Active` segments accept appends;
/// `Sealed` segments are rotated out and read-only; `Truncated` segments have
/// been fully covered by a flush checkpoint and are eligible for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    Active,
    Sealed,
    Truncated,
}

/// The 32-byte header written at the start of every segment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    pub segment_id: u64,
    pub first_seq: u64,
}

impl SegmentHeader {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(WAL_MAGIC)?;
        w.write_u16::<LittleEndian>(SEGMENT_FORMAT_VERSION)?;
        w.write_u16::<LittleEndian>(0)?; // flags, reserved for future use
        w.write_u64::<LittleEndian>(self.segment_id)?;
        w.write_u64::<LittleEndian>(self.first_seq)?;
        w.write_u64::<LittleEndian>(0)?; // reserved
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, WalError> {
        let magic = r.read_u32::<LittleEndian>()?;
        if magic != WAL_MAGIC {
            return Err(WalError::Corrupt(format!(
                "bad segment magic: {:#010x} (expected {:#010x})",
                magic, WAL_MAGIC
            )));
        }
        let version = r.read_u16::<LittleEndian>()?;
        if version != SEGMENT_FORMAT_VERSION {
            return Err(WalError::Corrupt(format!(
                "unsupported segment format version: {}",
                version
            )));
        }
        let _flags = r.read_u16::<LittleEndian>()?;
        let segment_id = r.read_u64::<LittleEndian>()?;
        let first_seq = r.read_u64::<LittleEndian>()?;
        let _reserved = r.read_u64::<LittleEndian>()?;
        Ok(SegmentHeader { segment_id, first_seq })
    }
}

/// Builds the conventional filename for a segment: `wal-{segment_id:020}.seg`.
#[must_use]
pub fn segment_filename(segment_id: u64) -> String {
    format!("wal-{:020}.seg", segment_id)
}
