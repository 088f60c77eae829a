//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk storage files for the RiptideKV storage engine.
//!
//! When the in-memory [`memtable::Memtable`] exceeds its size threshold the
//! engine flushes it to disk as an SSTable. SSTables are *write-once,
//! read-many* — once created they are never modified (only replaced during
//! compaction).
//!
//! ## File layout (v4 – current)
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA SECTION (sorted key/value records)                        │
//! │                                                               │
//! │ crc32 (u32) | key_len (u32) | key (embeds tenant/table/entity/ │
//! │ version) | seq (u64) | timestamp_unix_nanos (u64) | tombstone │
//! │ (u8) | [payload_len (u32) | payload]                           │
//! │                                                               │
//! │ ... repeated for each entry, in ascending key order ...        │
//! │                                                               │
//! │ The CRC32 covers everything after itself in the record. This  │
//! │ detects silent disk corruption on reads.                      │
//! ├───────────────────────────────────────────────────────────────┤
//! │ BLOOM SECTION (serialized BloomFilter)                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX SECTION: key_len (u32) | key | data_offset (u64), repeated│
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 56 bytes)                                  │
//! │                                                               │
//! │ min_seq | max_seq | min_version | max_version (u64 LE each)    │
//! │ level (u32 LE) | bloom_offset | index_offset (u64 LE)          │
//! │ magic (u32 LE) "SST4"                                          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. `key_range`, `row_count`, and per-
//! version bounds are what the rest of the engine calls "footer stats";
//! `key_range` and `row_count` are cheap to recover from the loaded index
//! (first/last key, index length) rather than duplicated in the footer.
//!
//! The reader also supports older files for backward compatibility: v1
//! (magic `SST1`, 12-byte footer, no bloom/CRC/version), v2 (magic `SST2`,
//! 20-byte footer, bloom but no CRC), and v3 (magic `SST3`, 28-byte footer,
//! CRC32 but no version range). Records in those files are read back with
//! `version` defaulted to 0.
//!
//! ## Version history
//!
//! | Version | Magic | Footer | Features                                   |
//! |---------|-------|--------|---------------------------------------------|
//! | v1      | `SST1`| 12 B   | Basic DATA + INDEX                           |
//! | v2      | `SST2`| 20 B   | + Bloom filter section                       |
//! | v3      | `SST3`| 28 B   | + Per-record CRC32, max_seq in footer         |
//! | v4      | `SST4`| 56 B   | + MVCC version range, compaction level        |

mod format;
mod merge;
mod reader;
mod writer;

pub use format::{
    Footer, FOOTER_BYTES, FOOTER_BYTES_V2, FOOTER_BYTES_V3, FOOTER_BYTES_V4, SSTABLE_MAGIC,
    SSTABLE_MAGIC_V2, SSTABLE_MAGIC_V3, SSTABLE_MAGIC_V4,
};
pub use merge::MergeIterator;
pub use reader::{FileStats, SSTableReader};
pub use writer::SSTableWriter;

#[cfg(test)]
mod tests;
