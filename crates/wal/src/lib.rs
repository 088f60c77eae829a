//! # WAL — Write-Ahead Log
//!
//! Crash-safe durability for the RiptideKV storage engine. Every mutation is
//! serialized into a framed record and appended to the active segment
//! **before** the corresponding memtable update. On restart, segments are
//! replayed oldest-first to reconstruct the memtable, guaranteeing that no
//! acknowledged write is lost.
//!
//! ## Segment header (32 bytes)
//!
//! ```text
//! magic(4)="WAL1" | version(2) | flags(2) | segment_id(8) | first_seq(8) | reserved(8)
//! ```
//!
//! ## Record frame
//!
//! ```text
//! len(4,LE) | sequence(8,LE) | timestamp_unix_nanos(8,LE) | op(1) | flags(1) | crc32c(4) | payload(len-22)
//! ```
//!
//! `len` covers everything after itself except itself. `crc32c` covers
//! `sequence` through `payload`, though the field itself sits ahead of
//! `payload` in the frame. `op`: 1=insert, 2=update, 3=delete, 4=checkpoint.
//!
//! A segment moves through three states: `active` (being appended to),
//! `sealed` (rotated out, read-only), `truncated` (fully covered by a flush
//! checkpoint and eligible for removal).

mod error;
mod policy;
mod record;
mod segment;
mod writer;
mod reader;

pub use error::WalError;
pub use policy::SyncPolicy;
pub use record::WalFrame;
pub use segment::{SegmentHeader, SegmentStatus, SEGMENT_HEADER_SIZE, WAL_MAGIC};
pub use writer::WalWriter;
pub use reader::WalReader;

use riptide_core::Operation;

/// The decoded payload of one WAL entry, independent of its on-disk framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalEntry {
    pub sequence: u64,
    pub timestamp_unix_nanos: u64,
    pub operation: Operation,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests;
