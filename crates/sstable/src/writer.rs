use anyhow::Result;
use bloom::BloomFilter;
use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use memtable::Memtable;
use riptide_core::VersionedRecord;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::format::write_footer_v4;

/// Default bloom filter false positive rate (1%).
const BLOOM_FPR: f64 = 0.01;

/// Writes a stream of [`VersionedRecord`]s to disk as an immutable, v4
/// columnar file.
///
/// The writer is stateless — all work happens inside
/// [`write_from_records`](SSTableWriter::write_from_records). The write is
/// crash-safe: data is first written to a temporary file, fsynced, and then
/// atomically renamed to the final path.
pub struct SSTableWriter {}

impl SSTableWriter {
    /// Flushes `mem` to a new file at `path`, at compaction `level` (flush
    /// output is always level 0).
    pub fn write_from_memtable(path: &Path, mem: &Memtable, level: u32) -> Result<()> {
        if mem.is_empty() {
            anyhow::bail!("refusing to write an empty file (empty memtable)");
        }
        let records = mem.iter_all();
        Self::write_from_records(path, records.len(), records.into_iter(), level)
    }

    /// Writes a file from an iterator of [`VersionedRecord`]s in ascending
    /// key order.
    ///
    /// This is the **streaming compaction** entry point. Unlike
    /// [`write_from_memtable`](SSTableWriter::write_from_memtable), this does
    /// not require the whole input to be materialized in one `Memtable`.
    ///
    /// # Errors
    ///
    /// Returns an error if the iterator yields zero records or on I/O failure.
    pub fn write_from_records<I>(path: &Path, expected_count: usize, iter: I, level: u32) -> Result<()>
    where
        I: Iterator<Item = VersionedRecord>,
    {
        let tmp_path = path.with_extension("sst.tmp");
        let raw_file = OpenOptions::new().create(true).write(true).truncate(true).open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        let mut bloom = BloomFilter::new(expected_count.max(1), BLOOM_FPR);
        let mut index: Vec<(Vec<u8>, u64)> = Vec::new();

        let mut min_seq = u64::MAX;
        let mut max_seq = 0u64;
        let mut min_version = u64::MAX;
        let mut max_version = 0u64;

        let mut record_buf: Vec<u8> = Vec::with_capacity(256);

        for record in iter {
            let key_bytes = record.key.as_bytes();
            let seq = record.sequence.0;
            let version = record.version.0;
            min_seq = min_seq.min(seq);
            max_seq = max_seq.max(seq);
            min_version = min_version.min(version);
            max_version = max_version.max(version);

            record_buf.clear();
            record_buf.write_u32::<LittleEndian>(key_bytes.len() as u32)?;
            record_buf.extend_from_slice(key_bytes);
            record_buf.write_u64::<LittleEndian>(seq)?;
            record_buf.write_u64::<LittleEndian>(record.timestamp_unix_nanos)?;
            record_buf.write_u8(if record.tombstone { 1 } else { 0 })?;
            if !record.tombstone {
                record_buf.write_u32::<LittleEndian>(record.payload.len() as u32)?;
                record_buf.extend_from_slice(&record.payload);
            }

            let mut hasher = Crc32::new();
            hasher.update(&record_buf);
            let crc = hasher.finalize();

            let offset = file.stream_position()?;
            file.write_u32::<LittleEndian>(crc)?;
            file.write_all(&record_buf)?;

            bloom.insert(key_bytes);
            index.push((key_bytes.to_vec(), offset));
        }

        if index.is_empty() {
            drop(file);
            let _ = std::fs::remove_file(&tmp_path);
            anyhow::bail!("refusing to write an empty file (no records)");
        }

        let bloom_offset = file.stream_position()?;
        bloom.write_to(&mut file)?;

        let index_offset = file.stream_position()?;
        for (key, data_offset) in &index {
            file.write_u32::<LittleEndian>(key.len() as u32)?;
            file.write_all(key)?;
            file.write_u64::<LittleEndian>(*data_offset)?;
        }

        write_footer_v4(&mut file, min_seq, max_seq, min_version, max_version, level, bloom_offset, index_offset)?;

        file.flush()?;
        file.into_inner()?.sync_all()?;

        rename(&tmp_path, path)?;

        // Fsync the parent directory so the rename itself is crash-durable
        // on filesystems (ext4, XFS) that don't journal directory entries.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}
