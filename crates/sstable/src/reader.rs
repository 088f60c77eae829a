use anyhow::{bail, Result};
use bloom::BloomFilter;
use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use riptide_core::{RecordKey, SequenceNumber, VersionedRecord};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::format::{read_footer_versioned, Footer, FOOTER_BYTES_V1};

/// Maximum key size we'll allocate during reads (64 KiB). Prevents OOM on corrupt files.
const MAX_KEY_BYTES: usize = 64 * 1024;
/// Maximum value size we'll allocate during reads (10 MiB). Prevents OOM on corrupt files.
const MAX_VALUE_BYTES: usize = 10 * 1024 * 1024;

/// Footer-derived statistics for a file, per the columnar-file contract:
/// key range, row count, and the sequence/version bounds needed by
/// compaction and by recovery to bound how far back a scan must look.
#[derive(Debug, Clone)]
pub struct FileStats {
    pub row_count: usize,
    pub min_key: Vec<u8>,
    pub max_key: Vec<u8>,
    pub min_seq: Option<u64>,
    pub max_seq: Option<u64>,
    pub version_range: Option<(u64, u64)>,
    pub level: u32,
}

/// Reads a columnar file for point lookups.
///
/// On [`open`](SSTableReader::open) the entire **index** is loaded into
/// memory as a `BTreeMap<Vec<u8>, u64>` (key bytes, which embed tenant,
/// table, entity, and version → data-section byte offset), along with the
/// bloom filter if present.
///
/// A persistent file handle is kept open for the lifetime of the reader,
/// wrapped in a `Mutex` so that `get` can be called through a shared `&self`
/// reference.
pub struct SSTableReader {
    #[allow(dead_code)]
    path: PathBuf,
    index: BTreeMap<Vec<u8>, u64>,
    bloom: Option<BloomFilter>,
    file: Mutex<BufReader<File>>,
    footer: Footer,
}

impl SSTableReader {
    /// Opens a file and loads its index (and bloom filter, if present) into
    /// memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut f = File::open(&path_buf)?;
        let metadata = f.metadata()?;
        let filesize = metadata.len();

        if filesize < FOOTER_BYTES_V1 {
            bail!("sstable file too small");
        }

        let footer = read_footer_versioned(&mut f)?;
        let index_offset = footer.index_offset();

        if index_offset >= filesize {
            bail!("invalid index_offset");
        }

        let footer_size = footer.footer_size();

        let bloom = if let Some(bloom_offset) = footer.bloom_offset() {
            f.seek(SeekFrom::Start(bloom_offset))?;
            Some(BloomFilter::read_from(&mut f)?)
        } else {
            None
        };

        f.seek(SeekFrom::Start(index_offset))?;
        let mut index = BTreeMap::new();

        while f.stream_position()? < (filesize - footer_size) {
            let key_len = f.read_u32::<LittleEndian>()? as usize;
            if key_len > MAX_KEY_BYTES {
                bail!("corrupt index: key_len {} exceeds maximum {}", key_len, MAX_KEY_BYTES);
            }
            let mut key = vec![0u8; key_len];
            f.read_exact(&mut key)?;
            let data_offset = f.read_u64::<LittleEndian>()?;
            index.insert(key, data_offset);
        }

        f.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path_buf,
            index,
            bloom,
            file: Mutex::new(BufReader::new(f)),
            footer,
        })
    }

    /// Point lookup by raw key bytes (the `RecordKey` encoding).
    ///
    /// If a bloom filter is present, it's checked first: a negative result
    /// means the key is **definitely not** in this file, avoiding an index
    /// lookup and disk I/O entirely.
    ///
    /// Returns `Ok(Some(record))` if the key exists (possibly a tombstone).
    pub fn get(&self, key: &[u8]) -> Result<Option<VersionedRecord>> {
        if let Some(ref bf) = self.bloom {
            if !bf.may_contain(key) {
                return Ok(None);
            }
        }

        let offset = match self.index.get(key) {
            Some(&o) => o,
            None => return Ok(None),
        };

        self.read_at(offset, Some(key))
    }

    /// Reads the record at a known data-section offset, verifying its CRC
    /// (v3+) and, if `expected_key` is given, that the on-disk key matches.
    fn read_at(&self, offset: u64, expected_key: Option<&[u8]>) -> Result<Option<VersionedRecord>> {
        let has_crc = self.footer.has_checksums();
        let is_v4 = matches!(self.footer, Footer::V4 { .. });

        let mut f = self.file.lock().map_err(|e| anyhow::anyhow!("lock poisoned: {}", e))?;
        f.seek(SeekFrom::Start(offset))?;

        let stored_crc = if has_crc { Some(f.read_u32::<LittleEndian>()?) } else { None };

        let key_len = f.read_u32::<LittleEndian>()? as usize;
        if key_len > MAX_KEY_BYTES {
            bail!("corrupt data: key_len {} exceeds maximum {}", key_len, MAX_KEY_BYTES);
        }
        let mut key_buf = vec![0u8; key_len];
        f.read_exact(&mut key_buf)?;

        if let Some(expected) = expected_key {
            if key_buf.as_slice() != expected {
                bail!("index pointed to mismatching key at offset");
            }
        }

        let seq = f.read_u64::<LittleEndian>()?;

        let (timestamp_unix_nanos, tombstone, payload) = if is_v4 {
            let timestamp = f.read_u64::<LittleEndian>()?;
            let tombstone = f.read_u8()? == 1;
            let payload = if tombstone {
                Vec::new()
            } else {
                let val_len = f.read_u32::<LittleEndian>()? as usize;
                if val_len > MAX_VALUE_BYTES {
                    bail!("corrupt data: payload_len {} exceeds maximum {}", val_len, MAX_VALUE_BYTES);
                }
                let mut val = vec![0u8; val_len];
                f.read_exact(&mut val)?;
                val
            };
            (timestamp, tombstone, payload)
        } else {
            // Legacy v1-v3 layout: present(u8) + [val_len(u32) + val], no timestamp.
            let present = f.read_u8()?;
            let payload = if present == 1 {
                let val_len = f.read_u32::<LittleEndian>()? as usize;
                if val_len > MAX_VALUE_BYTES {
                    bail!("corrupt data: val_len {} exceeds maximum {}", val_len, MAX_VALUE_BYTES);
                }
                let mut val = vec![0u8; val_len];
                f.read_exact(&mut val)?;
                val
            } else {
                Vec::new()
            };
            (0, present != 1, payload)
        };

        if let Some(expected_crc) = stored_crc {
            let mut hasher = Crc32::new();
            hasher.update(&(key_len as u32).to_le_bytes());
            hasher.update(&key_buf);
            hasher.update(&seq.to_le_bytes());
            if is_v4 {
                hasher.update(&timestamp_unix_nanos.to_le_bytes());
                hasher.update(&[if tombstone { 1 } else { 0 }]);
                if !tombstone {
                    hasher.update(&(payload.len() as u32).to_le_bytes());
                    hasher.update(&payload);
                }
            } else {
                hasher.update(&[if tombstone { 0 } else { 1 }]);
                if !tombstone {
                    hasher.update(&(payload.len() as u32).to_le_bytes());
                    hasher.update(&payload);
                }
            }
            let actual_crc = hasher.finalize();
            if actual_crc != expected_crc {
                bail!(
                    "CRC32 mismatch at offset {}: expected {:#010x}, got {:#010x} (data corruption)",
                    offset, expected_crc, actual_crc
                );
            }
        }

        let key = RecordKey::from_bytes(key_buf);
        let version = key.version();

        Ok(Some(VersionedRecord {
            key,
            version,
            sequence: SequenceNumber(seq),
            timestamp_unix_nanos,
            payload,
            tombstone,
        }))
    }

    #[must_use]
    pub fn has_bloom(&self) -> bool {
        self.bloom.is_some()
    }

    #[must_use]
    pub fn max_seq(&self) -> Option<u64> {
        self.footer.max_seq()
    }

    #[must_use]
    pub fn min_seq(&self) -> Option<u64> {
        self.footer.min_seq()
    }

    #[must_use]
    pub fn has_checksums(&self) -> bool {
        self.footer.has_checksums()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns an iterator over all keys in the in-memory index, in
    /// ascending sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.index.keys().map(|k| k.as_slice())
    }

    /// Returns the data-section byte offset recorded for `key`, if present.
    /// Used by the primary index store to build `key -> (file_id, offset)`
    /// locators without re-deriving the index this reader already loaded.
    #[must_use]
    pub fn offset_of(&self, key: &[u8]) -> Option<u64> {
        self.index.get(key).copied()
    }

    /// Footer-derived stats for this file, per the columnar-file contract.
    /// `min_key`/`max_key` and `row_count` are recovered from the already-
    /// loaded index rather than duplicated on disk.
    #[must_use]
    pub fn stats(&self) -> FileStats {
        let min_key = self.index.keys().next().cloned().unwrap_or_default();
        let max_key = self.index.keys().next_back().cloned().unwrap_or_default();
        FileStats {
            row_count: self.index.len(),
            min_key,
            max_key,
            min_seq: self.footer.min_seq(),
            max_seq: self.footer.max_seq(),
            version_range: self.footer.version_range(),
            level: self.footer.level().unwrap_or(0),
        }
    }
}

// #[cfg(test)]
// #[path ="reader_tests.rs"]
// mod tests;
