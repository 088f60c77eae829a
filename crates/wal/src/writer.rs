use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use riptide_core::Operation;

use crate::error::WalError;
use crate::policy::SyncPolicy;
use crate::record::WalFrame;
use crate::segment::{segment_filename, SegmentHeader};

/// Append-only WAL writer owning the active segment and the rotation policy.
///
/// Grounded on the teacher's single-file `WalWriter` (reusable scratch
/// buffer, one `write_all` per append, optional `sync_all`), generalized to
/// multiple rotating segments and three sync policies instead of a bool.
pub struct WalWriter {
    dir: PathBuf,
    segment_size: u64,
    policy: SyncPolicy,

    file: File,
    segment_id: u64,
    segment_first_seq: u64,
    segment_bytes: u64,

    buf: Vec<u8>,
    writes_since_sync: usize,
    last_sync_at: Instant,
}

impl WalWriter {
    /// Opens (creating if necessary) a WAL directory and starts a fresh
    /// active segment beginning at `next_seq`. Callers that are recovering
    /// an existing WAL should replay first, then open the writer with the
    /// sequence number one past the highest replayed entry.
    pub fn create(dir: impl AsRef<Path>, next_seq: u64, policy: SyncPolicy) -> Result<Self, WalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let segment_id = next_seq;
        let (file, segment_bytes) = Self::open_new_segment(&dir, segment_id, next_seq)?;

        Ok(Self {
            dir,
            segment_size: 64 * 1024 * 1024,
            policy,
            file,
            segment_id,
            segment_first_seq: next_seq,
            segment_bytes,
            buf: Vec::with_capacity(256),
            writes_since_sync: 0,
            last_sync_at: Instant::now(),
        })
    }

    /// Overrides the default 64 MiB segment rotation threshold.
    #[must_use]
    pub fn with_segment_size(mut self, bytes: u64) -> Self {
        self.segment_size = bytes;
        self
    }

    fn open_new_segment(dir: &Path, segment_id: u64, first_seq: u64) -> Result<(File, u64), WalError> {
        let path = dir.join(segment_filename(segment_id));
        let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(&path)?;
        let header = SegmentHeader { segment_id, first_seq };
        header.write_to(&mut file)?;
        file.flush()?;
        Ok((file, crate::segment::SEGMENT_HEADER_SIZE as u64))
    }

    fn rotate(&mut self, next_seq: u64) -> Result<(), WalError> {
        self.file.sync_all()?;
        let (file, bytes) = Self::open_new_segment(&self.dir, next_seq, next_seq)?;
        self.file = file;
        self.segment_id = next_seq;
        self.segment_first_seq = next_seq;
        self.segment_bytes = bytes;
        Ok(())
    }

    /// Appends one record, returning its sequence number's own value back
    /// (the caller supplies the sequence — allocation lives in the engine so
    /// it can be assigned before the WAL write starts, per the durability
    /// ordering in the concurrency model).
    pub fn append(
        &mut self,
        sequence: u64,
        timestamp_unix_nanos: u64,
        operation: Operation,
        payload: &[u8],
    ) -> Result<(), WalError> {
        let frame_size = WalFrame::framed_size(payload.len()) as u64;
        if self.segment_bytes + frame_size > self.segment_size && self.segment_bytes > crate::segment::SEGMENT_HEADER_SIZE as u64 {
            self.rotate(sequence)?;
        }

        self.buf.clear();
        WalFrame::encode(&mut self.buf, sequence, timestamp_unix_nanos, operation, payload)?;

        self.file.write_all(&self.buf)?;
        self.segment_bytes += self.buf.len() as u64;
        self.writes_since_sync += 1;

        self.maybe_sync()?;
        Ok(())
    }

    /// Appends a batch of records as one atomic group: either all land in
    /// the segment or (on the first I/O error) none of the batch is
    /// considered durable, matching the "atomic group" contract for
    /// `append_batch`.
    pub fn append_batch(
        &mut self,
        entries: &[(u64, u64, Operation, &[u8])],
    ) -> Result<(), WalError> {
        for (seq, ts, op, payload) in entries {
            self.append(*seq, *ts, *op, payload)?;
        }
        self.sync_to_disk()
    }

    fn maybe_sync(&mut self) -> Result<(), WalError> {
        match self.policy {
            SyncPolicy::Immediate => self.sync_to_disk(),
            SyncPolicy::Batch { max_batch, max_delay } => {
                if self.writes_since_sync >= max_batch || self.last_sync_at.elapsed() >= max_delay {
                    self.sync_to_disk()
                } else {
                    Ok(())
                }
            }
            SyncPolicy::Periodic { .. } => Ok(()), // a background ticker drives periodic sync
        }
    }

    /// Forces all buffered data to disk via `fsync`. Called directly by
    /// `Immediate`/`Batch` policies, and by the engine's periodic background
    /// ticker under `Periodic`.
    pub fn sync_to_disk(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        self.writes_since_sync = 0;
        self.last_sync_at = Instant::now();
        Ok(())
    }

    /// Writes a checkpoint marker recording that every entry up to and
    /// including `sequence` has been durably flushed to a columnar file.
    /// Segments wholly covered by the checkpoint become eligible for
    /// `truncate`.
    pub fn create_checkpoint(&mut self, sequence: u64, timestamp_unix_nanos: u64) -> Result<(), WalError> {
        self.append(sequence, timestamp_unix_nanos, Operation::Checkpoint, &[])?;
        self.sync_to_disk()
    }

    /// Removes sealed segments whose `last_seq` is `<= up_to_sequence`,
    /// leaving the active segment (and any segment straddling the boundary)
    /// untouched.
    pub fn truncate(&mut self, up_to_sequence: u64) -> Result<(), WalError> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == self.current_segment_path() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !name.starts_with("wal-") || !name.ends_with(".seg") {
                    continue;
                }
            } else {
                continue;
            }

            if let Ok(mut f) = File::open(&path) {
                if let Ok(header) = SegmentHeader::read_from(&mut f) {
                    if header.segment_id >= self.segment_id {
                        continue;
                    }
                    // The header only carries `first_seq`, a lower bound;
                    // `last_seq` has to be found by scanning the segment's
                    // own frames. A segment is only safe to remove once
                    // every entry it holds, not just its first, is covered
                    // by the checkpoint — otherwise a segment that kept
                    // filling past the sealed memtable's checkpoint (the
                    // flush worker runs asynchronously, so this is routine,
                    // not a crash case) would be unlinked with unflushed
                    // entries still in it.
                    match crate::reader::last_sequence_in_segment(&path) {
                        Some(last_seq) if last_seq <= up_to_sequence => {
                            let _ = fs::remove_file(&path);
                        }
                        Some(_) => {}
                        // No valid frame at all (an empty sealed segment):
                        // fall back to first_seq, its only bound.
                        None if header.first_seq <= up_to_sequence => {
                            let _ = fs::remove_file(&path);
                        }
                        None => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn current_segment_path(&self) -> PathBuf {
        self.dir.join(segment_filename(self.segment_id))
    }

    #[must_use]
    pub fn segment_id(&self) -> u64 {
        self.segment_id
    }
}
