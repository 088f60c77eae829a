//! Merge iterator over multiple [`SSTableReader`]s.
//!
//! Produces [`VersionedRecord`]s in ascending `RecordKey` order. When the
//! same key (same tenant/table/entity/version) appears in multiple files —
//! which only happens if the same version was flushed twice, since
//! `RecordKey` already encodes version — the entry with the **highest
//! sequence number** wins, per the MVCC tiebreak rule.
//!
//! This is the core primitive for compaction: walk N input files in sorted
//! order and write the deduplicated result to new output files.

use anyhow::Result;
use riptide_core::VersionedRecord;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::SSTableReader;

/// A pending key from one file source, used for heap-based merge ordering.
///
/// Only the `key` and `source` are stored — the [`VersionedRecord`] is read
/// lazily from disk when the key reaches the top of the heap.
struct HeapEntry {
    key: Vec<u8>,
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the *smallest* key first, so
        // reverse the key comparison. On tie, prefer the lower source index
        // (arbitrary but deterministic).
        other.key.cmp(&self.key).then_with(|| other.source.cmp(&self.source))
    }
}

/// Merges multiple files into a single sorted stream of [`VersionedRecord`]s.
///
/// Duplicate keys are resolved by keeping only the entry with the highest
/// sequence number. The iterator is lazy — it reads one key at a time from
/// each source file.
pub struct MergeIterator<'a> {
    readers: &'a [SSTableReader],
    key_iters: Vec<std::vec::IntoIter<Vec<u8>>>,
    heap: BinaryHeap<HeapEntry>,
}

impl<'a> MergeIterator<'a> {
    /// Creates a new merge iterator over the given file readers. Each
    /// reader's keys are already resident in its in-memory index; the first
    /// key from each reader is pushed onto a min-heap.
    pub fn new(readers: &'a [SSTableReader]) -> Self {
        let mut key_iters: Vec<std::vec::IntoIter<Vec<u8>>> = Vec::with_capacity(readers.len());
        let mut heap = BinaryHeap::new();

        for (i, reader) in readers.iter().enumerate() {
            let keys: Vec<Vec<u8>> = reader.keys().map(|k| k.to_vec()).collect();
            let mut iter = keys.into_iter();
            if let Some(first_key) = iter.next() {
                heap.push(HeapEntry { key: first_key, source: i });
            }
            key_iters.push(iter);
        }

        Self { readers, key_iters, heap }
    }

    /// Returns the next [`VersionedRecord`] in sorted order, or `None` when
    /// all sources are exhausted.
    pub fn next_entry(&mut self) -> Result<Option<VersionedRecord>> {
        loop {
            let top = match self.heap.pop() {
                Some(e) => e,
                None => return Ok(None),
            };

            let entry = self.readers[top.source].get(&top.key)?;

            if let Some(next_key) = self.key_iters[top.source].next() {
                self.heap.push(HeapEntry { key: next_key, source: top.source });
            }

            let entry = match entry {
                Some(e) => e,
                None => continue, // shouldn't happen, but skip
            };

            let best_key = top.key;
            let mut best_entry = entry;

            // Drain all heap entries with the same key, keeping only the
            // one with the highest sequence number.
            while let Some(peek) = self.heap.peek() {
                if peek.key != best_key {
                    break;
                }
                let dup = self.heap.pop().unwrap();

                if let Ok(Some(dup_entry)) = self.readers[dup.source].get(&dup.key) {
                    if dup_entry.sequence.0 > best_entry.sequence.0 {
                        best_entry = dup_entry;
                    }
                }

                if let Some(next_key) = self.key_iters[dup.source].next() {
                    self.heap.push(HeapEntry { key: next_key, source: dup.source });
                }
            }

            return Ok(Some(best_entry));
        }
    }

    /// Collects all remaining entries into a `Vec`. Useful for testing and
    /// for building a merged output for compaction.
    pub fn collect_all(&mut self) -> Result<Vec<VersionedRecord>> {
        let mut result = Vec::new();
        while let Some(entry) = self.next_entry()? {
            result.push(entry);
        }
        Ok(result)
    }
}
