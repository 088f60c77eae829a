use std::time::Duration;

use riptide_core::Operation;
use tempfile::tempdir;

use crate::policy::SyncPolicy;
use crate::reader::WalReader;
use crate::record::WalFrame;
use crate::writer::WalWriter;

#[test]
fn append_then_replay_roundtrips_entries() {
    let dir = tempdir().unwrap();
    let mut writer = WalWriter::create(dir.path(), 1, SyncPolicy::Immediate).unwrap();

    writer.append(1, 100, Operation::Insert, b"alpha").unwrap();
    writer.append(2, 101, Operation::Update, b"beta").unwrap();
    writer.append(3, 102, Operation::Delete, b"").unwrap();

    let reader = WalReader::new(dir.path());
    let mut seen = Vec::new();
    let next_seq = reader.replay(|entry| seen.push(entry)).unwrap();

    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].sequence, 1);
    assert_eq!(seen[0].operation, Operation::Insert);
    assert_eq!(seen[0].payload, b"alpha");
    assert_eq!(seen[1].sequence, 2);
    assert_eq!(seen[2].operation, Operation::Delete);
    assert_eq!(next_seq, 4);
}

#[test]
fn replay_on_empty_directory_yields_next_seq_zero() {
    let dir = tempdir().unwrap();
    let reader = WalReader::new(dir.path());
    let mut count = 0;
    let next_seq = reader.replay(|_| count += 1).unwrap();
    assert_eq!(count, 0);
    assert_eq!(next_seq, 0);
}

#[test]
fn segment_rotates_once_size_budget_is_exceeded() {
    let dir = tempdir().unwrap();
    let mut writer = WalWriter::create(dir.path(), 1, SyncPolicy::Immediate)
        .unwrap()
        .with_segment_size(crate::segment::SEGMENT_HEADER_SIZE as u64 + 64);

    // Each entry is well over half the budget, so the second append rotates.
    writer.append(1, 0, Operation::Insert, &[0u8; 40]).unwrap();
    let first_segment = writer.segment_id();
    writer.append(2, 0, Operation::Insert, &[0u8; 40]).unwrap();
    let second_segment = writer.segment_id();

    assert_ne!(first_segment, second_segment);

    let mut total = 0;
    let dir_entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    for entry in dir_entries {
        let name = entry.unwrap().file_name();
        if name.to_string_lossy().ends_with(".seg") {
            total += 1;
        }
    }
    assert_eq!(total, 2);

    let reader = WalReader::new(dir.path());
    let mut seqs = Vec::new();
    reader.replay(|e| seqs.push(e.sequence)).unwrap();
    assert_eq!(seqs, vec![1, 2]);
}

#[test]
fn batch_sync_policy_defers_fsync_until_threshold() {
    let dir = tempdir().unwrap();
    let policy = SyncPolicy::Batch { max_batch: 3, max_delay: Duration::from_secs(60) };
    let mut writer = WalWriter::create(dir.path(), 1, policy).unwrap();

    writer.append(1, 0, Operation::Insert, b"a").unwrap();
    writer.append(2, 0, Operation::Insert, b"b").unwrap();
    writer.append(3, 0, Operation::Insert, b"c").unwrap();

    // All three entries are on disk (written, even if not yet fsynced) and
    // replay must see them regardless of whether fsync already fired.
    let reader = WalReader::new(dir.path());
    let mut seqs = Vec::new();
    reader.replay(|e| seqs.push(e.sequence)).unwrap();
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[test]
fn torn_tail_is_dropped_silently_not_an_error() {
    let dir = tempdir().unwrap();
    {
        let mut writer = WalWriter::create(dir.path(), 1, SyncPolicy::Immediate).unwrap();
        writer.append(1, 0, Operation::Insert, b"complete").unwrap();
    }

    // Append a truncated frame directly to simulate a crash mid-write: a
    // length prefix promising more bytes than actually follow.
    let segment_path = dir.path().join(crate::segment::segment_filename(1));
    let mut raw = std::fs::OpenOptions::new().append(true).open(&segment_path).unwrap();
    use std::io::Write;
    let mut garbage = Vec::new();
    use byteorder::{LittleEndian, WriteBytesExt};
    garbage.write_u32::<LittleEndian>(9999).unwrap();
    garbage.extend_from_slice(&[1, 2, 3]); // far short of the promised 9999 bytes
    raw.write_all(&garbage).unwrap();

    let reader = WalReader::new(dir.path());
    let mut seqs = Vec::new();
    let next_seq = reader.replay(|e| seqs.push(e.sequence)).unwrap();
    assert_eq!(seqs, vec![1]);
    assert_eq!(next_seq, 2);
}

#[test]
fn crc_mismatch_is_treated_as_torn_tail() {
    let dir = tempdir().unwrap();
    {
        let mut writer = WalWriter::create(dir.path(), 1, SyncPolicy::Immediate).unwrap();
        writer.append(1, 0, Operation::Insert, b"good").unwrap();
    }

    let mut buf = Vec::new();
    WalFrame::encode(&mut buf, 2, 0, Operation::Insert, b"bad").unwrap();
    // Flip a bit in the payload region (the trailing 3 bytes) without
    // touching the stored crc, which sits ahead of the payload.
    let payload_offset = buf.len() - 3; // somewhere inside "bad"
    buf[payload_offset] ^= 0xFF;

    let segment_path = dir.path().join(crate::segment::segment_filename(1));
    let mut raw = std::fs::OpenOptions::new().append(true).open(&segment_path).unwrap();
    use std::io::Write;
    raw.write_all(&buf).unwrap();

    let reader = WalReader::new(dir.path());
    let mut seqs = Vec::new();
    reader.replay(|e| seqs.push(e.sequence)).unwrap();
    assert_eq!(seqs, vec![1]);
}

#[test]
fn multi_segment_replay_preserves_ascending_order() {
    let dir = tempdir().unwrap();
    let mut writer = WalWriter::create(dir.path(), 1, SyncPolicy::Immediate)
        .unwrap()
        .with_segment_size(crate::segment::SEGMENT_HEADER_SIZE as u64 + 40);

    for seq in 1..=5u64 {
        writer.append(seq, 0, Operation::Insert, &[seq as u8; 20]).unwrap();
    }

    let reader = WalReader::new(dir.path());
    let mut seqs = Vec::new();
    let next_seq = reader.replay(|e| seqs.push(e.sequence)).unwrap();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    assert_eq!(next_seq, 6);
}

#[test]
fn create_checkpoint_is_replayable_as_an_entry() {
    let dir = tempdir().unwrap();
    let mut writer = WalWriter::create(dir.path(), 1, SyncPolicy::Immediate).unwrap();
    writer.append(1, 0, Operation::Insert, b"x").unwrap();
    writer.create_checkpoint(2, 0).unwrap();

    let reader = WalReader::new(dir.path());
    let mut ops = Vec::new();
    reader.replay(|e| ops.push(e.operation)).unwrap();
    assert_eq!(ops, vec![Operation::Insert, Operation::Checkpoint]);
}

#[test]
fn truncate_keeps_a_sealed_segment_whose_last_seq_is_past_the_checkpoint() {
    // Size the segment so entries 1 and 2 share the first (sealed) segment
    // while entry 3 rotates into a fresh active one. Only entry 1 has made
    // it into a flushed memtable by the time truncate(1) is called (the
    // flush worker runs asynchronously from WAL rotation), so the sealed
    // segment must survive: it still holds unflushed entry 2.
    let dir = tempdir().unwrap();
    let mut writer =
        WalWriter::create(dir.path(), 1, SyncPolicy::Immediate).unwrap().with_segment_size(crate::segment::SEGMENT_HEADER_SIZE as u64 + 92);

    writer.append(1, 0, Operation::Insert, &[1u8; 20]).unwrap();
    writer.append(2, 0, Operation::Insert, &[2u8; 20]).unwrap(); // still fits segment 1
    writer.append(3, 0, Operation::Insert, &[3u8; 20]).unwrap(); // rotates, sealing segment 1

    writer.truncate(1).unwrap();

    let reader = WalReader::new(dir.path());
    let mut seqs = Vec::new();
    reader.replay(|e| seqs.push(e.sequence)).unwrap();
    assert_eq!(seqs, vec![1, 2, 3], "truncate(1) must not drop entry 2, whose segment's last_seq is 2");
}

#[test]
fn truncate_removes_a_sealed_segment_wholly_covered_by_the_checkpoint() {
    let dir = tempdir().unwrap();
    let mut writer = WalWriter::create(dir.path(), 1, SyncPolicy::Immediate)
        .unwrap()
        .with_segment_size(crate::segment::SEGMENT_HEADER_SIZE as u64 + 40);

    writer.append(1, 0, Operation::Insert, &[1u8; 20]).unwrap();
    writer.append(2, 0, Operation::Insert, &[2u8; 20]).unwrap(); // rotates, sealing segment 1

    writer.truncate(1).unwrap();

    let reader = WalReader::new(dir.path());
    let mut seqs = Vec::new();
    reader.replay(|e| seqs.push(e.sequence)).unwrap();
    assert_eq!(seqs, vec![2], "segment 1 is wholly covered by the checkpoint and should be gone");
}
