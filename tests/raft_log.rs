//! End-to-end scenarios mirroring the concrete walkthroughs in the design
//! document: create/reopen, append, suffix delete with notify, prefix
//! poll, and header rewrites that must not change the file's length.

use raft_log::{RaftLog, RaftLogConfig};

const DBID: &str = "0123456789abcdef01234567890abcde";

fn config(dir: &tempfile::TempDir) -> RaftLogConfig {
    let _ = tracing_subscriber::fmt::try_init();
    RaftLogConfig::new(dir.path().join("raft.log"), DBID)
        .unwrap()
        .with_no_fsync(true)
}

#[test]
fn scenario_1_create_and_reopen_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    {
        let log = RaftLog::create(&config(&dir), 0, 0).unwrap();
        assert_eq!(log.first_idx(), 0);
        assert_eq!(log.current_idx(), 0);
        assert_eq!(log.count(), 0);
    }

    let log = RaftLog::open(dir.path().join("raft.log"), true).unwrap();
    assert_eq!(log.first_idx(), 0);
    assert_eq!(log.current_idx(), 0);
    assert_eq!(log.count(), 0);
    assert_eq!(log.dbid(), DBID);
}

#[test]
fn scenario_2_append_one_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();

    log.append(1, 100, 2, b"x").unwrap();

    assert_eq!(log.current_idx(), 1);
    assert_eq!(log.count(), 1);
    assert_eq!(log.get(1).unwrap().data(), b"x");
}

#[test]
fn scenario_3_delete_suffix_notifies_discarded_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();

    log.append(1, 100, 0, b"").unwrap();
    log.append(1, 101, 0, b"").unwrap();
    log.append(2, 102, 0, b"").unwrap();

    let mut notified = Vec::new();
    log.delete_suffix(2, |entry, idx| notified.push((idx, entry.id())))
        .unwrap();

    assert_eq!(notified, vec![(2, 101), (3, 102)]);
    assert_eq!(log.current_idx(), 1);
    assert_eq!(log.count(), 1);
    assert!(log.get(2).is_none());
}

#[test]
fn scenario_4_append_after_suffix_delete_reuses_index() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();

    log.append(1, 100, 0, b"").unwrap();
    log.append(1, 101, 0, b"").unwrap();
    log.append(2, 102, 0, b"").unwrap();
    log.delete_suffix(2, |_, _| {}).unwrap();

    let idx = log.append(2, 200, 0, b"").unwrap();
    assert_eq!(idx, 2);
    assert_eq!(log.current_idx(), 2);
    assert_eq!(log.get(2).unwrap().id(), 200);
}

#[test]
fn scenario_5_poll_prefix_advances_first_idx() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();

    let mut ids = Vec::new();
    for i in 0..10u64 {
        let id = 1000 + i;
        log.append(1, id, 0, b"").unwrap();
        ids.push(id);
    }

    log.poll_prefix(6).unwrap();

    assert_eq!(log.first_idx(), 6);
    assert_eq!(log.count(), 5);
    assert!(log.get(5).is_none());
    assert_eq!(log.get(6).unwrap().id(), ids[5]);
}

#[test]
fn scenario_6_header_rewrites_preserve_file_length() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();
    log.append(1, 1, 0, b"payload").unwrap();

    let len_before = log.log_file_len().unwrap();
    log.set_term(7, 3).unwrap();
    log.set_vote(-1).unwrap();
    let len_after = log.log_file_len().unwrap();

    assert_eq!(len_before, len_after);

    let reopened = RaftLog::open(dir.path().join("raft.log"), true).unwrap();
    assert_eq!(reopened.term(), 7);
    assert_eq!(reopened.vote(), -1);
    assert_eq!(reopened.current_idx(), 1);
}

#[test]
fn get_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();
    log.append(3, 9, 1, b"abc").unwrap();

    let a = log.get(1).unwrap();
    let b = log.get(1).unwrap();
    assert_eq!(a.term(), b.term());
    assert_eq!(a.id(), b.id());
    assert_eq!(a.entry_type(), b.entry_type());
    assert_eq!(a.data(), b.data());
}

#[test]
fn reads_bypassing_the_cache_match_cached_reads() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();
    log.append(5, 42, 3, b"hello").unwrap();

    assert!(log.is_cached(1));
    let cached = log.get(1).unwrap();

    // force a fresh reopen, which starts with an empty cache, so this read
    // must come from the log file via the index file
    drop(log);
    let reopened = RaftLog::open(dir.path().join("raft.log"), true).unwrap();
    assert!(!reopened.is_cached(1));
    let from_disk = reopened.get(1).unwrap();

    assert_eq!(cached.term(), from_disk.term());
    assert_eq!(cached.id(), from_disk.id());
    assert_eq!(cached.data(), from_disk.data());
}

#[test]
fn get_batch_stops_at_first_miss() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();
    for i in 1..=3u64 {
        log.append(1, i, 0, b"").unwrap();
    }

    let batch = log.get_batch(1, 10);
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[0].id(), 1);
    assert_eq!(batch[2].id(), 3);

    let empty = log.get_batch(5, 10);
    assert!(empty.is_empty());
}

#[test]
fn reset_clears_vote_only_when_term_decreases() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();
    log.set_term(5, 2).unwrap();

    // term stays the same or grows: vote is untouched by reset's own rule
    log.reset(0, 5).unwrap();
    assert_eq!(log.term(), 5);
    assert_eq!(log.vote(), 2);

    log.set_term(5, 4).unwrap();
    log.reset(0, 1).unwrap();
    assert_eq!(log.term(), 1);
    assert_eq!(log.vote(), -1);
}

#[test]
fn reset_truncates_log_and_index_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();
    for i in 1..=5u64 {
        log.append(1, i, 0, b"x").unwrap();
    }

    log.reset(10, 3).unwrap();

    assert_eq!(log.first_idx(), 10);
    assert_eq!(log.current_idx(), 10);
    assert_eq!(log.count(), 0);
    assert!(log.get(1).is_none());

    let idx = log.append(3, 999, 0, b"after-reset").unwrap();
    assert_eq!(idx, 11);
    assert_eq!(log.get(11).unwrap().id(), 999);
}

#[test]
fn out_of_range_reads_and_deletes_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = RaftLog::create(&config(&dir), 0, 0).unwrap();
    log.append(1, 1, 0, b"").unwrap();

    assert!(log.get(0).is_none());
    assert!(log.get(5).is_none());
    assert!(log.delete_suffix(5, |_, _| {}).is_err());
    assert!(log.delete_suffix(0, |_, _| {}).is_err());
}

#[test]
fn config_rejects_oversized_dbid_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let oversized = "x".repeat(raft_log::RAFT_DBID_LEN + 1);
    assert!(RaftLogConfig::new(dir.path().join("log"), oversized).is_err());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}
