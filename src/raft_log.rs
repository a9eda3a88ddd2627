//! The public facade: the fixed operation set the consensus engine drives
//! (`create`/`open` stand in for the original's `init`; there is no
//! explicit `free` — dropping a [`RaftLog`] closes both files and releases
//! every cached entry).

use std::path::{Path, PathBuf};

use crate::cache::EntryCache;
use crate::config::RaftLogConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::header::LogHeader;
use crate::index_file::IndexFile;
use crate::log_file::LogFile;

pub struct RaftLog {
    log_file: LogFile,
    index_file: IndexFile,
    cache: EntryCache,

    snapshot_last_idx: u64,
    snapshot_last_term: u64,
    index: u64,
    num_entries: u64,
    term: u64,
    vote: i64,
    dbid: String,
    no_fsync: bool,
}

fn index_path_for(log_path: &Path) -> PathBuf {
    let mut os_string = log_path.as_os_str().to_owned();
    os_string.push(".idx");
    PathBuf::from(os_string)
}

impl RaftLog {
    /// `create` — truncate both files and write a fresh header.
    #[tracing::instrument(skip(config), fields(path = %config.path().display()))]
    pub fn create(config: &RaftLogConfig, term: u64, idx: u64) -> Result<RaftLog> {
        let log_file = LogFile::create(config.path())?;
        let index_file = IndexFile::create(&config.index_file_path())?;

        let mut log = RaftLog {
            log_file,
            index_file,
            cache: EntryCache::new(),
            snapshot_last_idx: idx,
            snapshot_last_term: term,
            index: idx,
            num_entries: 0,
            term: 1,
            vote: -1,
            dbid: config.dbid.clone(),
            no_fsync: config.no_fsync,
        };

        let header = log.current_header();
        log.log_file.write_header(&header, log.no_fsync)?;
        tracing::debug!(term, idx, "created raft log");
        Ok(log)
    }

    /// `open` — parse the header and replay entries, rebuilding the index
    /// file as we go. Takes just the log path, matching the original
    /// operation's signature; `no_fsync` is a runtime policy, not
    /// persisted state, so it is supplied separately.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, no_fsync: bool) -> Result<RaftLog> {
        let path = path.as_ref();
        let mut log_file = LogFile::open(path)?;
        let mut index_file = IndexFile::open(&index_path_for(path))?;

        let (header, mut pos) = log_file.read_header()?;

        let mut index = header.snapshot_last_idx;
        let mut num_entries = 0u64;
        pos = log_file.replay_entries(pos, |offset, _entry| {
            index += 1;
            num_entries += 1;
            // best-effort: a failure here would mean a previous append
            // already failed to record its own offset, which is itself
            // the out-of-lockstep condition `append` is supposed to
            // prevent from being observed.
            let _ = index_file.put(index - header.snapshot_last_idx, offset);
        })?;

        // Drop a torn tail entirely so a future append starts exactly
        // where the last fully-written entry ended.
        log_file.truncate_at(pos)?;
        log_file.set_end_offset(pos);

        tracing::debug!(
            current_idx = index,
            count = num_entries,
            "opened raft log"
        );

        Ok(RaftLog {
            log_file,
            index_file,
            cache: EntryCache::new(),
            snapshot_last_idx: header.snapshot_last_idx,
            snapshot_last_term: header.snapshot_last_term,
            index,
            num_entries,
            term: header.term,
            vote: header.vote,
            dbid: header.dbid,
            no_fsync,
        })
    }

    fn current_header(&self) -> LogHeader {
        LogHeader {
            dbid: self.dbid.clone(),
            snapshot_last_term: self.snapshot_last_term,
            snapshot_last_idx: self.snapshot_last_idx,
            term: self.term,
            vote: self.vote,
        }
    }

    /// `append` — write the entry, index it, and cache it. On any failure
    /// the in-memory state (`index`, `num_entries`) is left untouched.
    #[tracing::instrument(skip(self, data), fields(id, term))]
    pub fn append(&mut self, term: u64, id: u64, entry_type: u32, data: &[u8]) -> Result<u64> {
        let offset = self
            .log_file
            .append_entry(term, id, entry_type, data, self.no_fsync)?;
        let next_index = self.index + 1;
        self.index_file
            .put(next_index - self.snapshot_last_idx, offset)?;

        self.index = next_index;
        self.num_entries += 1;

        let entry = Entry::new(term, id, entry_type, data.to_vec());
        self.cache.append(entry, self.index);

        tracing::trace!(index = self.index, "appended entry");
        Ok(self.index)
    }

    /// `get` — cache-first, falling back to a seek through the index file.
    pub fn get(&self, idx: u64) -> Option<Entry> {
        if let Some(e) = self.cache.get(idx) {
            return Some(e);
        }

        if idx <= self.snapshot_last_idx || idx > self.index {
            return None;
        }

        let relidx = idx - self.snapshot_last_idx;
        let offset = self.index_file.get(relidx).ok()??;
        let data = self.log_file.read_entry_at(offset).ok()?;
        Some(Entry::new(data.term, data.id, data.entry_type, data.data))
    }

    /// `get_batch` — fill up to `n` consecutive entries starting at `idx`,
    /// stopping at the first miss. Returns what was found.
    pub fn get_batch(&self, idx: u64, n: usize) -> Vec<Entry> {
        let mut out = Vec::with_capacity(n);
        for i in 0..n as u64 {
            match self.get(idx + i) {
                Some(e) => out.push(e),
                None => break,
            }
        }
        out
    }

    /// `pop` (suffix drop) — truncate the log at `from_idx`, invoking
    /// `notify(entry, idx)` for every entry discarded, in index order,
    /// before the file is truncated. The notify callback's return value
    /// (there is none here) is not part of the contract, matching the
    /// source.
    #[tracing::instrument(skip(self, notify))]
    pub fn delete_suffix(
        &mut self,
        from_idx: u64,
        mut notify: impl FnMut(&Entry, u64),
    ) -> Result<()> {
        if from_idx <= self.snapshot_last_idx || from_idx > self.index {
            return Err(Error::OutOfRange(from_idx));
        }

        let relidx = from_idx - self.snapshot_last_idx;
        let offset = self
            .index_file
            .get(relidx)?
            .ok_or(Error::OutOfRange(from_idx))?;

        let mut idx = from_idx;
        self.log_file.replay_entries(offset, |_offset, data| {
            let entry = Entry::new(data.term, data.id, data.entry_type, data.data);
            notify(&entry, idx);
            idx += 1;
        })?;

        self.log_file.truncate_at(offset)?;

        let removed = self.index - from_idx + 1;
        self.index = from_idx - 1;
        self.num_entries -= removed;

        // Best-effort: the cache may not hold this range at all.
        let _ = self.cache.delete_tail(from_idx);

        tracing::debug!(from_idx, removed, "deleted log suffix");
        Ok(())
    }

    /// `poll` (prefix drop) — advance `snapshot_last_idx` to `first_idx`
    /// and evict the cache head; the log file itself is not shrunk here.
    #[tracing::instrument(skip(self))]
    pub fn poll_prefix(&mut self, first_idx: u64) -> Result<()> {
        if first_idx < self.snapshot_last_idx {
            return Ok(());
        }

        self.snapshot_last_idx = first_idx;
        if self.index < self.snapshot_last_idx {
            self.index = self.snapshot_last_idx;
        }
        self.num_entries = self.index - self.snapshot_last_idx;

        let _ = self.cache.delete_head(first_idx);

        tracing::debug!(first_idx, "polled log prefix");
        Ok(())
    }

    /// `reset` — truncate both files, reinitialize metadata and the
    /// cache, and write a fresh header. `vote` is cleared only when the
    /// current term is greater than the new term, matching the source's
    /// rule exactly (see DESIGN.md for why this particular rule is kept
    /// as-is rather than guessed differently).
    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self, idx: u64, term: u64) -> Result<()> {
        self.snapshot_last_idx = idx;
        self.index = idx;
        self.snapshot_last_term = term;
        if self.term > term {
            self.term = term;
            self.vote = -1;
        }
        self.num_entries = 0;

        self.log_file.truncate_to_empty()?;
        self.index_file.truncate_to_empty()?;

        let header = self.current_header();
        self.log_file.write_header(&header, self.no_fsync)?;

        self.cache = EntryCache::new();

        tracing::debug!(idx, term, "reset raft log");
        Ok(())
    }

    /// `set_term`/`set_vote` combined — rewrite the header in place.
    #[tracing::instrument(skip(self))]
    pub fn set_term(&mut self, term: u64, vote: i64) -> Result<()> {
        self.term = term;
        self.vote = vote;
        let header = self.current_header();
        self.log_file.write_header(&header, self.no_fsync)
    }

    #[tracing::instrument(skip(self))]
    pub fn set_vote(&mut self, vote: i64) -> Result<()> {
        self.vote = vote;
        let header = self.current_header();
        self.log_file.write_header(&header, self.no_fsync)
    }

    pub fn first_idx(&self) -> u64 {
        self.snapshot_last_idx
    }

    pub fn current_idx(&self) -> u64 {
        self.index
    }

    pub fn count(&self) -> u64 {
        self.num_entries
    }

    pub fn term(&self) -> u64 {
        self.term
    }

    pub fn vote(&self) -> i64 {
        self.vote
    }

    pub fn dbid(&self) -> &str {
        &self.dbid
    }

    pub fn snapshot_last_term(&self) -> u64 {
        self.snapshot_last_term
    }

    /// Test hook for invariant 9 (cache-serves-the-tail).
    pub fn is_cached(&self, idx: u64) -> bool {
        self.cache.contains(idx)
    }

    /// File length of the log file, exposed for tests that check a header
    /// rewrite left the file's total length unchanged.
    pub fn log_file_len(&self) -> Result<u64> {
        self.log_file.len()
    }
}
