//! The log file: a header record followed by an append-only sequence of
//! entry records. All positioning is explicit (`write_at`/`read_at`) rather
//! than relying on the OS's O_APPEND cursor, so the header can be
//! overwritten in place without disturbing the tail and without the
//! close/reopen dance the original C implementation used.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::codec::{self, RecordWriter};
use crate::entry::LogEntryData;
use crate::error::{Error, Result};
use crate::header::LogHeader;

const ENTRY_TAG: &[u8] = b"ENTRY";

pub(crate) struct LogFile {
    file: File,
    /// Byte offset one past the last fully written entry; the position the
    /// next `append_entry` call writes to.
    end_offset: u64,
}

impl LogFile {
    pub(crate) fn create(path: &Path) -> Result<LogFile> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(LogFile {
            file,
            end_offset: 0,
        })
    }

    pub(crate) fn open(path: &Path) -> Result<LogFile> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(LogFile {
            file,
            end_offset: 0,
        })
    }

    /// Writes the header at offset 0. Safe to call both for the initial
    /// write (when the file is otherwise empty) and for an in-place
    /// rewrite on metadata changes: `end_offset` only ever grows.
    ///
    /// A failure here leaves the header in an unknown state (the in-place
    /// rewrite may have landed partially), so it is surfaced as
    /// `Error::Fatal` rather than a retryable `Error::Io` and logged at
    /// `error!` before propagating.
    pub(crate) fn write_header(&mut self, header: &LogHeader, no_fsync: bool) -> Result<()> {
        let bytes = header.encode();
        if let Err(e) = self.file.write_at(&bytes, 0) {
            tracing::error!(error = %e, "failed to rewrite log header");
            return Err(Error::Fatal(format!("header rewrite failed: {e}")));
        }
        self.end_offset = self.end_offset.max(bytes.len() as u64);
        if let Err(e) = codec::write_end(&self.file, no_fsync) {
            tracing::error!(error = %e, "failed to sync log header rewrite");
            return Err(Error::Fatal(format!("header rewrite sync failed: {e}")));
        }
        Ok(())
    }

    pub(crate) fn read_header(&self) -> Result<(LogHeader, u64)> {
        let mut pos = 0u64;
        let elements = codec::read_record(&self.file, &mut pos)?;
        let header = LogHeader::decode(&elements)?;
        Ok((header, pos))
    }

    /// Appends one entry record at `end_offset`, fsyncing per `no_fsync`.
    /// Returns the byte offset the entry's framing started at.
    pub(crate) fn append_entry(
        &mut self,
        term: u64,
        id: u64,
        entry_type: u32,
        data: &[u8],
        no_fsync: bool,
    ) -> Result<u64> {
        let mut w = RecordWriter::write_begin(5);
        w.write_buffer(ENTRY_TAG);
        w.write_unsigned(term, 0);
        w.write_unsigned(id, 0);
        w.write_unsigned(entry_type as u64, 0);
        w.write_buffer(data);
        let buf = w.finish();

        let offset = self.end_offset;
        self.file.write_at(&buf, offset)?;
        self.end_offset += buf.len() as u64;
        codec::write_end(&self.file, no_fsync)?;
        Ok(offset)
    }

    pub(crate) fn read_entry_at(&self, offset: u64) -> Result<LogEntryData> {
        let mut pos = offset;
        let elements = codec::read_record(&self.file, &mut pos)?;
        decode_entry(&elements)
    }

    /// Replays every entry starting at `start_pos` (immediately after the
    /// header), invoking `f(offset, entry)` for each one parsed. The first
    /// short read or unparseable record ends replay and is treated as a
    /// clean end-of-log: a torn tail write from a crash is silently
    /// dropped rather than failing the whole open.
    pub(crate) fn replay_entries(
        &self,
        start_pos: u64,
        mut f: impl FnMut(u64, LogEntryData),
    ) -> Result<u64> {
        let mut pos = start_pos;
        loop {
            let entry_offset = pos;
            let elements = match codec::read_record(&self.file, &mut pos) {
                Ok(elements) => elements,
                Err(_) => break,
            };
            let entry = match decode_entry(&elements) {
                Ok(entry) => entry,
                Err(_) => break,
            };
            f(entry_offset, entry);
        }
        Ok(pos.max(start_pos))
    }

    pub(crate) fn truncate_at(&mut self, offset: u64) -> Result<()> {
        self.file.set_len(offset)?;
        self.end_offset = offset;
        Ok(())
    }

    pub(crate) fn truncate_to_empty(&mut self) -> Result<()> {
        self.truncate_at(0)
    }

    pub(crate) fn set_end_offset(&mut self, offset: u64) {
        self.end_offset = offset;
    }

    pub(crate) fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}

fn decode_entry(elements: &[Vec<u8>]) -> Result<LogEntryData> {
    decode_entry_inner(elements).map_err(|e| {
        tracing::warn!(error = %e, "rejected malformed entry record");
        e
    })
}

fn decode_entry_inner(elements: &[Vec<u8>]) -> Result<LogEntryData> {
    if elements.len() != 5 {
        return Err(Error::malformed(format!(
            "entry record has {} elements, expected 5",
            elements.len()
        )));
    }
    if elements[0] != ENTRY_TAG {
        return Err(Error::malformed("expected ENTRY tag"));
    }

    let term = parse_u64(&elements[1])?;
    let id = parse_u64(&elements[2])?;
    let entry_type = parse_u64(&elements[3])? as u32;
    let data = elements[4].clone();

    Ok(LogEntryData {
        term,
        id,
        entry_type,
        data,
    })
}

fn parse_u64(bytes: &[u8]) -> Result<u64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| Error::malformed("expected an unsigned decimal field"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> LogHeader {
        LogHeader {
            dbid: "0123456789abcdef01234567890abcde".to_string(),
            snapshot_last_term: 0,
            snapshot_last_idx: 0,
            term: 1,
            vote: -1,
        }
    }

    #[test]
    fn append_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        let mut log = LogFile::create(&path).unwrap();
        log.write_header(&header(), true).unwrap();

        let offset = log.append_entry(1, 100, 2, b"x", true).unwrap();
        let entry = log.read_entry_at(offset).unwrap();
        assert_eq!(entry.term, 1);
        assert_eq!(entry.id, 100);
        assert_eq!(entry.entry_type, 2);
        assert_eq!(entry.data, b"x");
    }

    #[test]
    fn header_rewrite_does_not_change_file_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        let mut log = LogFile::create(&path).unwrap();
        log.write_header(&header(), true).unwrap();
        log.append_entry(1, 1, 0, b"data", true).unwrap();

        let len_before = log.len().unwrap();
        let mut h = header();
        h.term = 55;
        h.vote = 9;
        log.write_header(&h, true).unwrap();
        let len_after = log.len().unwrap();
        assert_eq!(len_before, len_after);
    }

    #[test]
    fn replay_stops_cleanly_at_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        let mut log = LogFile::create(&path).unwrap();
        log.write_header(&header(), true).unwrap();
        log.append_entry(1, 1, 0, b"a", true).unwrap();
        log.append_entry(1, 2, 0, b"b", true).unwrap();

        // simulate a torn write: truncate mid-record
        let full_len = log.len().unwrap();
        log.file.set_len(full_len - 2).unwrap();

        let (_header, start_pos) = log.read_header().unwrap();
        let mut seen = Vec::new();
        log.replay_entries(start_pos, |_offset, e| seen.push(e.id))
            .unwrap();
        assert_eq!(seen, vec![1]);
    }
}
