//! The log file's first record: format tag, version, cluster `dbid`, and
//! the mutable metadata fields (`snapshot_last_term`, `snapshot_last_idx`,
//! `term`, `vote`). Numeric fields are zero-padded to a fixed width so the
//! record's encoded byte length never changes, which is what lets the log
//! file rewrite the header in place.

use crate::codec::RecordWriter;
use crate::error::{Error, Result};

pub(crate) const RAFTLOG_MAGIC: &[u8] = b"RAFTLOG";
pub(crate) const RAFTLOG_VERSION: u32 = 1;

/// Maximum length, in bytes, of the `dbid` textual identifier.
pub const RAFT_DBID_LEN: usize = 32;

const PAD_VERSION: usize = 4;
const PAD_TERM: usize = 20;
const PAD_VOTE: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    pub dbid: String,
    pub snapshot_last_term: u64,
    pub snapshot_last_idx: u64,
    pub term: u64,
    pub vote: i64,
}

impl LogHeader {
    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut w = RecordWriter::write_begin(7);
        w.write_buffer(RAFTLOG_MAGIC);
        w.write_unsigned(RAFTLOG_VERSION as u64, PAD_VERSION);
        w.write_buffer(self.dbid.as_bytes());
        w.write_unsigned(self.snapshot_last_term, PAD_TERM);
        w.write_unsigned(self.snapshot_last_idx, PAD_TERM);
        w.write_unsigned(self.term, PAD_TERM);
        w.write_signed(self.vote, PAD_VOTE);
        w.finish()
    }

    pub(crate) fn decode(elements: &[Vec<u8>]) -> Result<LogHeader> {
        Self::decode_inner(elements).map_err(|e| {
            tracing::warn!(error = %e, "rejected malformed log header");
            e
        })
    }

    fn decode_inner(elements: &[Vec<u8>]) -> Result<LogHeader> {
        if elements.len() != 7 {
            return Err(Error::malformed(format!(
                "header has {} elements, expected 7",
                elements.len()
            )));
        }
        if elements[0] != RAFTLOG_MAGIC {
            return Err(Error::malformed("missing RAFTLOG magic tag"));
        }

        let version = parse_u64(&elements[1])? as u32;
        if version != RAFTLOG_VERSION {
            return Err(Error::malformed(format!(
                "unsupported log format version {version}"
            )));
        }

        let dbid = String::from_utf8(elements[2].clone())
            .map_err(|_| Error::malformed("dbid is not valid UTF-8"))?;
        if dbid.len() > RAFT_DBID_LEN {
            return Err(Error::malformed("dbid exceeds RAFT_DBID_LEN"));
        }

        Ok(LogHeader {
            dbid,
            snapshot_last_term: parse_u64(&elements[3])?,
            snapshot_last_idx: parse_u64(&elements[4])?,
            term: parse_u64(&elements[5])?,
            vote: parse_i64(&elements[6])?,
        })
    }
}

fn parse_u64(bytes: &[u8]) -> Result<u64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| Error::malformed("expected an unsigned decimal field"))
}

fn parse_i64(bytes: &[u8]) -> Result<i64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| Error::malformed("expected a signed decimal field"))
}
