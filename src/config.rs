//! Configuration surface for opening or creating a log. Validated at
//! construction, before any file I/O, rejecting bad input at the
//! boundary rather than deep in the write path.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::header::RAFT_DBID_LEN;

#[derive(Debug, Clone)]
pub struct RaftLogConfig {
    pub(crate) path: PathBuf,
    pub(crate) dbid: String,
    pub(crate) no_fsync: bool,
}

impl RaftLogConfig {
    pub fn new(path: impl Into<PathBuf>, dbid: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let dbid = dbid.into();

        if path.as_os_str().is_empty() {
            return Err(Error::malformed("log path must not be empty"));
        }
        if dbid.len() > RAFT_DBID_LEN {
            return Err(Error::malformed(format!(
                "dbid length {} exceeds RAFT_DBID_LEN ({RAFT_DBID_LEN})",
                dbid.len()
            )));
        }

        Ok(RaftLogConfig {
            path,
            dbid,
            no_fsync: false,
        })
    }

    /// When `true`, writes are flushed but not fsynced: faster, but a
    /// crash may lose the tail of the log. Off by default.
    pub fn with_no_fsync(mut self, no_fsync: bool) -> Self {
        self.no_fsync = no_fsync;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn index_path(&self) -> PathBuf {
        let mut os_string = self.path.clone().into_os_string();
        os_string.push(".idx");
        PathBuf::from(os_string)
    }

    pub(crate) fn index_file_path(&self) -> PathBuf {
        self.index_path()
    }
}
