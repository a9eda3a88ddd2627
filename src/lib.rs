//! A persistent, append-mostly Raft log paired with an in-memory entry
//! cache: the durable log substrate used by a consensus replica.
//!
//! This crate implements the storage layer only. It does not know about
//! elections, replication, or commit logic — a consensus engine drives it
//! through the fixed operation set on [`RaftLog`]: `create`/`open` (the
//! original design's `init`), `append`, `get`/`get_batch`,
//! `delete_suffix` (`pop`), `poll_prefix` (`poll`), `reset`, `set_term`,
//! `set_vote`, and the `first_idx`/`current_idx`/`count` accessors.
//!
//! The crate is single-threaded and cooperative: every operation runs to
//! completion or returns an error, there is no internal locking, and no
//! operation is interruptible mid-write. Concurrent multi-writer access,
//! log rotation, compression, and per-entry checksums are explicitly out
//! of scope; see the module-level docs below for where each piece is
//! grounded.

mod cache;
mod codec;
mod config;
mod entry;
mod error;
mod header;
mod index_file;
mod log_file;
mod raft_log;

pub use config::RaftLogConfig;
pub use entry::{Entry, LogEntryData};
pub use error::{CacheRangeError, Error, Result};
pub use header::{LogHeader, RAFT_DBID_LEN};
pub use raft_log::RaftLog;
