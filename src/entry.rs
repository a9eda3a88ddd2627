//! The persistent entry type and its reference-counted handle.
//!
//! The original log keeps a manual refcount on `raft_entry_t` that the
//! consuming library increments (`hold`) and decrements (`release`). In
//! Rust that bookkeeping is just `Arc` sharing: [`Entry`] is a thin
//! `Arc<LogEntryData>` wrapper, `hold` clones it and `release` is drop.
//! The names are kept so the contract described by the surrounding
//! consensus engine stays visible at call sites.

use std::sync::Arc;

/// A single replicated log entry's durable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntryData {
    pub term: u64,
    pub id: u64,
    pub entry_type: u32,
    pub data: Vec<u8>,
}

/// A held reference to a [`LogEntryData`]. Cheap to clone; the entry is
/// freed once the last `Entry` referencing it is dropped.
#[derive(Debug, Clone)]
pub struct Entry(Arc<LogEntryData>);

impl Entry {
    pub fn new(term: u64, id: u64, entry_type: u32, data: Vec<u8>) -> Self {
        Entry(Arc::new(LogEntryData {
            term,
            id,
            entry_type,
            data,
        }))
    }

    /// Take out another reference on behalf of a new holder (e.g. the
    /// cache). Equivalent to `raft_entry_hold`.
    pub fn hold(&self) -> Entry {
        Entry(Arc::clone(&self.0))
    }

    pub fn term(&self) -> u64 {
        self.0.term
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn entry_type(&self) -> u32 {
        self.0.entry_type
    }

    pub fn data(&self) -> &[u8] {
        &self.0.data
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Entry {}

/// Dropping the last handle releases the entry (`raft_entry_release`).
/// No explicit method is needed: this impl exists purely to document the
/// mapping from the original design's `release` operation onto `Drop`.
impl Drop for Entry {
    fn drop(&mut self) {}
}
