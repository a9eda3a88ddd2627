//! Circular buffer of recently appended entries, keyed by contiguous log
//! index. Purely advisory: every method here can be (and, on a cache miss
//! or an inconsistent request, must be) bypassed in favor of reading the
//! log file through the index file.

use crate::entry::Entry;
use crate::error::CacheRangeError;

/// Matches `ENTRY_CACHE_INIT_SIZE` in the original C source.
const DEFAULT_CAPACITY: usize = 512;

pub struct EntryCache {
    ptrs: Vec<Option<Entry>>,
    start: usize,
    len: usize,
    size: usize,
    start_idx: u64,
}

impl Default for EntryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(initial_size: usize) -> Self {
        let size = initial_size.max(1);
        EntryCache {
            ptrs: vec![None; size],
            start: 0,
            len: 0,
            size,
            start_idx: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start_idx(&self) -> u64 {
        self.start_idx
    }

    /// Test hook for invariant 9: whether `idx` is currently cached,
    /// without taking out a new reference.
    pub fn contains(&self, idx: u64) -> bool {
        idx >= self.start_idx && (idx - self.start_idx) < self.len as u64
    }

    /// Appends `e` at `idx`. The caller must maintain the lockstep
    /// invariant `start_idx + len == idx` (or the cache is empty, in which
    /// case `idx` becomes the new `start_idx`); violating it is a caller
    /// bug, not a recoverable condition.
    pub fn append(&mut self, e: Entry, idx: u64) {
        if self.len == 0 {
            self.start_idx = idx;
        } else {
            debug_assert_eq!(
                self.start_idx + self.len as u64,
                idx,
                "cache append is not contiguous with the held range"
            );
        }

        if self.len == self.size {
            self.grow();
        }

        let slot = (self.start + self.len) % self.size;
        self.ptrs[slot] = Some(e.hold());
        self.len += 1;
    }

    /// Doubles capacity, relocating the wrapped head region so the logical
    /// sequence stays contiguous modulo the new size. Only called when the
    /// ring is full (`len == size`).
    fn grow(&mut self) {
        let old_size = self.size;
        let new_size = old_size * 2;
        self.ptrs.resize(new_size, None);
        if self.start > 0 {
            for i in 0..self.start {
                self.ptrs[old_size + i] = self.ptrs[i].take();
            }
        }
        self.size = new_size;
    }

    pub fn get(&self, idx: u64) -> Option<Entry> {
        if idx < self.start_idx {
            return None;
        }
        let relidx = (idx - self.start_idx) as usize;
        if relidx >= self.len {
            return None;
        }
        let slot = (self.start + relidx) % self.size;
        self.ptrs[slot].as_ref().map(Entry::hold)
    }

    /// Evicts entries with index `< first_idx`. Returns the number evicted.
    pub fn delete_head(&mut self, first_idx: u64) -> Result<u64, CacheRangeError> {
        if first_idx < self.start_idx {
            return Err(CacheRangeError);
        }

        let mut deleted = 0u64;
        while first_idx > self.start_idx && self.len > 0 {
            self.start_idx += 1;
            self.ptrs[self.start] = None;
            self.start = (self.start + 1) % self.size;
            self.len -= 1;
            deleted += 1;
        }

        if self.len == 0 {
            self.start_idx = 0;
        }

        Ok(deleted)
    }

    /// Evicts entries with index `>= idx`. Returns the number evicted.
    pub fn delete_tail(&mut self, idx: u64) -> Result<u64, CacheRangeError> {
        if idx >= self.start_idx + self.len as u64 || idx < self.start_idx {
            return Err(CacheRangeError);
        }

        let end = self.start_idx + self.len as u64;
        let mut deleted = 0u64;
        let mut i = idx;
        while i < end {
            let relidx = (i - self.start_idx) as usize;
            let slot = (self.start + relidx) % self.size;
            self.ptrs[slot] = None;
            deleted += 1;
            i += 1;
        }

        self.len -= deleted as usize;
        if self.len == 0 {
            self.start_idx = 0;
        }

        Ok(deleted)
    }
}
