//! A flat array of 64-bit byte offsets into the log file. Slot `k` holds
//! the offset of the entry whose index is `snapshot_last_idx + k`; slot 0
//! is always unused so that `relidx = idx - snapshot_last_idx` can be used
//! directly as a subscript with no off-by-one adjustment.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use byteorder::{LittleEndian, ByteOrder};

use crate::error::Result;

const SLOT_SIZE: u64 = 8;

pub(crate) struct IndexFile {
    file: File,
}

impl IndexFile {
    pub(crate) fn create(path: &Path) -> Result<IndexFile> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(IndexFile { file })
    }

    pub(crate) fn open(path: &Path) -> Result<IndexFile> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(IndexFile { file })
    }

    /// `put` — records `offset` for `index` at slot `index - snapshot_last_idx`.
    pub(crate) fn put(&mut self, relidx: u64, offset: u64) -> Result<()> {
        let mut buf = [0u8; SLOT_SIZE as usize];
        LittleEndian::write_u64(&mut buf, offset);
        self.file.write_at(&buf, relidx * SLOT_SIZE)?;
        Ok(())
    }

    /// `seek_to_entry` equivalent: reads the slot for the given relative
    /// index. Returns `None` if the slot has never been written (offset
    /// `0`, which only slot 0 ever legitimately holds).
    pub(crate) fn get(&self, relidx: u64) -> Result<Option<u64>> {
        let mut buf = [0u8; SLOT_SIZE as usize];
        match self.file.read_exact_at(&mut buf, relidx * SLOT_SIZE) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let offset = LittleEndian::read_u64(&buf);
        if offset == 0 {
            Ok(None)
        } else {
            Ok(Some(offset))
        }
    }

    pub(crate) fn truncate_to_empty(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        Ok(())
    }
}
