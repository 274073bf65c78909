//! Address translation
//!
//! Maps a global byte offset to the entry holding it.

use super::{FileEntry, FileTable};

/// Result of translating a global offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Index of the containing entry
    pub index: usize,

    /// Global offset at which that entry starts
    pub start: u64,
}

impl Location {
    /// Offset of `global_offset` relative to the start of the entry
    pub fn local_offset(&self, global_offset: u64) -> u64 {
        global_offset - self.start
    }
}

impl FileTable {
    /// Find the entry containing `offset`
    ///
    /// Linear scan in insertion order; the first entry whose half-open range
    /// `[start, start + size)` contains the offset wins, so zero-size entries
    /// are never returned. Returns `None` at or past `total_size`.
    pub fn locate(&self, offset: u64) -> Option<Location> {
        let mut bytes = 0u64;

        for (index, entry) in self.entries.iter().enumerate() {
            if bytes <= offset && offset < bytes + entry.size {
                return Some(Location {
                    index,
                    start: bytes,
                });
            }
            bytes += entry.size;
        }

        None
    }

    /// Like `locate`, but also returns the entry itself
    pub fn locate_entry(&self, offset: u64) -> Option<(Location, &FileEntry)> {
        let location = self.locate(offset)?;
        Some((location, &self.entries[location.index]))
    }
}
