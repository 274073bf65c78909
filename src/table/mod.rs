//! File Table Module
//!
//! Ordered, append-only list of backing files that defines the layout of
//! the virtual address space.
//!
//! ## Layout
//! ```text
//!  global offset 0                                         total_size
//!  ├──────────────┬────────────────────────┬─┬──────────────┤
//!  │   entry 0    │        entry 1         │ │   entry 3    │
//!  │  [0, s0)     │     [s0, s0+s1)        │ │              │
//!  └──────────────┴────────────────────────┴─┴──────────────┘
//!                                           ▲
//!                                  entry 2 (size 0, never selected)
//! ```
//!
//! Entries are never removed or reordered once appended.

mod entry;
mod locate;

pub use entry::FileEntry;
pub use locate::Location;

use crate::error::{Result, SparseError};

/// Ordered sequence of file entries
#[derive(Debug, Default, Clone)]
pub struct FileTable {
    entries: Vec<FileEntry>,

    /// Sum of all entry sizes, maintained on append
    total_size: u64,
}

impl FileTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the address space
    ///
    /// Fails only if the total size would overflow `u64`.
    pub fn push(&mut self, entry: FileEntry) -> Result<()> {
        self.total_size = self
            .total_size
            .checked_add(entry.size)
            .ok_or(SparseError::SizeOverflow)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of the address space in bytes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Get an entry by index
    pub fn get(&self, index: usize) -> Result<&FileEntry> {
        self.entries.get(index).ok_or(SparseError::IndexOutOfRange {
            index,
            count: self.entries.len(),
        })
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Iterate entries together with their global starting offset
    pub fn spans(&self) -> impl Iterator<Item = (u64, &FileEntry)> + '_ {
        self.entries.iter().scan(0u64, |start, entry| {
            let current = *start;
            *start += entry.size;
            Some((current, entry))
        })
    }
}
