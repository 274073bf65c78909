//! Layout Manifest Module
//!
//! Persists an allocator's file table so a payload can be reopened without
//! declaring every file again.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (10 bytes)                                       │
//! │   Magic: "SFAL" (4) | Version: u16 (2) | BodyLen: u32 (4)│
//! ├─────────────────────────────────────────────────────────┤
//! │ Body (BodyLen bytes)                                    │
//! │   bincode(Layout { base_dir, entries })                 │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   BodyCRC: u32                                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The CRC only protects the manifest. Backing file contents are never
//! checked.

mod codec;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::FileEntry;

pub use codec::{decode, encode};

// =============================================================================
// Format Constants
// =============================================================================

/// Magic bytes identifying a layout manifest
pub(crate) const MAGIC: &[u8; 4] = b"SFAL";

/// Current manifest format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + BodyLen (4) = 10 bytes
pub(crate) const HEADER_SIZE: usize = 10;

/// Footer size: BodyCRC (4) = 4 bytes
pub(crate) const FOOTER_SIZE: usize = 4;

// =============================================================================
// Layout
// =============================================================================

/// Snapshot of an allocator's table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Base directory at the time of the snapshot
    pub base_dir: PathBuf,

    /// Entries in address order, with their resolved locations
    pub entries: Vec<FileEntry>,
}

impl Layout {
    /// Total size described by the layout
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|entry| entry.size).sum()
    }

    /// Write the manifest to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = encode(self)?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;

        tracing::debug!(
            "Saved layout with {} entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Read and validate the manifest at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        decode(&bytes)
    }
}
