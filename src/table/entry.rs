//! File entry definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One backing file occupying a fixed range of the address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path exactly as supplied when the entry was added
    pub path: PathBuf,

    /// Path resolved against the base directory at add time; all I/O uses this
    pub location: PathBuf,

    /// Size in bytes, fixed at creation
    pub size: u64,
}

impl FileEntry {
    /// Create an entry, resolving `path` against `base_dir`
    ///
    /// Absolute paths are kept as-is.
    pub fn new(base_dir: &Path, path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let location = if path.is_absolute() {
            path.clone()
        } else {
            base_dir.join(&path)
        };

        Self {
            path,
            location,
            size,
        }
    }
}
