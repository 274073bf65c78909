//! Allocator Module
//!
//! The owned handle applications use to build and access a multi-file
//! address space.
//!
//! ## Responsibilities
//! - Append entries and provision their backing files
//! - Resolve relative entry paths against an instance-local base directory
//! - Route reads/writes through the I/O engine
//! - Snapshot and restore the table as a layout manifest

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::config::Config;
use crate::engine;
use crate::error::{Result, SparseError};
use crate::layout::Layout;
use crate::provision::{self, Provisioned};
use crate::table::{FileEntry, FileTable, Location};

/// A virtual byte address space backed by sparse files
///
/// ## Concurrency:
/// - No internal locking. Mutating operations take `&mut self`.
/// - Callers sharing one allocator across threads must serialize access.
#[derive(Debug, Clone)]
pub struct Allocator {
    /// Allocator configuration (base directory, file mode, retries)
    config: Config,

    /// Ordered entries defining the address space
    table: FileTable,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    /// Create an empty allocator with the default config
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty allocator with the given config
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            table: FileTable::new(),
        }
    }

    /// Rebuild an allocator from a saved layout, provisioning every entry
    ///
    /// Correctly sized files (and their contents) are left untouched; missing
    /// or wrongly sized ones are rematerialized. Use `open_layout` to access
    /// an existing payload without modifying anything on disk.
    pub fn from_layout(layout: Layout, config: Config) -> Result<Self> {
        let mut config = config;
        config.base_dir = layout.base_dir;

        let mut allocator = Self::with_config(config);
        for entry in layout.entries {
            allocator.provision(entry)?;
        }

        Ok(allocator)
    }

    /// Reopen a saved layout without touching the filesystem
    ///
    /// Every entry must already exist as a file of exactly its declared size;
    /// otherwise `Open` (missing) or `SizeMismatch` is returned and nothing is
    /// created or rewritten.
    pub fn open_layout(layout: Layout, config: Config) -> Result<Self> {
        let mut config = config;
        config.base_dir = layout.base_dir.clone();

        tracing::debug!(
            "Opening layout: {} entries, {} bytes",
            layout.entries.len(),
            layout.total_size()
        );

        let mut allocator = Self::with_config(config);
        for entry in layout.entries {
            let meta = fs::metadata(&entry.location).map_err(|source| SparseError::Open {
                path: entry.location.clone(),
                source,
            })?;

            if !meta.is_file() || meta.len() != entry.size {
                return Err(SparseError::SizeMismatch {
                    path: entry.location,
                    expected: entry.size,
                    actual: meta.len(),
                });
            }

            allocator.table.push(entry)?;
        }

        Ok(allocator)
    }

    /// Append a file of `size` bytes and make sure it exists on disk
    ///
    /// Relative paths are resolved against the current base directory now,
    /// into an absolute location; later base directory or working directory
    /// changes do not move the entry.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, size: u64) -> Result<Provisioned> {
        let base_dir = absolute(&self.config.base_dir)?;
        let entry = FileEntry::new(&base_dir, path, size);
        self.provision(entry)
    }

    /// Change the base directory used for entries added from now on
    ///
    /// A relative path is made absolute against the working directory at the
    /// time of the call.
    pub fn set_base_directory(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();

        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(SparseError::BaseDirectory(path)),
        }
        let path = absolute(&path)?;

        tracing::debug!("Base directory set to {}", path.display());
        self.config.base_dir = path;
        Ok(())
    }

    /// Write all of `data` starting at global `offset`
    ///
    /// Fails with `AddressOutOfRange` if the range runs past the end of the
    /// address space; chunks before that point remain written.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        engine::write(&self.table, &self.config, offset, data)
    }

    /// Read up to `len` bytes starting at global `offset`
    ///
    /// The result is shorter than `len` when the range runs past
    /// `total_size()`, and empty when `offset` is already at or past it.
    pub fn read(&self, offset: u64, len: usize) -> Result<Bytes> {
        engine::read(&self.table, &self.config, offset, len)
    }

    /// Translate a global offset into its entry
    pub fn locate(&self, offset: u64) -> Option<Location> {
        self.table.locate(offset)
    }

    /// Snapshot the current table for persisting
    ///
    /// Entry locations are absolute, so the snapshot does not depend on the
    /// working directory it is later loaded from.
    pub fn layout(&self) -> Result<Layout> {
        Ok(Layout {
            base_dir: absolute(&self.config.base_dir)?,
            entries: self.table.entries().to_vec(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of files added
    pub fn file_count(&self) -> usize {
        self.table.len()
    }

    /// Path of the file at `index`, as it was supplied to `add_file`
    pub fn file_path(&self, index: usize) -> Result<&Path> {
        self.table.get(index).map(|entry| entry.path.as_path())
    }

    /// Entry at `index`
    pub fn entry(&self, index: usize) -> Result<&FileEntry> {
        self.table.get(index)
    }

    /// All entries in address order
    pub fn entries(&self) -> &[FileEntry] {
        self.table.entries()
    }

    /// Total size of the address space in bytes
    pub fn total_size(&self) -> u64 {
        self.table.total_size()
    }

    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn provision(&mut self, entry: FileEntry) -> Result<Provisioned> {
        // Reject overflow before touching the filesystem
        self.table
            .total_size()
            .checked_add(entry.size)
            .ok_or(SparseError::SizeOverflow)?;

        let outcome = provision::ensure_file(&entry.location, entry.size, self.config.file_mode)?;
        self.table.push(entry)?;
        Ok(outcome)
    }
}

/// Make a relative path absolute against the working directory
///
/// Existing paths are canonicalized; others are joined onto the current
/// directory so that not-yet-created base directories still work.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(_) => Ok(env::current_dir()?.join(path)),
    }
}
