//! Sparse Provisioning
//!
//! Makes sure a backing file exists with an exact size, cheaply.
//!
//! ## Materialization
//! ```text
//!  offset 0                                         size - 1
//!  ┌──┬───────────────────────────────────────────────┬──┐
//!  │00│                 hole (unallocated)             │00│
//!  └──┴───────────────────────────────────────────────┴──┘
//! ```
//! Only the first and last byte are written, so creating a file costs the
//! same regardless of its size on filesystems with hole support. Holes read
//! back as zeros.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Result, SparseError};

/// What `ensure_file` did to the file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The file did not exist and was created
    Created,

    /// The file existed with a different size and was rematerialized
    Resized,

    /// The file already had the right size; nothing was written
    Unchanged,
}

/// Ensure `path` is a file of exactly `size` bytes
///
/// Idempotent: a file that already has the requested size is left untouched,
/// so data written to it earlier survives. Missing parent directories are
/// created best-effort; only the file materialization itself can fail.
pub fn ensure_file(path: &Path, size: u64, mode: u32) -> Result<Provisioned> {
    create_parents(path, mode);

    let outcome = match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() == size => {
            tracing::debug!("{} already provisioned ({} bytes)", path.display(), size);
            return Ok(Provisioned::Unchanged);
        }
        Ok(_) => Provisioned::Resized,
        Err(_) => Provisioned::Created,
    };

    materialize(path, size, mode).map_err(|source| SparseError::Provision {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("{:?} {} ({} bytes)", outcome, path.display(), size);
    Ok(outcome)
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Create each missing ancestor of `path`, one segment at a time
///
/// Failures are ignored: a collision with an existing directory (or a
/// segment we cannot create) is left for the file open to report.
fn create_parents(path: &Path, mode: u32) {
    let Some(parent) = path.parent() else {
        return;
    };

    let mut missing: Vec<&Path> = parent
        .ancestors()
        .filter(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        .collect();
    missing.reverse();

    for dir in missing {
        if let Err(e) = dir_builder(mode).create(dir) {
            tracing::warn!("Ignoring mkdir failure for {}: {}", dir.display(), e);
        }
    }
}

/// Write the first and last byte, leaving a hole in between
fn materialize(path: &Path, size: u64, mode: u32) -> std::io::Result<()> {
    let mut file = open_options(mode).open(path)?;

    if size == 0 {
        file.set_len(0)?;
        return Ok(());
    }

    file.seek(SeekFrom::Start(0))?;
    file.write_all(&[0])?;
    file.seek(SeekFrom::Start(size - 1))?;
    file.write_all(&[0])?;

    // A previously longer file keeps its tail otherwise
    if file.metadata()?.len() > size {
        file.set_len(size)?;
    }

    Ok(())
}

#[cfg(unix)]
fn open_options(mode: u32) -> OpenOptions {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .mode(mode);
    options
}

#[cfg(not(unix))]
fn open_options(_mode: u32) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    options
}

#[cfg(unix)]
fn dir_builder(mode: u32) -> DirBuilder {
    use std::os::unix::fs::DirBuilderExt;

    let mut builder = DirBuilder::new();
    builder.mode(mode);
    builder
}

#[cfg(not(unix))]
fn dir_builder(_mode: u32) -> DirBuilder {
    DirBuilder::new()
}
