//! I/O Engine
//!
//! Reads and writes arbitrary byte ranges of the virtual address space,
//! splitting them at entry boundaries.
//!
//! ## Chunking
//! ```text
//!  sizes [10, 10], write(offset = 5, len = 10)
//!
//!  global   0    5    10   15   20
//!           ├────┼────┼────┼────┤
//!  entry 0  │    │████│         local 5..10  ← data[0..5)
//!  entry 1            │████│    local 0..5   ← data[5..10)
//! ```
//!
//! Every chunk translates the current offset, clamps to the bytes left in the
//! containing entry, opens the backing file, seeks, transfers and closes.
//! No handles are kept between chunks or calls.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::{Bytes, BytesMut};

use crate::config::Config;
use crate::error::{Result, SparseError};
use crate::table::{FileEntry, FileTable};

/// Write all of `data` at `offset`
///
/// Aborts on the first failure. Chunks already written to earlier entries are
/// not rolled back, so after an error the written extent is unspecified.
pub fn write(table: &FileTable, config: &Config, offset: u64, data: &[u8]) -> Result<()> {
    let mut offset = offset;
    let mut remaining = data;

    while !remaining.is_empty() {
        let (location, entry) = table
            .locate_entry(offset)
            .ok_or(SparseError::AddressOutOfRange {
                offset,
                total_size: table.total_size(),
            })?;

        let local = location.local_offset(offset);
        let len = chunk_len(entry, local, remaining.len());

        let mut file = open(entry, config, Access::ReadWrite)?;
        seek(&mut file, entry, local)?;
        write_chunk(&mut file, entry, local, &remaining[..len])?;

        tracing::trace!(
            "Wrote {} bytes to {} at local offset {}",
            len,
            entry.location.display(),
            local
        );

        offset += len as u64;
        remaining = &remaining[len..];
    }

    Ok(())
}

/// Read up to `len` bytes starting at `offset`
///
/// Returns fewer bytes than requested only when the range runs past the end
/// of the address space; the buffer then ends exactly at `total_size`.
pub fn read(table: &FileTable, config: &Config, offset: u64, len: usize) -> Result<Bytes> {
    let mut buf = BytesMut::zeroed(short_len(table, offset, len));
    let mut offset = offset;
    let mut filled = 0;

    while filled < buf.len() {
        let Some((location, entry)) = table.locate_entry(offset) else {
            break;
        };

        let local = location.local_offset(offset);
        let len = chunk_len(entry, local, buf.len() - filled);

        let mut file = open(entry, config, Access::Read)?;
        seek(&mut file, entry, local)?;
        read_chunk(&mut file, entry, local, &mut buf[filled..filled + len])?;

        tracing::trace!(
            "Read {} bytes from {} at local offset {}",
            len,
            entry.location.display(),
            local
        );

        offset += len as u64;
        filled += len;
    }

    buf.truncate(filled);
    Ok(buf.freeze())
}

// =============================================================================
// Private Helpers
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    ReadWrite,
}

/// Bytes that fit in `entry` from `local`, capped at `wanted`
fn chunk_len(entry: &FileEntry, local: u64, wanted: usize) -> usize {
    let available = entry.size - local;
    usize::try_from(available).map_or(wanted, |available| available.min(wanted))
}

/// Length actually readable from `offset`, given the end of the address space
fn short_len(table: &FileTable, offset: u64, len: usize) -> usize {
    let available = table.total_size().saturating_sub(offset);
    usize::try_from(available).map_or(len, |available| available.min(len))
}

/// Open an entry's backing file, retrying up to `config.open_retries` times
fn open(entry: &FileEntry, config: &Config, access: Access) -> Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    if let Access::ReadWrite = access {
        options.write(true);
    }

    let mut attempt = 0;
    loop {
        match options.open(&entry.location) {
            Ok(file) => return Ok(file),
            Err(e) if attempt < config.open_retries => {
                attempt += 1;
                tracing::warn!(
                    "Open of {} failed ({}), retry {}/{}",
                    entry.location.display(),
                    e,
                    attempt,
                    config.open_retries
                );
            }
            Err(source) => {
                return Err(SparseError::Open {
                    path: entry.location.clone(),
                    source,
                })
            }
        }
    }
}

fn seek(file: &mut File, entry: &FileEntry, local: u64) -> Result<()> {
    file.seek(SeekFrom::Start(local))
        .map_err(|source| SparseError::Seek {
            path: entry.location.clone(),
            offset: local,
            source,
        })?;
    Ok(())
}

fn write_chunk(file: &mut File, entry: &FileEntry, local: u64, mut chunk: &[u8]) -> Result<()> {
    let mut position = local;

    while !chunk.is_empty() {
        match file.write(chunk) {
            Ok(0) => return Err(zero_progress(&entry.location, position)),
            Ok(n) => {
                chunk = &chunk[n..];
                position += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn read_chunk(file: &mut File, entry: &FileEntry, local: u64, mut chunk: &mut [u8]) -> Result<()> {
    let mut position = local;

    while !chunk.is_empty() {
        match file.read(chunk) {
            // Backing file is shorter than its declared size
            Ok(0) => return Err(zero_progress(&entry.location, position)),
            Ok(n) => {
                let rest = chunk;
                chunk = &mut rest[n..];
                position += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn zero_progress(path: &Path, offset: u64) -> SparseError {
    SparseError::ZeroProgress {
        path: path.to_path_buf(),
        offset,
    }
}
