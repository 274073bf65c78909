//! Error types for sparsefile
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using SparseError
pub type Result<T> = std::result::Result<T, SparseError>;

/// Unified error type for sparsefile operations
#[derive(Debug, Error)]
pub enum SparseError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A backing file could not be opened for a chunk
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not seek to {offset} in {path}: {source}")]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// The underlying read or write returned zero bytes
    #[error("no progress on {path} at local offset {offset}")]
    ZeroProgress { path: PathBuf, offset: u64 },

    /// An existing backing file does not have its declared size
    #[error("{path} is {actual} bytes, expected {expected}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("could not provision {path}: {source}")]
    Provision {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Address Space Errors
    // -------------------------------------------------------------------------
    #[error("offset {offset} is outside the address space (total size {total_size})")]
    AddressOutOfRange { offset: u64, total_size: u64 },

    #[error("file index {index} out of range (file count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("total size overflows u64")]
    SizeOverflow,

    // -------------------------------------------------------------------------
    // Layout Errors
    // -------------------------------------------------------------------------
    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("not a directory: {0}")]
    BaseDirectory(PathBuf),
}

impl From<bincode::Error> for SparseError {
    fn from(e: bincode::Error) -> Self {
        SparseError::Serialization(e.to_string())
    }
}
