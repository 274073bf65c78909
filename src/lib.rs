//! # sparsefile
//!
//! One contiguous virtual byte address space backed by many files:
//! - Ordered, append-only table of fixed-size backing files
//! - Sparse provisioning (files of any size created in O(1))
//! - Reads and writes that transparently span file boundaries
//! - Layout manifest to reopen a payload later
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Allocator                             │
//! │         add_file / write / read / set_base_directory         │
//! └──────────┬──────────────────────┬───────────────────┬───────┘
//!            │                      │                   │
//!            ▼                      ▼                   ▼
//!   ┌─────────────────┐    ┌─────────────────┐  ┌──────────────┐
//!   │   Provisioner   │    │    I/O Engine   │  │    Layout    │
//!   │ (sparse create) │    │ (chunked r/w)   │  │  (manifest)  │
//!   └────────┬────────┘    └────────┬────────┘  └──────────────┘
//!            │                      │
//!            │                      ▼
//!            │             ┌─────────────────┐
//!            │             │    FileTable    │
//!            │             │    (locate)     │
//!            │             └────────┬────────┘
//!            ▼                      ▼
//!   ┌─────────────────────────────────────────┐
//!   │          Backing files on disk          │
//!   └─────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod table;
pub mod provision;
pub mod engine;
pub mod layout;
pub mod allocator;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SparseError, Result};
pub use config::Config;
pub use allocator::Allocator;
pub use layout::Layout;
pub use provision::Provisioned;
pub use table::{FileEntry, Location};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of sparsefile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
