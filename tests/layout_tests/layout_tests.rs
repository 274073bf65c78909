//! Tests for the layout manifest
//!
//! These tests verify:
//! - Save/load restores the same table
//! - Reopening from a layout keeps existing file contents
//! - Layouts built from a relative base directory hold absolute locations
//! - Read-only reopening never modifies or creates backing files
//! - Corrupted, truncated or foreign manifests are rejected

use std::env;
use std::fs;
use std::path::PathBuf;

use sparsefile::layout::{decode, encode};
use sparsefile::{Allocator, Config, Layout, Provisioned, SparseError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_layout() -> (TempDir, Allocator, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let mut allocator = Allocator::with_config(Config::builder().base_dir(temp_dir.path()).build());

    allocator.add_file("movie/part1.mkv", 700).unwrap();
    allocator.add_file("movie/part2.mkv", 300).unwrap();
    allocator.add_file("movie/readme.txt", 0).unwrap();

    let manifest = temp_dir.path().join("payload.layout");
    (temp_dir, allocator, manifest)
}

/// A temp dir under the working directory, plus its path relative to it
fn setup_relative_dir() -> (TempDir, PathBuf) {
    let cwd = env::current_dir().unwrap();
    let temp_dir = TempDir::new_in(&cwd).unwrap();
    let relative = temp_dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
    (temp_dir, relative)
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_save_and_load() {
    let (_temp, allocator, manifest) = setup_layout();
    let layout = allocator.layout().unwrap();

    layout.save(&manifest).unwrap();
    let loaded = Layout::load(&manifest).unwrap();

    assert_eq!(loaded, layout);
    assert_eq!(loaded.total_size(), 1000);
    assert_eq!(loaded.entries.len(), 3);
}

#[test]
fn test_reopen_from_layout_keeps_data() {
    let (_temp, mut allocator, manifest) = setup_layout();
    allocator.write(690, &[5u8; 20]).unwrap();
    allocator.layout().unwrap().save(&manifest).unwrap();
    drop(allocator);

    let reopened = Allocator::from_layout(Layout::load(&manifest).unwrap(), Config::default()).unwrap();

    assert_eq!(reopened.file_count(), 3);
    assert_eq!(reopened.total_size(), 1000);
    assert_eq!(reopened.read(690, 20).unwrap(), vec![5u8; 20]);
}

#[test]
fn test_from_layout_adopts_base_dir() {
    let (temp, allocator, _manifest) = setup_layout();

    let reopened = Allocator::from_layout(allocator.layout().unwrap(), Config::default()).unwrap();

    assert_eq!(reopened.base_dir(), temp.path());
    assert_eq!(reopened.file_path(1).unwrap(), allocator.file_path(1).unwrap());
}

#[test]
fn test_from_layout_recreates_missing_files() {
    let (temp, allocator, _manifest) = setup_layout();
    let layout = allocator.layout().unwrap();
    fs::remove_dir_all(temp.path().join("movie")).unwrap();

    let reopened = Allocator::from_layout(layout, Config::default()).unwrap();

    assert_eq!(fs::metadata(temp.path().join("movie/part1.mkv")).unwrap().len(), 700);
    assert_eq!(reopened.read(0, 4).unwrap(), vec![0u8; 4]);
}

#[test]
fn test_reopen_reports_unchanged_files() {
    let (temp, _allocator, _manifest) = setup_layout();

    let mut fresh = Allocator::with_config(Config::builder().base_dir(temp.path()).build());

    assert_eq!(fresh.add_file("movie/part1.mkv", 700).unwrap(), Provisioned::Unchanged);
}

#[test]
fn test_empty_layout() {
    let allocator = Allocator::new();

    let bytes = encode(&allocator.layout().unwrap()).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert!(decoded.entries.is_empty());
    assert_eq!(decoded.total_size(), 0);
}

// =============================================================================
// Relative Base Directory Tests
// =============================================================================

#[test]
fn test_relative_base_directory_is_made_absolute() {
    let (_temp, relative) = setup_relative_dir();
    assert!(relative.is_relative());

    let mut allocator = Allocator::new();
    allocator.set_base_directory(&relative).unwrap();
    allocator.add_file("a.bin", 10).unwrap();
    allocator.add_file("b.bin", 10).unwrap();
    allocator.write(5, b"HELLOWORLD").unwrap();

    let canonical = fs::canonicalize(&relative).unwrap();
    let layout = allocator.layout().unwrap();

    assert!(allocator.base_dir().is_absolute());
    assert_eq!(layout.base_dir, canonical);
    assert_eq!(layout.entries[0].location, canonical.join("a.bin"));
    assert_eq!(layout.entries[1].location, canonical.join("b.bin"));
    assert_eq!(layout.entries[0].path, PathBuf::from("a.bin"));

    let reopened = Allocator::open_layout(layout, Config::default()).unwrap();
    assert_eq!(reopened.read(5, 10).unwrap(), &b"HELLOWORLD"[..]);
}

#[test]
fn test_relative_config_base_dir_gives_absolute_locations() {
    let (_temp, relative) = setup_relative_dir();

    let mut allocator = Allocator::with_config(Config::builder().base_dir(&relative).build());
    allocator.add_file("nested/c.bin", 4).unwrap();

    let layout = allocator.layout().unwrap();

    assert!(layout.base_dir.is_absolute());
    assert!(layout.entries[0].location.is_absolute());
    assert!(relative.join("nested/c.bin").is_file());
}

// =============================================================================
// Read-only Reopen Tests
// =============================================================================

#[test]
fn test_open_layout_reads_existing_payload() {
    let (_temp, mut allocator, manifest) = setup_layout();
    allocator.write(695, b"0123456789").unwrap();
    allocator.layout().unwrap().save(&manifest).unwrap();

    let reopened = Allocator::open_layout(Layout::load(&manifest).unwrap(), Config::default()).unwrap();

    assert_eq!(reopened.file_count(), 3);
    assert_eq!(reopened.total_size(), 1000);
    assert_eq!(reopened.read(695, 10).unwrap(), &b"0123456789"[..]);
}

#[test]
fn test_open_layout_leaves_wrong_size_file_untouched() {
    let (temp, allocator, _manifest) = setup_layout();
    let layout = allocator.layout().unwrap();
    let part2 = temp.path().join("movie/part2.mkv");
    fs::write(&part2, b"drifted").unwrap();

    let err = Allocator::open_layout(layout, Config::default()).unwrap_err();

    assert!(matches!(
        err,
        SparseError::SizeMismatch {
            expected: 300,
            actual: 7,
            ..
        }
    ));
    assert_eq!(fs::read(&part2).unwrap(), b"drifted");
}

#[test]
fn test_open_layout_reports_missing_file() {
    let (temp, allocator, _manifest) = setup_layout();
    let layout = allocator.layout().unwrap();
    let part1 = temp.path().join("movie/part1.mkv");
    fs::remove_file(&part1).unwrap();

    let err = Allocator::open_layout(layout, Config::default()).unwrap_err();

    assert!(matches!(err, SparseError::Open { .. }));
    assert!(!part1.exists());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_bad_magic() {
    let (_temp, allocator, _manifest) = setup_layout();
    let mut bytes = encode(&allocator.layout().unwrap()).unwrap();
    bytes[0..4].copy_from_slice(b"NOPE");

    assert!(matches!(decode(&bytes), Err(SparseError::Layout(_))));
}

#[test]
fn test_bad_version() {
    let (_temp, allocator, _manifest) = setup_layout();
    let mut bytes = encode(&allocator.layout().unwrap()).unwrap();
    bytes[4..6].copy_from_slice(&99u16.to_le_bytes());

    assert!(matches!(decode(&bytes), Err(SparseError::Layout(_))));
}

#[test]
fn test_corrupted_body_fails_crc() {
    let (_temp, allocator, _manifest) = setup_layout();
    let mut bytes = encode(&allocator.layout().unwrap()).unwrap();
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;

    let err = decode(&bytes).unwrap_err();

    assert!(matches!(err, SparseError::Layout(ref msg) if msg.contains("CRC")));
}

#[test]
fn test_truncated_manifest() {
    let (_temp, allocator, _manifest) = setup_layout();
    let bytes = encode(&allocator.layout().unwrap()).unwrap();

    assert!(matches!(
        decode(&bytes[..bytes.len() - 1]),
        Err(SparseError::Layout(_))
    ));
    assert!(matches!(decode(&bytes[..6]), Err(SparseError::Layout(_))));
    assert!(matches!(decode(&[]), Err(SparseError::Layout(_))));
}

#[test]
fn test_load_missing_manifest_is_io_error() {
    let temp = TempDir::new().unwrap();

    let result = Layout::load(&temp.path().join("missing.layout"));

    assert!(matches!(result, Err(SparseError::Io(_))));
}
