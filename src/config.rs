//! Configuration for sparsefile
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for an Allocator instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Path Configuration
    // -------------------------------------------------------------------------
    /// Directory that relative entry paths are resolved against.
    /// Resolution happens once, when the entry is added.
    pub base_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Provisioning Configuration
    // -------------------------------------------------------------------------
    /// Unix permission bits for newly created backing files and directories
    /// (before umask). Ignored on other platforms.
    pub file_mode: u32,

    // -------------------------------------------------------------------------
    // I/O Configuration
    // -------------------------------------------------------------------------
    /// Extra attempts at opening a backing file before a chunk fails
    pub open_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            file_mode: 0o777,
            open_retries: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base directory for relative entry paths
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        self
    }

    /// Set the permission bits for created files and directories
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Set how many times a failed open is retried
    pub fn open_retries(mut self, retries: u32) -> Self {
        self.config.open_retries = retries;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
