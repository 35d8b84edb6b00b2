//! Configuration types for ObjectIO
//!
//! This module defines the configuration read at startup, before any
//! disk is touched.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reserved volume holding the store's own bookkeeping
pub const DEFAULT_META_VOLUME: &str = ".objectio.sys";

/// Prefix inside the metadata volume for in-flight temporary objects
pub const DEFAULT_TMP_PREFIX: &str = "tmp";

/// Root configuration for ObjectIO
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node configuration
    pub node: NodeConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check that the configuration can drive a bootstrap pass
    pub fn validate(&self) -> Result<()> {
        if self.storage.disks.is_empty() {
            return Err(Error::configuration("no disks configured"));
        }
        if self.storage.meta_volume.is_empty() {
            return Err(Error::configuration("storage.meta_volume must not be empty"));
        }
        if self.storage.tmp_prefix.is_empty() {
            return Err(Error::configuration("storage.tmp_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Node identity configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name (human-readable identifier)
    pub name: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "objectio-node".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Disks to bring up, in order. The position is the disk index.
    pub disks: Vec<DiskConfig>,
    /// Name of the reserved metadata volume
    pub meta_volume: String,
    /// Temporary object prefix inside the metadata volume
    pub tmp_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            disks: Vec::new(),
            meta_volume: DEFAULT_META_VOLUME.to_string(),
            tmp_prefix: DEFAULT_TMP_PREFIX.to_string(),
        }
    }
}

/// Configuration for a single disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiskConfig {
    /// Root directory of the disk
    pub path: PathBuf,
}

impl From<&str> for DiskConfig {
    fn from(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}
