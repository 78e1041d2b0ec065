//! Configuration for the ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Actor mailbox capacity (pending invocations)
    pub mailbox_capacity: usize,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Transfer policy
    pub transfer: TransferConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/restraint-ledger"),
            service_name: "restraint-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            mailbox_capacity: 1000,
            rocksdb: RocksDBConfig::default(),
            transfer: TransferConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Sync the WAL on every commit
    pub sync_writes: bool,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 2,
            max_background_jobs: 2,
            sync_writes: true,
            enable_statistics: false,
        }
    }
}

/// Transfer policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Reject zero and negative transfer amounts the way recharge and withdraw do.
    ///
    /// Off by default: transfers historically accept any parseable amount.
    pub reject_non_positive_amounts: bool,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("RESTRAINT_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(flag) = std::env::var("RESTRAINT_LEDGER_REJECT_NON_POSITIVE") {
            config.transfer.reject_non_positive_amounts = flag.parse().map_err(|_| {
                crate::Error::Config(format!(
                    "RESTRAINT_LEDGER_REJECT_NON_POSITIVE must be true or false, got {}",
                    flag
                ))
            })?;
        }

        Ok(config)
    }
}
