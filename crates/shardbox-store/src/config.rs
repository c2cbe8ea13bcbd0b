use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`LocalDiskStore`](crate::LocalDiskStore).
///
/// Loadable from TOML; every field has a default.
///
/// ```toml
/// root = "/var/lib/shardbox"
/// poll_interval_ms = 100
///
/// [partitions]
/// queue-sync = "queue-sync"      # relative: <root>/partition/queue-sync
/// mirror = "/mnt/mirror/blobs"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root of the default partition's shard tree.
    pub root: PathBuf,
    /// Named partitions and their roots.
    pub partitions: BTreeMap<String, PathBuf>,
    /// Sleep between re-scans while long-polling.
    pub poll_interval_ms: u64,
    /// Upper bound on a caller's requested wait.
    pub max_wait_secs: u64,
    /// Capacity of the bounded channel between producer and consumer.
    pub channel_capacity: usize,
    /// Limit applied when a caller does not supply one.
    pub default_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            partitions: BTreeMap::new(),
            poll_interval_ms: 100,
            max_wait_secs: 600,
            channel_capacity: 256,
            default_limit: 5000,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(StoreError::Config("poll_interval_ms must be positive".into()));
        }
        if self.channel_capacity == 0 {
            return Err(StoreError::Config("channel_capacity must be positive".into()));
        }
        if self.default_limit == 0 {
            return Err(StoreError::Config("default_limit must be positive".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}
