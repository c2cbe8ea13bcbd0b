//! On-disk shard tree.
//!
//! ```text
//! <root>/<algorithm-tag>/<first two hex digits>/<canonical address>
//! ```
//!
//! e.g. `<root>/sha256/2c/sha256:2c26b46b...`. Each shard holds only
//! addresses starting with `tag ":" prefix`, so shards are contiguous,
//! non-overlapping intervals of the global address order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use shardbox_types::{BlobDescriptor, ContentAddress, Cursor, HashAlgorithm};
use tracing::trace;

use crate::error::{StoreError, StoreResult};

/// Number of leading hex digits that name a shard directory.
pub const SHARD_PREFIX_LEN: usize = 2;

/// One shard directory: all blobs of `algorithm` whose hex digest starts
/// with `prefix`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shard {
    algorithm: HashAlgorithm,
    prefix: String,
    path: PathBuf,
}

impl Shard {
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The canonical-string prefix shared by every address in this shard.
    /// Sorting shards by key sorts them in global address order.
    pub fn key(&self) -> String {
        format!("{}:{}", self.algorithm, self.prefix)
    }

    /// Returns `true` if `address` belongs in this shard.
    pub fn contains(&self, address: &ContentAddress) -> bool {
        address.algorithm() == self.algorithm
            && address.hex_prefix(SHARD_PREFIX_LEN) == self.prefix
    }

    /// Returns `true` if every address this shard can hold sorts at or
    /// below `cursor`, so listing it cannot produce results.
    pub fn precedes(&self, cursor: &Cursor) -> bool {
        let Some(cursor) = cursor.address() else {
            return false;
        };
        let key = self.key();
        let cursor = cursor.to_string();
        let n = key.len().min(cursor.len());
        key.as_bytes() < &cursor.as_bytes()[..n]
    }
}

/// Maps content addresses to paths under one partition root and walks the
/// resulting tree.
///
/// The tree is treated as read-only, append-only data: blobs appear by
/// atomic rename and are never modified in place.
#[derive(Clone, Debug)]
pub struct ShardLayout {
    root: PathBuf,
}

impl ShardLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds (or will hold) `address`.
    pub fn shard_dir_for(&self, address: &ContentAddress) -> PathBuf {
        self.root
            .join(address.algorithm().tag())
            .join(address.hex_prefix(SHARD_PREFIX_LEN))
    }

    /// Final, published path of `address`.
    pub fn blob_path_for(&self, address: &ContentAddress) -> PathBuf {
        self.shard_dir_for(address).join(address.to_string())
    }

    /// Enumerate all shard directories, in no particular order.
    ///
    /// A missing root is an empty store. Entries that are not an algorithm
    /// directory containing two-hex-digit shard directories are ignored.
    pub fn list_shards(&self) -> StoreResult<Vec<Shard>> {
        let Some(algorithm_dirs) = read_dir_if_exists(&self.root)? else {
            return Ok(Vec::new());
        };

        let mut shards = Vec::new();
        for entry in algorithm_dirs {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let Some(algorithm) = entry
                .file_name()
                .to_str()
                .and_then(HashAlgorithm::from_tag)
            else {
                continue;
            };
            let algorithm_dir = entry.path();
            if !algorithm_dir.is_dir() {
                trace!(path = %algorithm_dir.display(), "skipping non-directory algorithm entry");
                continue;
            }
            let Some(prefix_dirs) = read_dir_if_exists(&algorithm_dir)? else {
                continue;
            };
            for prefix_entry in prefix_dirs {
                let prefix_entry = prefix_entry.map_err(|e| StoreError::io(&algorithm_dir, e))?;
                let name = prefix_entry.file_name();
                let Some(prefix) = name.to_str().filter(|n| is_shard_prefix(n)) else {
                    continue;
                };
                let path = prefix_entry.path();
                if !path.is_dir() {
                    continue;
                }
                shards.push(Shard {
                    algorithm,
                    prefix: prefix.to_string(),
                    path,
                });
            }
        }
        Ok(shards)
    }

    /// List the published blobs directly inside `shard`, in no particular
    /// order.
    ///
    /// Names that are not a canonical address belonging to this shard
    /// (in-progress temp files, strays) are skipped, not reported.
    pub fn list_entries(&self, shard: &Shard) -> StoreResult<Vec<BlobDescriptor>> {
        let Some(entries) = read_dir_if_exists(&shard.path)? else {
            return Ok(Vec::new());
        };

        let mut blobs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&shard.path, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                trace!(shard = %shard.key(), "skipping non-UTF-8 entry");
                continue;
            };
            let address = match ContentAddress::parse(name) {
                Ok(address) if shard.contains(&address) => address,
                Ok(_) => {
                    trace!(shard = %shard.key(), name, "skipping blob filed under the wrong shard");
                    continue;
                }
                Err(_) => {
                    trace!(shard = %shard.key(), name, "skipping non-blob entry");
                    continue;
                }
            };
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io(&entry.path(), e)),
            };
            if !metadata.is_file() {
                continue;
            }
            blobs.push(BlobDescriptor::new(address, metadata.len()));
        }
        Ok(blobs)
    }
}

fn read_dir_if_exists(path: &Path) -> StoreResult<Option<fs::ReadDir>> {
    match fs::read_dir(path) {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

fn is_shard_prefix(name: &str) -> bool {
    name.len() == SHARD_PREFIX_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
