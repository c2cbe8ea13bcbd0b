use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use shardbox_types::{BlobDescriptor, ContentAddress, Cursor};

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobIndex;

/// In-memory, `BTreeMap`-backed blob index.
///
/// Intended for tests and embedding. Inserting is the equivalent of an
/// atomic publish: a blob is either in the map or not.
pub struct InMemoryBlobIndex {
    blobs: RwLock<BTreeMap<ContentAddress, u64>>,
}

impl InMemoryBlobIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Record a published blob. Re-inserting an address is a no-op.
    pub fn insert(&self, blob: BlobDescriptor) {
        self.blobs
            .write()
            .expect("lock poisoned")
            .entry(blob.address)
            .or_insert(blob.size);
    }

    /// Number of blobs currently indexed.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Remove all blobs.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryBlobIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobIndex for InMemoryBlobIndex {
    fn scan(&self, cursor: &Cursor, limit: usize) -> StoreResult<Vec<BlobDescriptor>> {
        if limit == 0 {
            return Err(StoreError::InvalidLimit);
        }
        let lower = match cursor.address() {
            Some(address) => Bound::Excluded(address),
            None => Bound::Unbounded,
        };
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map
            .range::<ContentAddress, _>((lower, Bound::Unbounded))
            .take(limit)
            .map(|(address, size)| BlobDescriptor::new(address.clone(), *size))
            .collect())
    }
}

impl std::fmt::Debug for InMemoryBlobIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobIndex")
            .field("blob_count", &self.len())
            .finish()
    }
}
