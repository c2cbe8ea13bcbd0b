use std::fs;
use std::io::Write;

use shardbox_types::{BlobDescriptor, ContentAddress, HashAlgorithm};
use tracing::{info, trace};

use crate::error::{StoreError, StoreResult};
use crate::layout::ShardLayout;

/// Prefix of in-progress files. Never a valid address, so enumeration
/// skips them.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Publishes blobs into a shard tree.
///
/// Bytes go to a temp file inside the destination shard, are synced, and
/// are then renamed onto the final name. A blob is therefore either absent
/// or complete from any reader's point of view.
#[derive(Clone, Debug)]
pub struct BlobWriter {
    layout: ShardLayout,
}

impl BlobWriter {
    pub fn new(layout: ShardLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    /// Hash `data` with `algorithm` and publish it. Idempotent.
    pub fn put(&self, algorithm: HashAlgorithm, data: &[u8]) -> StoreResult<BlobDescriptor> {
        let address = ContentAddress::compute(algorithm, data);
        self.publish(address, data)
    }

    /// Publish `data` under a caller-supplied address after checking that
    /// it really hashes to it.
    pub fn put_verified(
        &self,
        address: &ContentAddress,
        data: &[u8],
    ) -> StoreResult<BlobDescriptor> {
        if !address.matches(data) {
            return Err(StoreError::DigestMismatch {
                expected: address.clone(),
                actual: ContentAddress::compute(address.algorithm(), data),
            });
        }
        self.publish(address.clone(), data)
    }

    fn publish(&self, address: ContentAddress, data: &[u8]) -> StoreResult<BlobDescriptor> {
        let final_path = self.layout.blob_path_for(&address);
        if let Ok(existing) = fs::metadata(&final_path) {
            if existing.is_file() {
                trace!(%address, "blob already present");
                return Ok(BlobDescriptor::new(address, existing.len()));
            }
        }

        let shard_dir = self.layout.shard_dir_for(&address);
        fs::create_dir_all(&shard_dir).map_err(|e| StoreError::io(&shard_dir, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&shard_dir)
            .map_err(|e| StoreError::io(&shard_dir, e))?;
        temp.write_all(data)
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(temp.path(), e))?;
        temp.persist(&final_path)
            .map_err(|e| StoreError::io(&final_path, e.error))?;

        info!(%address, size = data.len(), "blob published");
        Ok(BlobDescriptor::new(address, data.len() as u64))
    }
}
