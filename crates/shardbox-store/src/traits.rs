use shardbox_types::{BlobDescriptor, Cursor};

use crate::error::StoreResult;

/// A sorted, cursor-addressable view of the published blobs of one
/// partition.
///
/// All implementations must satisfy these invariants:
/// - Results are strictly ascending in content-address order, without
///   duplicates.
/// - Only addresses strictly greater than the cursor are returned.
/// - At most `limit` descriptors are returned; fewer means nothing beyond
///   the last one existed when the scan completed.
/// - Only fully published blobs are visible.
/// - A failure yields `Err` and no partial results.
pub trait BlobIndex: Send + Sync {
    /// One scan pass. `limit` must be positive.
    fn scan(&self, cursor: &Cursor, limit: usize) -> StoreResult<Vec<BlobDescriptor>>;
}
