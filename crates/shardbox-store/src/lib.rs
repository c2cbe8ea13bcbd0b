//! Local-disk blob store for shardbox.
//!
//! Blobs live in a sharded directory tree, one file per blob, named by the
//! blob's canonical content address. This crate walks that tree and
//! produces correctly ordered, resumable, optionally partition-scoped and
//! optionally blocking streams of [`BlobDescriptor`](shardbox_types::BlobDescriptor)s.
//!
//! # Components
//!
//! - [`ShardLayout`] -- address ↔ path mapping and directory listing
//! - [`scan()`] -- one sorted, cursor-filtered, limited pass over a layout
//! - [`long_poll`] -- re-scans while empty, up to a wait budget, streaming
//!   into a bounded channel
//! - [`PartitionResolver`] -- partition identifier → shard-tree root
//! - [`LocalDiskStore`] -- the above behind a [`StoreConfig`]
//! - [`BlobWriter`] -- atomic publish (temp file + rename)
//!
//! All scans go through the [`BlobIndex`] trait; [`InMemoryBlobIndex`] is
//! a map-backed implementation for tests and embedding.
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once visible and become visible only by atomic rename.
//! 2. Output order is byte-wise order of canonical address strings.
//! 3. Cursors are exclusive and need not name an existing blob.
//! 4. A failed directory listing fails the whole pass; no partial results.
//! 5. Every completed call ends with exactly one [`Enumerated::End`].
//! 6. The enumerator never locks or writes the shard tree.

pub mod config;
pub mod enumerate;
pub mod error;
pub mod layout;
pub mod memory;
pub mod partition;
pub mod scan;
pub mod store;
pub mod traits;
pub mod writer;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use enumerate::{long_poll, EnumerateOutcome, EnumerateRequest, Enumerated};
pub use error::{StoreError, StoreResult};
pub use layout::{Shard, ShardLayout, SHARD_PREFIX_LEN};
pub use memory::InMemoryBlobIndex;
pub use partition::{PartitionResolver, PARTITION_DIR};
pub use scan::scan;
pub use store::LocalDiskStore;
pub use traits::BlobIndex;
pub use writer::{BlobWriter, TEMP_PREFIX};
