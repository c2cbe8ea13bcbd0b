//! Foundation types for shardbox, a local-disk content-addressable blob store.
//!
//! Every other shardbox crate depends on `shardbox-types`.
//!
//! # Key Types
//!
//! - [`ContentAddress`] -- Blob identifier (`algorithm ":" hex-digest`), totally
//!   ordered by its canonical string form
//! - [`HashAlgorithm`] -- Supported digest algorithms
//! - [`BlobDescriptor`] -- Address plus on-disk size of a published blob
//! - [`Partition`] -- Default or named, disjoint blob namespace
//! - [`Cursor`] -- Exclusive resume point for paginated enumeration

pub mod address;
pub mod cursor;
pub mod descriptor;
pub mod error;
pub mod partition;

pub use address::{ContentAddress, HashAlgorithm};
pub use cursor::Cursor;
pub use descriptor::BlobDescriptor;
pub use error::TypeError;
pub use partition::Partition;
