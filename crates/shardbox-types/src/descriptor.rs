use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::ContentAddress;

/// A published blob as seen by enumeration: its address and its size in
/// bytes as reported by the filesystem.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobDescriptor {
    pub address: ContentAddress,
    pub size: u64,
}

impl BlobDescriptor {
    pub fn new(address: ContentAddress, size: u64) -> Self {
        Self { address, size }
    }
}

impl fmt::Display for BlobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::HashAlgorithm;

    #[test]
    fn display_is_address_then_size() {
        let addr = ContentAddress::compute(HashAlgorithm::Sha256, b"foo");
        let desc = BlobDescriptor::new(addr.clone(), 3);
        assert_eq!(desc.to_string(), format!("{addr} 3"));
    }

    #[test]
    fn serde_shape() {
        let addr = ContentAddress::compute(HashAlgorithm::Blake3, b"bar");
        let desc = BlobDescriptor::new(addr.clone(), 3);
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["address"], addr.to_string());
        assert_eq!(json["size"], 3);
    }
}
