use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// Separator between the algorithm tag and the hex digest.
pub const SEPARATOR: char = ':';

/// Digest algorithm a [`ContentAddress`] was computed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 2] = [Self::Sha256, Self::Blake3];

    /// The tag used in canonical strings and as the top-level shard directory.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Blake3 => 32,
        }
    }

    /// Look up an algorithm by its exact tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.tag() == tag)
    }

    /// Hash `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| TypeError::malformed(s, "unknown algorithm tag"))
    }
}

/// Identifier of an immutable blob: algorithm tag plus content digest.
///
/// The canonical string form is `tag ":" lowercase-hex(digest)`, e.g.
/// `sha256:2c26b46b...`. Addresses are totally ordered by byte-wise
/// comparison of that canonical form, which is the order enumeration
/// emits blobs in and the order cursors resume from.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentAddress {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl ContentAddress {
    /// Build an address from a pre-computed digest.
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Result<Self, TypeError> {
        if digest.len() != algorithm.digest_len() {
            return Err(TypeError::Malformed {
                input: format!("{}{}{}", algorithm, SEPARATOR, hex::encode(&digest)),
                reason: format!(
                    "digest must be {} bytes, got {}",
                    algorithm.digest_len(),
                    digest.len()
                ),
            });
        }
        Ok(Self { algorithm, digest })
    }

    /// Compute the address of `data`.
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(data),
        }
    }

    /// Parse a canonical address string.
    ///
    /// Only the canonical form is accepted: a known tag, a single `:` and
    /// exactly `2 * digest_len` lowercase hex digits.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let (tag, hex_digest) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| TypeError::malformed(s, "missing ':' separator"))?;
        let algorithm = HashAlgorithm::from_tag(tag)
            .ok_or_else(|| TypeError::malformed(s, format!("unknown algorithm tag {tag:?}")))?;

        if hex_digest.len() != algorithm.digest_len() * 2 {
            return Err(TypeError::malformed(
                s,
                format!(
                    "expected {} hex digits, got {}",
                    algorithm.digest_len() * 2,
                    hex_digest.len()
                ),
            ));
        }
        if !hex_digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(TypeError::malformed(s, "digest is not lowercase hex"));
        }
        let digest = hex::decode(hex_digest).map_err(|e| TypeError::malformed(s, e.to_string()))?;
        Ok(Self { algorithm, digest })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Lowercase hex encoding of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }

    /// The first `n` hex digits of the digest.
    pub fn hex_prefix(&self, n: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(n);
        hex
    }

    /// Returns `true` if `data` hashes to this address.
    pub fn matches(&self, data: &[u8]) -> bool {
        self.algorithm.digest(data) == self.digest
    }
}

impl Ord for ContentAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.algorithm == other.algorithm {
            // Same length, and lowercase hex preserves byte order.
            return self.digest.cmp(&other.digest);
        }
        // Distinct tags differ before either "tag:" prefix ends, which
        // settles the order of the full canonical strings.
        let ours = self.algorithm.tag().bytes().chain(std::iter::once(b':'));
        let theirs = other.algorithm.tag().bytes().chain(std::iter::once(b':'));
        ours.cmp(theirs)
    }
}

impl PartialOrd for ContentAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentAddress({}{}{})", self.algorithm, SEPARATOR, self.hex_prefix(8))
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.algorithm, SEPARATOR, self.to_hex())
    }
}

impl FromStr for ContentAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
