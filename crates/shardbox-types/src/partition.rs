use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A disjoint, independently enumerable namespace of blobs.
///
/// The default partition is the store's primary root. Named partitions map
/// to their own shard trees; an address in one partition means nothing in
/// another.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Partition {
    #[default]
    Default,
    Named(String),
}

impl Partition {
    /// A named partition. Names are non-empty and limited to `[A-Za-z0-9_-]`
    /// so they are always safe as a single path component.
    pub fn named(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(TypeError::InvalidPartition(name));
        }
        Ok(Self::Named(name))
    }

    /// Map an optional raw identifier: absent or empty means the default.
    pub fn from_option(name: Option<&str>) -> Result<Self, TypeError> {
        match name {
            None | Some("") => Ok(Self::Default),
            Some(name) => Self::named(name),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Named(name) => Some(name),
        }
    }
}

pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("(default)"),
            Self::Named(name) => f.write_str(name),
        }
    }
}
