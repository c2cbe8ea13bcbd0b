use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use shardbox_types::Partition;

use crate::error::{StoreError, StoreResult};

/// Directory under the primary root that holds relative partition roots.
pub const PARTITION_DIR: &str = "partition";

/// Maps partition identifiers to shard-tree roots.
#[derive(Clone, Debug)]
pub struct PartitionResolver {
    primary: PathBuf,
    named: BTreeMap<String, PathBuf>,
}

impl PartitionResolver {
    /// Build a resolver. Relative partition roots are placed under
    /// `<primary>/partition/`. Names must be valid partition names and no
    /// two partitions may share a root. Roots may not contain `.` or `..`.
    pub fn new(
        primary: impl Into<PathBuf>,
        named: BTreeMap<String, PathBuf>,
    ) -> StoreResult<Self> {
        let primary = primary.into();
        let mut roots = BTreeSet::from([primary.clone()]);
        let mut resolved = BTreeMap::new();

        for (name, root) in named {
            Partition::named(name.as_str()).map_err(|e| StoreError::Config(e.to_string()))?;
            if !is_plain_root(&root) {
                return Err(StoreError::Config(format!(
                    "partition {name:?} root {} must not contain `.` or `..` components",
                    root.display()
                )));
            }
            let root = if root.is_absolute() {
                root
            } else {
                primary.join(PARTITION_DIR).join(root)
            };
            if !roots.insert(root.clone()) {
                return Err(StoreError::Config(format!(
                    "partition {name:?} shares root {} with another partition",
                    root.display()
                )));
            }
            resolved.insert(name, root);
        }

        Ok(Self {
            primary,
            named: resolved,
        })
    }

    /// Root of the shard tree for `partition`.
    pub fn resolve(&self, partition: &Partition) -> StoreResult<&Path> {
        match partition {
            Partition::Default => Ok(&self.primary),
            Partition::Named(name) => self
                .named
                .get(name)
                .map(PathBuf::as_path)
                .ok_or_else(|| StoreError::UnknownPartition(name.clone())),
        }
    }

    /// Configured partition names, sorted.
    pub fn partitions(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    pub fn primary(&self) -> &Path {
        &self.primary
    }
}

/// A non-empty root made only of plain names, after an optional leading
/// `/` (or prefix).
fn is_plain_root(root: &Path) -> bool {
    let mut normal = false;
    for component in root.components() {
        match component {
            Component::Normal(_) => normal = true,
            Component::RootDir | Component::Prefix(_) => {}
            Component::CurDir | Component::ParentDir => return false,
        }
    }
    normal
}
