use std::time::Instant;

use shardbox_types::{BlobDescriptor, Cursor};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::layout::{Shard, ShardLayout};
use crate::traits::BlobIndex;

/// One sorted pass over a shard tree.
///
/// Shards are visited in key order and each shard's entries are sorted by
/// address, which yields the global order because shards are disjoint
/// prefix intervals. Shards entirely at or below the cursor are not read,
/// and the walk stops once `limit` descriptors are collected. Any listing
/// failure fails the whole pass.
pub fn scan(
    layout: &ShardLayout,
    cursor: &Cursor,
    limit: usize,
) -> StoreResult<Vec<BlobDescriptor>> {
    if limit == 0 {
        return Err(StoreError::InvalidLimit);
    }
    let shards = layout.list_shards()?;
    scan_shards(layout, shards, cursor, limit)
}

fn scan_shards(
    layout: &ShardLayout,
    mut shards: Vec<Shard>,
    cursor: &Cursor,
    limit: usize,
) -> StoreResult<Vec<BlobDescriptor>> {
    let started = Instant::now();
    shards.sort_by_cached_key(|shard| shard.key());

    let mut found = Vec::new();
    let mut listed = 0usize;
    for shard in &shards {
        if found.len() >= limit {
            break;
        }
        if shard.precedes(cursor) {
            continue;
        }
        let mut entries = layout.list_entries(shard)?;
        listed += 1;
        entries.retain(|blob| cursor.admits(&blob.address));
        entries.sort_unstable_by(|a, b| a.address.cmp(&b.address));
        found.extend(entries);
    }
    found.truncate(limit);

    debug!(
        root = %layout.root().display(),
        %cursor,
        limit,
        shards = shards.len(),
        listed,
        found = found.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "shard scan"
    );
    Ok(found)
}

impl BlobIndex for ShardLayout {
    fn scan(&self, cursor: &Cursor, limit: usize) -> StoreResult<Vec<BlobDescriptor>> {
        scan(self, cursor, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::BlobWriter;
    use proptest::prelude::*;
    use shardbox_types::{ContentAddress, HashAlgorithm};

    fn tree_with(contents: &[&[u8]]) -> (tempfile::TempDir, ShardLayout, Vec<BlobDescriptor>) {
        let dir = tempfile::tempdir().unwrap();
        let layout = ShardLayout::new(dir.path());
        let writer = BlobWriter::new(layout.clone());
        let mut published: Vec<BlobDescriptor> = contents
            .iter()
            .map(|data| writer.put(HashAlgorithm::Sha256, data).unwrap())
            .collect();
        published.sort_by(|a, b| a.address.cmp(&b.address));
        (dir, layout, published)
    }

    #[test]
    fn zero_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ShardLayout::new(dir.path());
        assert!(matches!(scan(&layout, &Cursor::Start, 0), Err(StoreError::InvalidLimit)));
    }

    #[test]
    fn empty_root_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ShardLayout::new(dir.path());
        assert!(scan(&layout, &Cursor::Start, 10).unwrap().is_empty());
    }

    #[test]
    fn full_scan_is_sorted() {
        let (_dir, layout, published) = tree_with(&[b"foo", b"baar", b"bazzz", b"quux"]);
        assert_eq!(scan(&layout, &Cursor::Start, 5000).unwrap(), published);
    }

    #[test]
    fn cursor_resumes_exclusively() {
        let (_dir, layout, published) = tree_with(&[b"foo", b"baar", b"bazzz", b"quux"]);
        let cursor = Cursor::after(&published[1]);
        assert_eq!(scan(&layout, &cursor, 5000).unwrap(), published[2..].to_vec());
    }

    #[test]
    fn cursor_need_not_exist() {
        let (_dir, layout, published) = tree_with(&[b"foo", b"baar", b"bazzz"]);
        // Just above the first published address, but not itself published.
        let mut digest = published[0].address.digest().to_vec();
        for byte in digest.iter_mut().rev() {
            let (next, carry) = byte.overflowing_add(1);
            *byte = next;
            if !carry {
                break;
            }
        }
        let ghost = ContentAddress::new(HashAlgorithm::Sha256, digest).unwrap();
        assert!(ghost > published[0].address && ghost < published[1].address);

        let found = scan(&layout, &Cursor::After(ghost), 5000).unwrap();
        assert_eq!(found, published[1..].to_vec());
    }

    #[test]
    fn cursor_past_everything_yields_nothing() {
        let (_dir, layout, _) = tree_with(&[b"foo", b"baar"]);
        let top = ContentAddress::new(HashAlgorithm::Sha256, vec![0xff; 32]).unwrap();
        assert!(scan(&layout, &Cursor::After(top), 10).unwrap().is_empty());
    }

    #[test]
    fn limit_truncates_in_order() {
        let (_dir, layout, published) = tree_with(&[b"foo", b"baar", b"bazzz", b"quux"]);
        assert_eq!(scan(&layout, &Cursor::Start, 2).unwrap(), published[..2].to_vec());
    }

    #[test]
    fn pages_chain_without_gaps_or_overlaps() {
        let contents: Vec<Vec<u8>> = (0..25u8).map(|i| vec![i; i as usize + 1]).collect();
        let refs: Vec<&[u8]> = contents.iter().map(|c| c.as_slice()).collect();
        let (_dir, layout, published) = tree_with(&refs);

        let mut cursor = Cursor::Start;
        let mut seen = Vec::new();
        loop {
            let page = scan(&layout, &cursor, 7).unwrap();
            let Some(last) = page.last() else { break };
            cursor = Cursor::after(last);
            seen.extend(page);
        }
        assert_eq!(seen, published);
    }

    #[test]
    fn mixed_algorithms_follow_canonical_order() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ShardLayout::new(dir.path());
        let writer = BlobWriter::new(layout.clone());
        let sha = writer.put(HashAlgorithm::Sha256, b"foo").unwrap();
        let blake = writer.put(HashAlgorithm::Blake3, b"foo").unwrap();

        let found = scan(&layout, &Cursor::Start, 10).unwrap();
        assert_eq!(found, vec![blake, sha]);
    }

    #[test]
    fn repeated_scans_are_identical() {
        let (_dir, layout, _) = tree_with(&[b"foo", b"baar", b"bazzz"]);
        let first = scan(&layout, &Cursor::Start, 2).unwrap();
        let second = scan(&layout, &Cursor::Start, 2).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn root_that_is_a_file_fails_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blobs");
        std::fs::write(&root, b"not a dir").unwrap();

        let result = scan(&ShardLayout::new(&root), &Cursor::Start, 10);
        assert!(matches!(result, Err(StoreError::Io { path, .. }) if path == root));
    }

    #[test]
    fn failing_shard_discards_earlier_results() {
        let (_dir, layout, published) = tree_with(&[b"foo", b"baar", b"bazzz"]);
        let shards = layout.list_shards().unwrap();

        // The last shard in key order vanishes as a directory mid-walk.
        let last = layout.shard_dir_for(&published[2].address);
        std::fs::remove_dir_all(&last).unwrap();
        std::fs::write(&last, b"not a dir").unwrap();

        let result = scan_shards(&layout, shards, &Cursor::Start, 5000);
        assert!(matches!(result, Err(StoreError::Io { path, .. }) if path == last));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn scan_returns_every_blob_once_in_order(
            contents in prop::collection::hash_set(
                prop::collection::vec(any::<u8>(), 0..16),
                0..40,
            ),
            limit in 1usize..50,
            skip in 0usize..40,
        ) {
            let contents: Vec<&[u8]> = contents.iter().map(|c| c.as_slice()).collect();
            let (_dir, layout, published) = tree_with(&contents);

            let full = scan(&layout, &Cursor::Start, published.len().max(1)).unwrap();
            prop_assert_eq!(&full, &published);

            let cursor = published
                .get(skip)
                .map(Cursor::after)
                .unwrap_or(Cursor::Start);
            let start = if published.get(skip).is_some() { skip + 1 } else { 0 };
            let expected: Vec<_> = published[start..].iter().take(limit).cloned().collect();
            prop_assert_eq!(scan(&layout, &cursor, limit).unwrap(), expected);
        }
    }
}
