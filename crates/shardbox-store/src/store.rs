use std::sync::Arc;

use shardbox_types::{BlobDescriptor, Cursor, Partition};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::enumerate::{long_poll, EnumerateOutcome, EnumerateRequest, Enumerated};
use crate::error::{StoreError, StoreResult};
use crate::layout::ShardLayout;
use crate::partition::PartitionResolver;
use crate::scan::scan;
use crate::writer::BlobWriter;

/// A local-disk blob store: one shard tree per partition.
///
/// Enumeration calls share nothing but the read-only view of the disk, so
/// any number may run alongside each other and alongside writers.
#[derive(Debug)]
pub struct LocalDiskStore {
    config: StoreConfig,
    partitions: PartitionResolver,
}

impl LocalDiskStore {
    /// Open a store. The shard trees need not exist yet.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let partitions = PartitionResolver::new(config.root.clone(), config.partitions.clone())?;
        info!(
            root = %config.root.display(),
            partitions = config.partitions.len(),
            "store opened"
        );
        Ok(Self { config, partitions })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn partitions(&self) -> &PartitionResolver {
        &self.partitions
    }

    /// Shard layout of `partition`.
    pub fn layout(&self, partition: &Partition) -> StoreResult<ShardLayout> {
        self.partitions.resolve(partition).map(ShardLayout::new)
    }

    /// Writer publishing into `partition`.
    pub fn writer(&self, partition: &Partition) -> StoreResult<BlobWriter> {
        self.layout(partition).map(BlobWriter::new)
    }

    /// A single synchronous scan pass, without waiting.
    pub fn scan(
        &self,
        partition: &Partition,
        cursor: &Cursor,
        limit: usize,
    ) -> StoreResult<Vec<BlobDescriptor>> {
        scan(&self.layout(partition)?, cursor, limit)
    }

    /// Enumerate into `sink`: descriptors in ascending address order, then
    /// [`Enumerated::End`].
    ///
    /// The request is validated before anything is scanned. A wait above
    /// the configured maximum is clamped.
    pub async fn enumerate(
        &self,
        sink: &mpsc::Sender<Enumerated>,
        request: EnumerateRequest,
    ) -> StoreResult<EnumerateOutcome> {
        if request.limit == 0 {
            return Err(StoreError::InvalidLimit);
        }
        let layout = self.layout(&request.partition)?;

        let max_wait = self.config.max_wait();
        let wait = if request.wait > max_wait {
            debug!(
                requested_ms = request.wait.as_millis() as u64,
                max_ms = max_wait.as_millis() as u64,
                "clamping long-poll wait"
            );
            max_wait
        } else {
            request.wait
        };

        long_poll(
            Arc::new(layout),
            &request.cursor,
            request.limit,
            wait,
            self.config.poll_interval(),
            sink,
        )
        .await
    }

    /// Run [`enumerate`](Self::enumerate) on a spawned task and hand back the
    /// receiving end of a channel sized by `channel_capacity`.
    ///
    /// Dropping the receiver cancels the task.
    pub fn enumerate_stream(
        self: &Arc<Self>,
        request: EnumerateRequest,
    ) -> (
        mpsc::Receiver<Enumerated>,
        JoinHandle<StoreResult<EnumerateOutcome>>,
    ) {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let store = Arc::clone(self);
        let handle = tokio::spawn(async move { store.enumerate(&tx, request).await });
        (rx, handle)
    }

    /// Enumerate and collect the descriptors, dropping the end marker.
    pub async fn enumerate_collect(
        &self,
        request: EnumerateRequest,
    ) -> StoreResult<Vec<BlobDescriptor>> {
        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity);
        let produce = async move { self.enumerate(&tx, request).await };
        let consume = async {
            let mut blobs = Vec::new();
            while let Some(item) = rx.recv().await {
                match item {
                    Enumerated::Blob(blob) => blobs.push(blob),
                    Enumerated::End => break,
                }
            }
            blobs
        };
        let (outcome, blobs) = tokio::join!(produce, consume);
        outcome?;
        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use shardbox_types::HashAlgorithm;

    fn open(dir: &tempfile::TempDir) -> Arc<LocalDiskStore> {
        let mut config = StoreConfig::with_root(dir.path());
        config.poll_interval_ms = 10;
        config.partitions = BTreeMap::from([("queue".to_string(), PathBuf::from("queue"))]);
        Arc::new(LocalDiskStore::open(config).unwrap())
    }

    /// foo, baar and bazzz: ascending sizes 3, 4, 5.
    fn publish_three(store: &LocalDiskStore) -> Vec<BlobDescriptor> {
        let writer = store.writer(&Partition::Default).unwrap();
        let mut blobs: Vec<_> = [&b"foo"[..], b"baar", b"bazzz"]
            .into_iter()
            .map(|data| writer.put(HashAlgorithm::Sha256, data).unwrap())
            .collect();
        blobs.sort_by(|a, b| a.address.cmp(&b.address));
        blobs
    }

    async fn drain(rx: &mut mpsc::Receiver<Enumerated>) -> Vec<Enumerated> {
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn enumerate_all_then_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let blobs = publish_three(&store);

        let (mut rx, handle) = store.enumerate_stream(EnumerateRequest::new(5000));
        let items = drain(&mut rx).await;
        let mut expected: Vec<_> = blobs.into_iter().map(Enumerated::Blob).collect();
        expected.push(Enumerated::End);
        assert_eq!(items, expected);
        assert_eq!(
            handle.await.unwrap().unwrap(),
            EnumerateOutcome::Completed { emitted: 3 }
        );
    }

    #[tokio::test]
    async fn enumerate_resumes_after_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let blobs = publish_three(&store);

        let cursor = blobs[0].address.to_string();
        let request = EnumerateRequest::from_raw(None, &cursor, 5000, 0).unwrap();
        let found = store.enumerate_collect(request).await.unwrap();
        assert_eq!(found, blobs[1..].to_vec());
    }

    #[tokio::test]
    async fn sizes_come_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        publish_three(&store);

        let found = store.enumerate_collect(EnumerateRequest::new(5000)).await.unwrap();
        let mut sizes: Vec<u64> = found.iter().map(|b| b.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn limit_smaller_than_available() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let blobs = publish_three(&store);

        let found = store.enumerate_collect(EnumerateRequest::new(2)).await.unwrap();
        assert_eq!(found, blobs[..2].to_vec());
    }

    #[tokio::test]
    async fn empty_store_yields_only_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);

        let started = Instant::now();
        let (mut rx, handle) = store.enumerate_stream(EnumerateRequest::new(5000));
        assert_eq!(drain(&mut rx).await, vec![Enumerated::End]);
        assert!(started.elapsed() < Duration::from_millis(50));
        assert_eq!(
            handle.await.unwrap().unwrap(),
            EnumerateOutcome::Completed { emitted: 0 }
        );
    }

    #[tokio::test]
    async fn long_poll_picks_up_new_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let writer = store.writer(&Partition::Default).unwrap();

        let started = Instant::now();
        let request = EnumerateRequest::new(5000).wait(Duration::from_secs(1));
        let (mut rx, handle) = store.enumerate_stream(request);

        let upload = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            writer.put(HashAlgorithm::Sha256, b"foo").unwrap()
        });

        let items = drain(&mut rx).await;
        let foo = upload.await.unwrap();
        assert_eq!(items, vec![Enumerated::Blob(foo), Enumerated::End]);
        assert_eq!(
            items[0],
            Enumerated::Blob(BlobDescriptor::new(
                "sha256:2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"
                    .parse()
                    .unwrap(),
                3
            ))
        );
        assert!(started.elapsed() < Duration::from_millis(900));
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn partitions_are_disjoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        publish_three(&store);
        let queue = Partition::named("queue").unwrap();
        let queued = store
            .writer(&queue)
            .unwrap()
            .put(HashAlgorithm::Blake3, b"queued")
            .unwrap();

        let found = store
            .enumerate_collect(EnumerateRequest::new(5000).partition(queue))
            .await
            .unwrap();
        assert_eq!(found, vec![queued.clone()]);

        let default = store.enumerate_collect(EnumerateRequest::new(5000)).await.unwrap();
        assert_eq!(default.len(), 3);
        assert!(!default.contains(&queued));
    }

    #[tokio::test]
    async fn unknown_partition_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let request = EnumerateRequest::new(10).partition(Partition::named("nope").unwrap());

        let (mut rx, handle) = store.enumerate_stream(request);
        assert!(drain(&mut rx).await.is_empty());
        assert!(matches!(
            handle.await.unwrap(),
            Err(StoreError::UnknownPartition(_))
        ));
    }

    #[tokio::test]
    async fn wait_is_clamped_to_max() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::with_root(dir.path());
        config.poll_interval_ms = 10;
        config.max_wait_secs = 0;
        let store = LocalDiskStore::open(config).unwrap();

        let started = Instant::now();
        let request = EnumerateRequest::new(10).wait(Duration::from_secs(30));
        assert!(store.enumerate_collect(request).await.unwrap().is_empty());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn huge_wait_limits_do_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StoreConfig::with_root(dir.path());
        config.max_wait_secs = u64::MAX;
        let store = Arc::new(LocalDiskStore::open(config).unwrap());
        let blobs = publish_three(&store);

        let request = EnumerateRequest::from_raw(None, "", 10, u64::MAX).unwrap();
        let found = store.enumerate_collect(request).await.unwrap();
        assert_eq!(found, blobs);
    }

    #[tokio::test]
    async fn unreadable_root_fails_without_sending() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blobs");
        std::fs::write(&root, b"not a dir").unwrap();
        let store = Arc::new(LocalDiskStore::open(StoreConfig::with_root(root.clone())).unwrap());

        let request = EnumerateRequest::new(10).wait(Duration::from_secs(5));
        let (mut rx, handle) = store.enumerate_stream(request);
        assert!(drain(&mut rx).await.is_empty());
        assert!(matches!(
            handle.await.unwrap(),
            Err(StoreError::Io { path, .. }) if path == root
        ));
    }

    #[test]
    fn sync_scan_matches_enumeration_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir);
        let blobs = publish_three(&store);
        let found = store.scan(&Partition::Default, &Cursor::Start, 5000).unwrap();
        assert_eq!(found, blobs);
    }

    #[test]
    fn open_rejects_invalid_config() {
        let mut config = StoreConfig::default();
        config.channel_capacity = 0;
        assert!(matches!(LocalDiskStore::open(config), Err(StoreError::Config(_))));
    }
}
