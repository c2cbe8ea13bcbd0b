//! Long-poll enumeration over a [`BlobIndex`].
//!
//! One call produces zero or more [`Enumerated::Blob`] items in ascending
//! address order followed by exactly one [`Enumerated::End`], pushed into a
//! bounded tokio channel. If the first scan is empty and the request carries
//! a wait budget, the index is re-scanned every poll interval until a blob
//! shows up or the budget runs out. Dropping the receiver cancels the call.

use std::sync::Arc;
use std::time::Duration;

use shardbox_types::{BlobDescriptor, Cursor, Partition};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobIndex;

/// One item of an enumeration stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Enumerated {
    Blob(BlobDescriptor),
    /// Terminal marker. Sent once, after the last blob, on every call that
    /// completes.
    End,
}

/// How an enumeration call finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumerateOutcome {
    /// All descriptors and the terminal marker were delivered.
    Completed { emitted: usize },
    /// The receiver went away first. A clean early stop, not a failure.
    Cancelled,
}

/// Parameters of an enumeration call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerateRequest {
    pub partition: Partition,
    pub cursor: Cursor,
    /// Maximum descriptors to emit. Must be positive.
    pub limit: usize,
    /// Long-poll budget. Zero returns immediately when nothing is found.
    pub wait: Duration,
}

impl EnumerateRequest {
    /// Enumerate the default partition from the start, without waiting.
    pub fn new(limit: usize) -> Self {
        Self {
            partition: Partition::Default,
            cursor: Cursor::Start,
            limit,
            wait: Duration::ZERO,
        }
    }

    /// Build a request from wire-level values: an optional partition name,
    /// a cursor string (empty for the start), a limit and a wait in seconds.
    pub fn from_raw(
        partition: Option<&str>,
        cursor: &str,
        limit: usize,
        wait_secs: u64,
    ) -> StoreResult<Self> {
        let partition = Partition::from_option(partition).map_err(|_| {
            StoreError::UnknownPartition(partition.unwrap_or_default().to_string())
        })?;
        let cursor = Cursor::parse(cursor).map_err(StoreError::MalformedCursor)?;
        if limit == 0 {
            return Err(StoreError::InvalidLimit);
        }
        Ok(Self {
            partition,
            cursor,
            limit,
            wait: Duration::from_secs(wait_secs),
        })
    }

    pub fn partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }
}

/// Scan `index`, long-polling for up to `wait` while the result is empty,
/// and stream the result into `sink`.
///
/// Scans run on the blocking pool. A scan error ends the call at once with
/// nothing sent. Closing the receiver is noticed on the next send, or
/// within one `poll_interval` while waiting.
pub async fn long_poll<I>(
    index: Arc<I>,
    cursor: &Cursor,
    limit: usize,
    wait: Duration,
    poll_interval: Duration,
    sink: &mpsc::Sender<Enumerated>,
) -> StoreResult<EnumerateOutcome>
where
    I: BlobIndex + 'static,
{
    if limit == 0 {
        return Err(StoreError::InvalidLimit);
    }
    let started = Instant::now();
    let deadline = started.checked_add(wait).unwrap_or_else(|| far_future(started));
    let mut passes = 0u32;

    let found = loop {
        if sink.is_closed() {
            return Ok(EnumerateOutcome::Cancelled);
        }
        let found = scan_blocking(Arc::clone(&index), cursor.clone(), limit).await?;
        passes += 1;
        if !found.is_empty() {
            break found;
        }

        let now = Instant::now();
        if now >= deadline {
            break found;
        }
        let nap = poll_interval.min(deadline - now);
        trace!(passes, nap_ms = nap.as_millis() as u64, "nothing yet; polling again");
        tokio::select! {
            _ = sink.closed() => return Ok(EnumerateOutcome::Cancelled),
            _ = tokio::time::sleep(nap) => {}
        }
    };

    debug!(
        %cursor,
        limit,
        passes,
        found = found.len(),
        waited_ms = started.elapsed().as_millis() as u64,
        "enumeration scanned"
    );
    emit(sink, found).await
}

/// Roughly 30 years out. Stands in for waits too long to add to an instant.
fn far_future(from: Instant) -> Instant {
    from + Duration::from_secs(86400 * 365 * 30)
}

async fn scan_blocking<I>(
    index: Arc<I>,
    cursor: Cursor,
    limit: usize,
) -> StoreResult<Vec<BlobDescriptor>>
where
    I: BlobIndex + 'static,
{
    tokio::task::spawn_blocking(move || index.scan(&cursor, limit))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

async fn emit(
    sink: &mpsc::Sender<Enumerated>,
    found: Vec<BlobDescriptor>,
) -> StoreResult<EnumerateOutcome> {
    let emitted = found.len();
    for blob in found {
        if sink.send(Enumerated::Blob(blob)).await.is_err() {
            return Ok(EnumerateOutcome::Cancelled);
        }
    }
    if sink.send(Enumerated::End).await.is_err() {
        return Ok(EnumerateOutcome::Cancelled);
    }
    Ok(EnumerateOutcome::Completed { emitted })
}
