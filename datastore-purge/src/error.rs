use crate::datastore::DatastoreError;
use thiserror::Error;
use tokio::task::JoinError;

/// Why a purge stopped before every batch was observed
#[derive(Error, Debug)]
pub enum PurgeError {
  #[error("Unable to enumerate keys: {0}")]
  Enumeration(#[source] DatastoreError),
  #[error("Batch {batch} failed to delete: {source}")]
  Store {
    batch: usize,
    #[source]
    source: DatastoreError,
  },
  #[error("Batch of {len} keys exceeds the per-call limit of {max}")]
  OversizedBatch { len: usize, max: usize },
  #[error("Batch {batch} was dropped before resolving")]
  Abandoned { batch: usize },
  #[error("Producer stopped after {drained} batches without signalling exhaustion")]
  Interrupted { drained: usize },
  #[error("Drained {drained} batches but {batches} were submitted")]
  Mismatch { drained: usize, batches: usize },
  #[error("Worker pool closed")]
  PoolClosed,
  #[error(transparent)]
  Join(#[from] JoinError),
}
