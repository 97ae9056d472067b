use crate::{
  datastore::{Datastore, DatastoreError},
  key::Key,
  request::DeletionHandle,
};
use std::marker::PhantomData;
use tokio::sync::oneshot;

/// A type-state control flow for driving a batch from submission to completion. Handlers receive a [`DeleteBatch`] and can only hand back a [`CompletionReceipt`] by resolving it, so every submitted batch reports an outcome
#[async_trait::async_trait]
pub trait TaskHandler: Sized + Send + Sync + 'static {
  type Key: Key;
  const MAX_BATCH_SIZE: usize;
  async fn handle_task(&self, task: Task<DeleteBatch<Self::Key>>) -> Task<CompletionReceipt>;
}

pub struct Task<T>(pub(crate) T);

/// An owned batch of keys to be deleted and the deleted count resolved
pub struct DeleteBatch<K: Key> {
  pub(crate) batch: usize,
  pub(crate) keys: Vec<K>,
  pub(crate) tx: oneshot::Sender<Result<usize, DatastoreError>>,
}

/// An acknowledgement that the batch outcome has been delivered to its [`DeletionHandle`]
pub struct CompletionReceipt(PhantomData<fn() -> ()>);

impl<K> Task<DeleteBatch<K>>
where
  K: Key,
{
  #[must_use]
  pub(crate) fn new(batch: usize, keys: Vec<K>) -> (Self, DeletionHandle) {
    let (tx, rx) = oneshot::channel();

    let task = Task(DeleteBatch { batch, keys, tx });

    (task, DeletionHandle::new(batch, rx))
  }

  /// Submission sequence number, starting at 0
  pub fn batch(&self) -> usize {
    self.0.batch
  }

  pub fn keys(&self) -> &[K] {
    &self.0.keys
  }

  /// Deliver the outcome; on success the count is the number of keys in the batch
  #[must_use]
  pub fn resolve(self, result: Result<(), DatastoreError>) -> Task<CompletionReceipt> {
    let Task(DeleteBatch { keys, tx, .. }) = self;

    let result = result.map(|_| keys.len());

    // The consumer may already have stopped; the deletion itself still happened
    tx.send(result).ok();

    Task::resolve_receipt()
  }
}

impl Task<CompletionReceipt> {
  pub(crate) fn resolve_receipt() -> Self {
    Task(CompletionReceipt(PhantomData))
  }
}

#[async_trait::async_trait]
impl<D> TaskHandler for D
where
  D: Datastore,
{
  type Key = D::Key;
  const MAX_BATCH_SIZE: usize = D::MAX_BATCH_SIZE;

  async fn handle_task(&self, task: Task<DeleteBatch<Self::Key>>) -> Task<CompletionReceipt> {
    let result = self.delete_multi(task.keys()).await;

    task.resolve(result)
  }
}
