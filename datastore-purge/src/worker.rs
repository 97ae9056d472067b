use crate::{
  error::PurgeError,
  request::DeletionHandle,
  task::{Task, TaskHandler},
};
use crossbeam::atomic::AtomicCell;
use log::debug;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Number of batches deleted concurrently unless configured otherwise
pub const DEFAULT_WORKERS: usize = 8;

/// Upper bound on concurrent batches; keeps the permit count valid for [`Semaphore`]
pub const MAX_WORKERS: usize = 1024;

/// A fixed capacity pool executing batch deletions. Submission waits for a free worker, bounding the number of batches in flight
pub struct WorkerPool<T: TaskHandler> {
  handler: Arc<T>,
  workers: usize,
  permits: Arc<Semaphore>,
  submitted: AtomicCell<usize>,
}

impl<T> WorkerPool<T>
where
  T: TaskHandler,
{
  pub fn new(handler: Arc<T>, workers: usize) -> Self {
    let workers = workers.clamp(1, MAX_WORKERS);

    WorkerPool {
      handler,
      workers,
      permits: Arc::new(Semaphore::new(workers)),
      submitted: AtomicCell::new(0),
    }
  }

  pub fn workers(&self) -> usize {
    self.workers
  }

  /// Batches accepted so far
  pub fn submitted(&self) -> usize {
    self.submitted.load()
  }

  /// Batches currently executing
  pub fn in_flight(&self) -> usize {
    self.workers - self.permits.available_permits()
  }

  /// Hand `keys` to the next free worker. Resolves once a worker has been claimed, not once the batch is deleted
  pub async fn submit(&self, keys: Vec<T::Key>) -> Result<DeletionHandle, PurgeError> {
    if keys.len().gt(&T::MAX_BATCH_SIZE) {
      return Err(PurgeError::OversizedBatch {
        len: keys.len(),
        max: T::MAX_BATCH_SIZE,
      });
    }

    let permit = self
      .permits
      .clone()
      .acquire_owned()
      .await
      .map_err(|_| PurgeError::PoolClosed)?;

    let batch = self.submitted.fetch_add(1);
    let (task, handle) = Task::new(batch, keys);
    let handler = self.handler.clone();

    debug!(
      "{} dispatching batch {} of {} keys",
      tynm::type_name::<T>(),
      batch,
      task.keys().len()
    );

    tokio::task::spawn(async move {
      let _receipt = handler.handle_task(task).await;

      drop(permit);
    });

    Ok(handle)
  }

  /// Wait until every submitted batch has finished executing
  pub async fn join(&self) -> Result<(), PurgeError> {
    let _permits = self
      .permits
      .acquire_many(self.workers as u32)
      .await
      .map_err(|_| PurgeError::PoolClosed)?;

    Ok(())
  }
}
