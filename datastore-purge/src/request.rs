use crate::{datastore::DatastoreError, error::PurgeError};
use tokio::sync::oneshot;

/// The eventual outcome of one submitted batch. Awaiting it yields the number of keys deleted
pub struct DeletionHandle {
  batch: usize,
  rx: oneshot::Receiver<Result<usize, DatastoreError>>,
}

impl DeletionHandle {
  pub(crate) fn new(batch: usize, rx: oneshot::Receiver<Result<usize, DatastoreError>>) -> Self {
    DeletionHandle { batch, rx }
  }

  /// Submission sequence number, starting at 0
  pub fn batch(&self) -> usize {
    self.batch
  }

  pub async fn recv(self) -> Result<usize, PurgeError> {
    let DeletionHandle { batch, rx } = self;

    match rx.await {
      Ok(Ok(count)) => Ok(count),
      Ok(Err(source)) => Err(PurgeError::Store { batch, source }),
      Err(_) => Err(PurgeError::Abandoned { batch }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn it_reports_abandoned_batches() {
    let (tx, rx) = oneshot::channel();
    let handle = DeletionHandle::new(3, rx);

    drop(tx);

    assert!(matches!(
      handle.recv().await,
      Err(PurgeError::Abandoned { batch: 3 })
    ));
  }
}
