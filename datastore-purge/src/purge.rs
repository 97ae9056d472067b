use crate::{
  batch::Batcher,
  datastore::{Datastore, DatastoreError, MAX_BATCH_SIZE},
  error::PurgeError,
  key::Kind,
  request::DeletionHandle,
  task::TaskHandler,
  worker::{WorkerPool, DEFAULT_WORKERS, MAX_WORKERS},
};
use flume::{Receiver, Sender};
use futures_util::{stream::BoxStream, StreamExt};
use log::{debug, info, warn};
use std::{env, fmt, sync::Arc};

/// Batch size and worker count of a purge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSettings {
  pub batch_size: usize,
  pub workers: usize,
}

impl Default for PurgeSettings {
  fn default() -> Self {
    PurgeSettings {
      batch_size: MAX_BATCH_SIZE,
      workers: DEFAULT_WORKERS,
    }
  }
}

impl PurgeSettings {
  /// Defaults overridden by `PURGE_BATCH_SIZE` and `PURGE_WORKERS`
  pub fn from_env() -> Self {
    Self::from_vars(|name| env::var(name).ok())
  }

  pub(crate) fn from_vars<F>(var: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let defaults = PurgeSettings::default();

    let batch_size = var("PURGE_BATCH_SIZE")
      .and_then(|size| size.parse::<usize>().ok())
      .map(|size| size.clamp(1, MAX_BATCH_SIZE))
      .unwrap_or(defaults.batch_size);

    let workers = var("PURGE_WORKERS")
      .and_then(|workers| workers.parse::<usize>().ok())
      .map(|workers| workers.clamp(1, MAX_WORKERS))
      .unwrap_or(defaults.workers);

    PurgeSettings {
      batch_size,
      workers,
    }
  }
}

/// Messages from the producer to the consumer, in submission order
pub enum PurgeSignal {
  Pending(DeletionHandle),
  /// Enumeration finished after submitting `batches` batches
  Exhausted { batches: usize },
}

/// One resolved batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
  pub deleted: usize,
  pub total: usize,
}

impl fmt::Display for Progress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Deleted {} keys. Total Deleted: {}",
      self.deleted, self.total
    )
  }
}

/// Receives a [`Progress`] for every resolved batch, in submission order
pub trait Reporter: Send + 'static {
  fn report(&mut self, progress: Progress);
}

impl<F> Reporter for F
where
  F: FnMut(Progress) + Send + 'static,
{
  fn report(&mut self, progress: Progress) {
    (self)(progress)
  }
}

/// Prints each [`Progress`] line to stdout
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
  fn report(&mut self, progress: Progress) {
    println!("{}", progress);
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
  pub batches: usize,
  pub deleted: usize,
}

/// Deletes every entity of a kind: a producer task enumerates and batches keys into a [`WorkerPool`] while a consumer task resolves each [`DeletionHandle`] in turn
pub struct Purge<D: Datastore> {
  store: Arc<D>,
  settings: PurgeSettings,
}

impl<D> Purge<D>
where
  D: Datastore,
{
  pub fn new(store: Arc<D>) -> Self {
    Purge {
      store,
      settings: PurgeSettings::default(),
    }
  }

  pub fn with_settings(mut self, settings: PurgeSettings) -> Self {
    self.settings = settings;
    self
  }

  pub async fn run<K, R>(&self, reporter: R) -> Result<PurgeSummary, PurgeError>
  where
    K: Kind,
    R: Reporter,
  {
    self.run_kind(K::NAME, reporter).await
  }

  pub async fn run_kind<R>(&self, kind: &str, reporter: R) -> Result<PurgeSummary, PurgeError>
  where
    R: Reporter,
  {
    let batch_size = self.settings.batch_size.clamp(1, D::MAX_BATCH_SIZE);
    let pool = WorkerPool::new(self.store.clone(), self.settings.workers);

    info!(
      "Purging {} entities in batches of {} across {} workers",
      kind,
      batch_size,
      pool.workers()
    );

    let (tx, rx) = flume::unbounded();
    let keys = self.store.keys_of_kind(kind);

    let producer = tokio::task::spawn(produce(pool, keys, batch_size, tx));
    let consumer = tokio::task::spawn(consume(rx, reporter));

    let (produced, consumed) = tokio::join!(producer, consumer);

    let batches = produced??;
    let summary = consumed??;

    debug_assert_eq!(batches, summary.batches);

    info!(
      "Purged {} {} entities in {} batches",
      summary.deleted, kind, summary.batches
    );

    Ok(summary)
  }
}

pub(crate) async fn produce<T>(
  pool: WorkerPool<T>,
  mut keys: BoxStream<'static, Result<T::Key, DatastoreError>>,
  batch_size: usize,
  tx: Sender<PurgeSignal>,
) -> Result<usize, PurgeError>
where
  T: TaskHandler,
{
  let mut batcher = Batcher::new(batch_size);

  while let Some(key) = keys.next().await {
    let key = key.map_err(PurgeError::Enumeration)?;

    if let Some(batch) = batcher.push(key) {
      dispatch(&pool, batch, &tx).await?;
    }
  }

  if let Some(batch) = batcher.finish() {
    dispatch(&pool, batch, &tx).await?;
  }

  let batches = pool.submitted();

  debug!("Enumeration exhausted after {} batches", batches);

  tx.send(PurgeSignal::Exhausted { batches }).ok();

  // Batches keep running to completion even once the consumer has stopped
  pool.join().await?;

  Ok(batches)
}

async fn dispatch<T>(
  pool: &WorkerPool<T>,
  batch: Vec<T::Key>,
  tx: &Sender<PurgeSignal>,
) -> Result<(), PurgeError>
where
  T: TaskHandler,
{
  let handle = pool.submit(batch).await?;

  if let Err(flume::SendError(PurgeSignal::Pending(handle))) = tx.send(PurgeSignal::Pending(handle))
  {
    warn!(
      "Consumer stopped; batch {} will complete unobserved",
      handle.batch()
    );
  }

  Ok(())
}

/// Resolve handles in submission order until the announced number of batches has been drained
pub(crate) async fn consume<R>(
  rx: Receiver<PurgeSignal>,
  mut reporter: R,
) -> Result<PurgeSummary, PurgeError>
where
  R: Reporter,
{
  let mut total = 0;
  let mut drained = 0;

  loop {
    match rx.recv_async().await {
      Ok(PurgeSignal::Pending(handle)) => {
        let deleted = handle.recv().await?;

        drained += 1;
        total += deleted;

        reporter.report(Progress { deleted, total });
      }
      Ok(PurgeSignal::Exhausted { batches }) => {
        if drained.ne(&batches) {
          break Err(PurgeError::Mismatch { drained, batches });
        }

        break Ok(PurgeSummary {
          batches,
          deleted: total,
        });
      }
      Err(_) => break Err(PurgeError::Interrupted { drained }),
    }
  }
}
