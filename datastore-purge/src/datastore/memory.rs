use super::{Datastore, DatastoreError};
use crossbeam::{atomic::AtomicCell, queue::SegQueue};
use flurry::HashSet;
use futures_util::stream::{self, BoxStream, StreamExt};
use itertools::Itertools;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MemoryKey {
  pub kind: String,
  pub id: u64,
}

/// An in-process [`Datastore`] that records how it was called; used to exercise purges without a network
#[derive(Default)]
pub struct MemoryDatastore {
  entities: HashSet<MemoryKey>,
  latency: Option<Duration>,
  failing_call: Option<usize>,
  failing_enumeration: Option<usize>,
  delete_calls: AtomicCell<usize>,
  in_flight: AtomicCell<usize>,
  peak_in_flight: AtomicCell<usize>,
  batch_sizes: SegQueue<usize>,
}

impl MemoryDatastore {
  pub fn new() -> Self {
    MemoryDatastore::default()
  }

  /// Seed `count` entities of `kind` with ids `0..count`
  pub fn with_entities(self, kind: &str, count: u64) -> Self {
    let guard = self.entities.guard();

    for id in 0..count {
      self.entities.insert(
        MemoryKey {
          kind: kind.to_owned(),
          id,
        },
        &guard,
      );
    }

    drop(guard);

    self
  }

  /// Hold every deletion open for `latency`
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = Some(latency);
    self
  }

  /// Fail the `nth` (zero-based) call to [`Datastore::delete_multi`]
  pub fn with_failing_call(mut self, nth: usize) -> Self {
    self.failing_call = Some(nth);
    self
  }

  /// Fail enumeration after yielding `count` keys
  pub fn with_failing_enumeration(mut self, count: usize) -> Self {
    self.failing_enumeration = Some(count);
    self
  }

  pub fn len(&self, kind: &str) -> usize {
    let guard = self.entities.guard();

    self
      .entities
      .iter(&guard)
      .filter(|key| key.kind.eq(kind))
      .count()
  }

  pub fn is_empty(&self, kind: &str) -> bool {
    self.len(kind).eq(&0)
  }

  pub fn delete_calls(&self) -> usize {
    self.delete_calls.load()
  }

  /// The most deletions observed running at once
  pub fn peak_in_flight(&self) -> usize {
    self.peak_in_flight.load()
  }

  /// Sizes of every batch passed to [`Datastore::delete_multi`], in call order
  pub fn batch_sizes(&self) -> Vec<usize> {
    std::iter::from_fn(|| self.batch_sizes.pop()).collect_vec()
  }

  fn enter(&self) {
    let current = self.in_flight.fetch_add(1) + 1;
    let mut peak = self.peak_in_flight.load();

    while current.gt(&peak) {
      match self.peak_in_flight.compare_exchange(peak, current) {
        Ok(_) => break,
        Err(observed) => peak = observed,
      }
    }
  }

  fn exit(&self) {
    self.in_flight.fetch_sub(1);
  }
}

#[async_trait::async_trait]
impl Datastore for MemoryDatastore {
  type Key = MemoryKey;

  fn keys_of_kind(&self, kind: &str) -> BoxStream<'static, Result<MemoryKey, DatastoreError>> {
    let guard = self.entities.guard();

    let keys = self
      .entities
      .iter(&guard)
      .filter(|key| key.kind.eq(kind))
      .cloned()
      .sorted()
      .map(Ok::<_, DatastoreError>)
      .collect_vec();

    drop(guard);

    match self.failing_enumeration {
      Some(count) => stream::iter(keys.into_iter().take(count))
        .chain(stream::once(async {
          Err(DatastoreError::Unavailable("enumeration interrupted".into()))
        }))
        .boxed(),
      None => stream::iter(keys).boxed(),
    }
  }

  async fn delete_multi(&self, keys: &[MemoryKey]) -> Result<(), DatastoreError> {
    let call = self.delete_calls.fetch_add(1);

    self.batch_sizes.push(keys.len());
    self.enter();

    if let Some(latency) = self.latency {
      tokio::time::sleep(latency).await;
    }

    let result = if self.failing_call.eq(&Some(call)) {
      Err(DatastoreError::Unavailable(format!("call {} rejected", call)))
    } else {
      let guard = self.entities.guard();

      for key in keys {
        self.entities.remove(key, &guard);
      }

      Ok(())
    };

    self.exit();

    result
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use futures_util::TryStreamExt;

  #[tokio::test]
  async fn it_enumerates_by_kind() {
    let store = MemoryDatastore::new()
      .with_entities("infection", 3)
      .with_entities("exposure", 2);

    let keys: Vec<MemoryKey> = store.keys_of_kind("infection").try_collect().await.unwrap();

    assert_eq!(keys.iter().map(|key| key.id).collect_vec(), vec![0, 1, 2]);
    assert_eq!(store.len("exposure"), 2);
  }

  #[tokio::test]
  async fn it_deletes_idempotently() {
    let store = MemoryDatastore::new().with_entities("infection", 2);
    let keys: Vec<MemoryKey> = store.keys_of_kind("infection").try_collect().await.unwrap();

    store.delete_multi(&keys).await.unwrap();
    store.delete_multi(&keys).await.unwrap();

    assert!(store.is_empty("infection"));
    assert_eq!(store.delete_calls(), 2);
    assert_eq!(store.batch_sizes(), vec![2, 2]);
  }

  #[tokio::test]
  async fn it_interrupts_enumeration() {
    let store = MemoryDatastore::new()
      .with_entities("infection", 5)
      .with_failing_enumeration(2);

    let results: Vec<Result<MemoryKey, DatastoreError>> =
      store.keys_of_kind("infection").collect().await;

    assert_eq!(results.len(), 3);
    assert!(matches!(
      results.last(),
      Some(Err(DatastoreError::Unavailable(_)))
    ));
  }
}
