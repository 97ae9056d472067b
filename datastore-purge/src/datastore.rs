mod config;
mod credentials;
mod entity;
mod error;
#[cfg(test)]
pub(crate) mod memory;
mod rest;

use crate::key::Key;
use futures_util::stream::BoxStream;

pub use config::{Credentials, DatastoreConfig};
pub use entity::{EntityKey, PartitionId, PathElement};
pub use error::DatastoreError;
pub use rest::RestDatastore;

/// The per-call mutation limit of Cloud Datastore
pub const MAX_BATCH_SIZE: usize = 500;

/// A store whose entities can be enumerated by kind and deleted in bulk
#[async_trait::async_trait]
pub trait Datastore: Send + Sync + 'static {
  type Key: Key;
  /// Upper bound on the number of keys accepted by a single [`Datastore::delete_multi`] call
  const MAX_BATCH_SIZE: usize = MAX_BATCH_SIZE;

  /// Lazily enumerate the key of every entity of `kind`
  fn keys_of_kind(&self, kind: &str) -> BoxStream<'static, Result<Self::Key, DatastoreError>>;

  /// Delete all `keys`. Deleting a key that no longer exists is not an error
  async fn delete_multi(&self, keys: &[Self::Key]) -> Result<(), DatastoreError>;
}
