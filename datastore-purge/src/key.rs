use std::fmt::Debug;

/// Identifies one entity to be deleted; typically [`crate::datastore::EntityKey`] or an integer in tests
pub trait Key: Send + Sync + Clone + Debug + 'static {}
impl<T: Send + Sync + Clone + Debug + 'static> Key for T {}

/// A datastore kind. Derive with [`datastore_purge_derive::Kind`]
pub trait Kind {
  const NAME: &'static str;
}
