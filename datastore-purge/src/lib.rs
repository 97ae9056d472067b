//! ```rust
//! use datastore_purge::{
//!   datastore::RestDatastore,
//!   purge::{ConsoleReporter, Purge, PurgeSettings},
//!   Kind,
//! };
//! use std::sync::Arc;
//!
//! #[derive(Kind)]
//! #[kind(name = "infection")]
//! pub struct Infection;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let store = Arc::new(RestDatastore::from_env()?);
//!
//!   let summary = Purge::new(store)
//!     .with_settings(PurgeSettings::from_env())
//!     .run::<Infection, _>(ConsoleReporter)
//!     .await?;
//!
//!   assert!(summary.batches.ge(&1));
//!
//!   Ok(())
//! }
//! ```

pub mod batch;
pub mod datastore;
mod error;
mod key;
pub mod purge;
#[doc(hidden)]
pub mod request;
pub mod task;
pub mod worker;

pub use datastore_purge_derive::Kind;
pub use error::PurgeError;
pub use key::{Key, Kind};
