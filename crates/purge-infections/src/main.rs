use datastore_purge::{
  datastore::RestDatastore,
  purge::{ConsoleReporter, Purge, PurgeSettings},
  Kind,
};
use log::{error, info};
use std::sync::Arc;

#[derive(Kind)]
#[kind(name = "infection")]
struct Infection;

#[tokio::main]
async fn main() {
  dotenv::dotenv().ok();
  pretty_env_logger::init();

  let store = match RestDatastore::from_env() {
    Ok(store) => Arc::new(store),
    Err(err) => {
      error!("Unable to configure Datastore client: {}", err);
      std::process::exit(1);
    }
  };

  let result = Purge::new(store)
    .with_settings(PurgeSettings::from_env())
    .run::<Infection, _>(ConsoleReporter)
    .await;

  match result {
    Ok(summary) => info!(
      "Deleted {} {} entities",
      summary.deleted,
      Infection::NAME
    ),
    Err(err) => {
      error!("Purge failed: {}", err);
      std::process::exit(1);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn it_targets_the_infection_kind() {
    assert_eq!(Infection::NAME, "infection");
  }
}
