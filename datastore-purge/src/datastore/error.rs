use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to, or configuring, a [`super::Datastore`]
#[derive(Error, Debug)]
pub enum DatastoreError {
  #[error("Missing configuration: {0}")]
  MissingConfig(&'static str),
  #[error("Invalid endpoint URL")]
  InvalidEndpoint(#[from] url::ParseError),
  #[error("Unable to acquire access token: {0}")]
  Credentials(String),
  #[error("Datastore responded with {status}: {body}")]
  Status { status: StatusCode, body: String },
  #[error(transparent)]
  Http(#[from] reqwest::Error),
  #[error(transparent)]
  Decode(#[from] serde_json::Error),
  #[error("Query cursor {0} did not advance")]
  StalledCursor(String),
  #[error("Datastore unavailable: {0}")]
  Unavailable(String),
}
