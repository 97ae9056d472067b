use redis::RedisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CounterError {
  #[error(transparent)]
  Redis(#[from] RedisError),
}

impl warp::reject::Reject for CounterError {}

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Invalid Redis URL: {0}")]
  InvalidUrl(#[from] url::ParseError),
  #[error("Unable to set credentials for Redis host {0}")]
  Credentials(String),
}
