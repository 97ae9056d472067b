use crate::error::CounterError;
use redis::{aio::ConnectionManager, AsyncCommands};

/// An atomic counter store; increments are performed by the store itself
#[async_trait::async_trait]
pub trait Counter: Clone + Send + Sync + 'static {
  /// Increment `key` by one and return the new value
  async fn incr(&self, key: &str) -> Result<i64, CounterError>;
}

/// Redis backed [`Counter`] using a managed, reconnecting multiplexed connection
#[derive(Clone)]
pub struct RedisCounter(ConnectionManager);

impl RedisCounter {
  pub async fn connect(redis_url: &str) -> Result<Self, CounterError> {
    let client = redis::Client::open(redis_url)?;
    let conn = client.get_tokio_connection_manager().await?;

    Ok(RedisCounter(conn))
  }
}

#[async_trait::async_trait]
impl Counter for RedisCounter {
  async fn incr(&self, key: &str) -> Result<i64, CounterError> {
    let mut conn = self.0.clone();
    let value: i64 = conn.incr(key, 1).await?;

    Ok(value)
  }
}
