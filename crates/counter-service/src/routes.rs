use crate::{counter::Counter, error::CounterError};
use log::error;
use std::convert::Infallible;
use warp::{http::StatusCode, Filter, Rejection, Reply};

pub const COUNTER_KEY: &str = "counter";

/// `GET /` increments [`COUNTER_KEY`] and replies with the new value
pub fn routes<C>(counter: C) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone
where
  C: Counter,
{
  warp::path::end()
    .and(warp::get())
    .and(warp::any().map(move || counter.clone()))
    .and_then(increment::<C>)
    .recover(handle_rejection)
}

async fn increment<C>(counter: C) -> Result<String, Rejection>
where
  C: Counter,
{
  let value = counter
    .incr(COUNTER_KEY)
    .await
    .map_err(warp::reject::custom)?;

  Ok(format!("Value is {}", value))
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
  if err.is_not_found() {
    return Ok(warp::reply::with_status(
      "NOT_FOUND".to_string(),
      StatusCode::NOT_FOUND,
    ));
  }

  if let Some(err) = err.find::<CounterError>() {
    error!("Unable to increment {}: {}", COUNTER_KEY, err);
  } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
    return Ok(warp::reply::with_status(
      "METHOD_NOT_ALLOWED".to_string(),
      StatusCode::METHOD_NOT_ALLOWED,
    ));
  }

  Ok(warp::reply::with_status(
    "INTERNAL_SERVER_ERROR".to_string(),
    StatusCode::INTERNAL_SERVER_ERROR,
  ))
}
