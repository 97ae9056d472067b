use log::{error, info};

mod config;
mod counter;
mod error;
mod routes;

use config::Config;
use counter::RedisCounter;
use routes::routes;

#[tokio::main]
async fn main() {
  dotenv::dotenv().ok();
  pretty_env_logger::init();

  let config = match Config::from_env() {
    Ok(config) => config,
    Err(err) => {
      error!("{}", err);
      std::process::exit(1);
    }
  };

  let counter = match RedisCounter::connect(&config.redis_url).await {
    Ok(counter) => counter,
    Err(err) => {
      error!("Unable to establish Redis connection: {}", err);
      std::process::exit(1);
    }
  };

  info!("Connected to Redis");

  let shutdown = async {
    tokio::signal::ctrl_c().await.ok();
  };

  let (addr, server) = match warp::serve(routes(counter))
    .try_bind_with_graceful_shutdown(config.listen_addr, shutdown)
  {
    Ok(bound) => bound,
    Err(err) => {
      error!("Unable to bind {}: {}", config.listen_addr, err);
      std::process::exit(1);
    }
  };

  info!("Listening on http://{}", addr);

  server.await;

  info!("Shut down");
}
