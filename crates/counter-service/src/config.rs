use crate::error::ConfigError;
use std::{env, net::SocketAddr};
use url::Url;

/// Resolves `name`, honoring a `{name}_ENV` variable that redirects the lookup to another variable
fn get_redirected_var<F>(var: &F, name: &str) -> Option<String>
where
  F: Fn(&str) -> Option<String>,
{
  let redirect = var(&format!("{}_ENV", name)).unwrap_or_else(|| name.to_string());

  var(&redirect)
}

pub(crate) fn get_connection_url<F>(var: F) -> Result<String, ConfigError>
where
  F: Fn(&str) -> Option<String>,
{
  if let Some(redis_url) = get_redirected_var(&var, "REDIS_URL") {
    return Ok(redis_url);
  }

  let hostname =
    get_redirected_var(&var, "REDIS_HOSTNAME").unwrap_or_else(|| String::from("localhost"));

  let port = get_redirected_var(&var, "REDIS_PORT").unwrap_or_else(|| String::from("6379"));

  let database = get_redirected_var(&var, "REDIS_DATABASE").unwrap_or_else(|| String::from("0"));

  let mut url = Url::parse(&format!("redis://{}:{}/{}", hostname, port, database))?;

  if let Some(password) = get_redirected_var(&var, "REDIS_PASSWORD") {
    // The userinfo encode set leaves `%` alone, redis decodes it
    let password = password.replace('%', "%25");

    url
      .set_username("default")
      .and_then(|_| url.set_password(Some(&password)))
      .map_err(|_| ConfigError::Credentials(hostname))?;
  }

  Ok(url.into())
}

pub struct Config {
  pub redis_url: String,
  pub listen_addr: SocketAddr,
}

impl Config {
  pub fn from_env() -> Result<Self, ConfigError> {
    Config::from_vars(|name| env::var(name).ok())
  }

  fn from_vars<F>(var: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let redis_url = get_connection_url(&var)?;

    let port = var("PORT")
      .and_then(|port| port.parse::<u16>().ok())
      .unwrap_or(8080);

    Ok(Config {
      redis_url,
      listen_addr: ([0, 0, 0, 0], port).into(),
    })
  }
}
