use super::DatastoreError;
use std::env;
use url::Url;

const DEFAULT_ENDPOINT: &str = "https://datastore.googleapis.com/";

/// How requests are authorized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
  /// No authorization header; used against the Datastore emulator
  Anonymous,
  /// A pre-issued OAuth2 bearer token
  Token(String),
  /// Tokens issued by the GCE / Cloud Run metadata server for the default service account
  MetadataServer,
}

#[derive(Debug, Clone)]
pub struct DatastoreConfig {
  pub project_id: String,
  pub namespace_id: Option<String>,
  pub endpoint: Url,
  pub credentials: Credentials,
}

impl DatastoreConfig {
  /// Resolve configuration from ambient environment variables
  pub fn from_env() -> Result<Self, DatastoreError> {
    Self::from_vars(|name| env::var(name).ok())
  }

  pub(crate) fn from_vars<F>(var: F) -> Result<Self, DatastoreError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let project_id = var("DATASTORE_PROJECT_ID")
      .or_else(|| var("GOOGLE_CLOUD_PROJECT"))
      .filter(|project_id| !project_id.is_empty())
      .ok_or(DatastoreError::MissingConfig(
        "DATASTORE_PROJECT_ID or GOOGLE_CLOUD_PROJECT",
      ))?;

    let namespace_id = var("DATASTORE_NAMESPACE").filter(|namespace| !namespace.is_empty());

    let (endpoint, credentials) = match var("DATASTORE_EMULATOR_HOST") {
      Some(host) => (
        Url::parse(&format!("http://{}/", host))?,
        Credentials::Anonymous,
      ),
      None => {
        let credentials = match var("GOOGLE_OAUTH_ACCESS_TOKEN") {
          Some(token) => Credentials::Token(token),
          None => Credentials::MetadataServer,
        };

        (Url::parse(DEFAULT_ENDPOINT)?, credentials)
      }
    };

    Ok(DatastoreConfig {
      project_id,
      namespace_id,
      endpoint,
      credentials,
    })
  }
}
