use super::{Credentials, DatastoreError};
use arc_swap::ArcSwapOption;
use log::debug;
use serde::Deserialize;
use std::{
  sync::Arc,
  time::{Duration, Instant},
};

const METADATA_TOKEN_URL: &str =
  "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

// Refresh this long before the metadata server says the token expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct MetadataToken {
  access_token: String,
  expires_in: u64,
}

struct CachedToken {
  token: String,
  expires_at: Instant,
}

/// Bearer tokens for [`Credentials`], cached until shortly before expiry
pub(crate) struct TokenSource {
  credentials: Credentials,
  cached: ArcSwapOption<CachedToken>,
}

impl TokenSource {
  pub(crate) fn new(credentials: Credentials) -> Self {
    TokenSource {
      credentials,
      cached: ArcSwapOption::empty(),
    }
  }

  pub(crate) async fn bearer(
    &self,
    http: &reqwest::Client,
  ) -> Result<Option<String>, DatastoreError> {
    match &self.credentials {
      Credentials::Anonymous => Ok(None),
      Credentials::Token(token) => Ok(Some(token.to_owned())),
      Credentials::MetadataServer => {
        if let Some(cached) = &*self.cached.load() {
          if cached.expires_at > Instant::now() {
            return Ok(Some(cached.token.to_owned()));
          }
        }

        let token = self.fetch_metadata_token(http).await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);

        self.cached.store(Some(Arc::new(CachedToken {
          token: token.access_token.clone(),
          expires_at: Instant::now() + lifetime,
        })));

        Ok(Some(token.access_token))
      }
    }
  }

  async fn fetch_metadata_token(
    &self,
    http: &reqwest::Client,
  ) -> Result<MetadataToken, DatastoreError> {
    debug!("Requesting access token from metadata server");

    let response = http
      .get(METADATA_TOKEN_URL)
      .header("Metadata-Flavor", "Google")
      .send()
      .await
      .map_err(|err| DatastoreError::Credentials(err.to_string()))?;

    if !response.status().is_success() {
      return Err(DatastoreError::Credentials(format!(
        "metadata server responded with {}",
        response.status()
      )));
    }

    let body = response.text().await?;

    Ok(serde_json::from_str(&body)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn it_skips_authorization_for_the_emulator() {
    let tokens = TokenSource::new(Credentials::Anonymous);

    assert_eq!(tokens.bearer(&reqwest::Client::new()).await.unwrap(), None);
  }

  #[tokio::test]
  async fn it_uses_static_tokens_verbatim() {
    let tokens = TokenSource::new(Credentials::Token("ya29.token".into()));

    assert_eq!(
      tokens.bearer(&reqwest::Client::new()).await.unwrap(),
      Some("ya29.token".to_string())
    );
  }

  #[test]
  fn it_decodes_metadata_tokens() {
    let token: MetadataToken = serde_json::from_str(
      r#"{"access_token":"ya29.abc","expires_in":3599,"token_type":"Bearer"}"#,
    )
    .unwrap();

    assert_eq!(token.access_token, "ya29.abc");
    assert_eq!(token.expires_in, 3599);
  }
}
