use super::{
  credentials::TokenSource, Datastore, DatastoreConfig, DatastoreError, EntityKey, PartitionId,
};
use futures_util::{
  stream::{self, BoxStream},
  StreamExt, TryStreamExt,
};
use itertools::Itertools;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{future::Future, sync::Arc, time::Duration};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
  partition_id: PartitionId,
  query: Query<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Query<'a> {
  kind: [KindExpression<'a>; 1],
  projection: [Projection; 1],
  #[serde(skip_serializing_if = "Option::is_none")]
  start_cursor: Option<String>,
}

#[derive(Serialize)]
struct KindExpression<'a> {
  name: &'a str,
}

#[derive(Serialize)]
struct Projection {
  property: PropertyReference,
}

#[derive(Serialize)]
struct PropertyReference {
  name: &'static str,
}

#[derive(Deserialize)]
struct RunQueryResponse {
  batch: QueryResultBatch,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResultBatch {
  #[serde(default)]
  entity_results: Vec<EntityResult>,
  end_cursor: Option<String>,
  more_results: MoreResults,
}

#[derive(Deserialize)]
struct EntityResult {
  entity: KeyOnlyEntity,
}

#[derive(Deserialize)]
struct KeyOnlyEntity {
  key: EntityKey,
}

#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum MoreResults {
  NotFinished,
  MoreResultsAfterLimit,
  MoreResultsAfterCursor,
  NoMoreResults,
  #[serde(other)]
  Unspecified,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
  mode: &'static str,
  mutations: Vec<Mutation<'a>>,
}

#[derive(Serialize)]
struct Mutation<'a> {
  delete: &'a EntityKey,
}

#[derive(Deserialize)]
struct CommitResponse {}

enum Page {
  Start,
  Cursor(String),
  Done,
}

impl QueryResultBatch {
  /// Paging continues for as long as the store reports more results, including across empty batches
  fn into_page(
    self,
    start_cursor: Option<&str>,
  ) -> Result<(Vec<EntityKey>, Page), DatastoreError> {
    let next = match (&self.more_results, self.end_cursor) {
      (MoreResults::NotFinished | MoreResults::MoreResultsAfterLimit, Some(cursor)) => {
        if start_cursor.eq(&Some(cursor.as_str())) {
          return Err(DatastoreError::StalledCursor(cursor));
        }

        Page::Cursor(cursor)
      }
      _ => Page::Done,
    };

    let keys = self
      .entity_results
      .into_iter()
      .map(|result| result.entity.key)
      .collect_vec();

    Ok((keys, next))
  }
}

/// Flatten the pages returned by `fetch`, which is called with the cursor to resume from
fn paginate<F, Fut>(fetch: F) -> BoxStream<'static, Result<EntityKey, DatastoreError>>
where
  F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<QueryResultBatch, DatastoreError>> + Send + 'static,
{
  let fetch = Arc::new(fetch);

  stream::try_unfold(Page::Start, move |page| {
    let fetch = fetch.clone();

    async move {
      let start_cursor = match page {
        Page::Start => None,
        Page::Cursor(cursor) => Some(cursor),
        Page::Done => return Ok(None),
      };

      let batch = fetch(start_cursor.clone()).await?;
      let (keys, next) = batch.into_page(start_cursor.as_deref())?;

      Ok::<_, DatastoreError>(Some((keys, next)))
    }
  })
  .map_ok(|keys| stream::iter(keys.into_iter().map(Ok::<_, DatastoreError>)))
  .try_flatten()
  .boxed()
}

/// [`Datastore`] backed by the Cloud Datastore v1 REST API
#[derive(Clone)]
pub struct RestDatastore {
  http: reqwest::Client,
  config: Arc<DatastoreConfig>,
  tokens: Arc<TokenSource>,
}

impl RestDatastore {
  pub fn new(config: DatastoreConfig) -> Result<Self, DatastoreError> {
    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()?;

    let tokens = Arc::new(TokenSource::new(config.credentials.clone()));

    Ok(RestDatastore {
      http,
      config: Arc::new(config),
      tokens,
    })
  }

  pub fn from_env() -> Result<Self, DatastoreError> {
    RestDatastore::new(DatastoreConfig::from_env()?)
  }

  fn method_url(&self, method: &str) -> Result<Url, DatastoreError> {
    let url = self.config.endpoint.join(&format!(
      "v1/projects/{}:{}",
      self.config.project_id, method
    ))?;

    Ok(url)
  }

  fn partition_id(&self) -> PartitionId {
    PartitionId {
      project_id: Some(self.config.project_id.to_owned()),
      namespace_id: self.config.namespace_id.to_owned(),
    }
  }

  async fn post<Req, Res>(&self, method: &str, body: &Req) -> Result<Res, DatastoreError>
  where
    Req: Serialize + ?Sized,
    Res: DeserializeOwned,
  {
    let mut request = self.http.post(self.method_url(method)?).json(body);

    if let Some(token) = self.tokens.bearer(&self.http).await? {
      request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      return Err(DatastoreError::Status { status, body });
    }

    Ok(serde_json::from_str(&body)?)
  }

  async fn run_query(
    &self,
    kind: &str,
    start_cursor: Option<String>,
  ) -> Result<QueryResultBatch, DatastoreError> {
    let request = RunQueryRequest {
      partition_id: self.partition_id(),
      query: keys_only_query(kind, start_cursor),
    };

    let response: RunQueryResponse = self.post("runQuery", &request).await?;

    Ok(response.batch)
  }
}

fn keys_only_query(kind: &str, start_cursor: Option<String>) -> Query<'_> {
  Query {
    kind: [KindExpression { name: kind }],
    projection: [Projection {
      property: PropertyReference { name: "__key__" },
    }],
    start_cursor,
  }
}

fn delete_mutations(keys: &[EntityKey]) -> CommitRequest<'_> {
  CommitRequest {
    mode: "NON_TRANSACTIONAL",
    mutations: keys.iter().map(|key| Mutation { delete: key }).collect(),
  }
}

#[async_trait::async_trait]
impl Datastore for RestDatastore {
  type Key = EntityKey;

  fn keys_of_kind(&self, kind: &str) -> BoxStream<'static, Result<EntityKey, DatastoreError>> {
    let store = self.clone();
    let kind = kind.to_owned();

    paginate(move |start_cursor| {
      let store = store.clone();
      let kind = kind.clone();

      async move {
        let batch = store.run_query(&kind, start_cursor).await?;

        debug!(
          "Fetched page of {} {} keys",
          batch.entity_results.len(),
          kind
        );

        Ok::<_, DatastoreError>(batch)
      }
    })
  }

  async fn delete_multi(&self, keys: &[EntityKey]) -> Result<(), DatastoreError> {
    if keys.is_empty() {
      return Ok(());
    }

    let _: CommitResponse = self.post("commit", &delete_mutations(keys)).await?;

    Ok(())
  }
}
