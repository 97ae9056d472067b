use serde::{Deserialize, Serialize};

/// A Cloud Datastore entity key in its REST representation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct EntityKey {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub partition_id: Option<PartitionId>,
  #[serde(default)]
  pub path: Vec<PathElement>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PartitionId {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub namespace_id: Option<String>,
}

/// One `(kind, id | name)` step of a key path. Numeric ids are int64 encoded as strings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathElement {
  pub kind: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

impl EntityKey {
  /// The kind of the entity this key identifies
  pub fn kind(&self) -> Option<&str> {
    self.path.last().map(|element| element.kind.as_str())
  }
}
