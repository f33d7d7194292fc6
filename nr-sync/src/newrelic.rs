use crate::error::{SyncError, SyncResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Entity search across every supported application category, issued as a
/// single fixed request. No pagination, no per-category filtering.
pub const ENTITY_SEARCH_QUERY: &str = r#"
{
  actor {
    entitySearch(queryBuilder: {type: APPLICATION}) {
      query
      results {
        entities {
          reporting
          ... on AlertableEntityOutline {
            alertSeverity
          }
          type
          domain
          entityType
          ... on ApmApplicationEntityOutline {
            runningAgentVersions {
              maxVersion
              minVersion
            }
            language
            applicationId
            settings {
              apdexTarget
              serverSideConfig
            }
          }
          ... on BrowserApplicationEntityOutline {
            runningAgentVersions {
              maxVersion
              minVersion
            }
            servingApmApplicationId
            agentInstallType
            applicationId
            settings {
              apdexTarget
            }
          }
          ... on MobileApplicationEntityOutline {
            applicationId
          }
          tags {
            key
            values
          }
          name
          permalink
          guid
        }
      }
      count
    }
  }
}
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredEntity {
    #[serde(rename = "entityType")]
    pub entity_type: String,
    pub name: String,
    #[serde(rename = "applicationId")]
    pub application_id: i64,
    pub guid: String,
    pub permalink: String,
    #[serde(default)]
    pub language: Option<String>,
    pub reporting: bool,
    #[serde(default)]
    pub tags: Vec<EntityTag>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTag {
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>
}

#[derive(Debug, Clone)]
pub struct EntitySearchResult {
    /// Total count advertised by the API alongside the entity list.
    pub count: i64,
    pub entities: Vec<MonitoredEntity>
}

pub struct NerdGraphClient {
    client: Client,
    endpoint: String,
    user_key: String
}

impl NerdGraphClient {
    pub fn new(endpoint: String, user_key: String) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(SyncError::Http)?;

        Ok(Self {
            client,
            endpoint,
            user_key
        })
    }

    /// Issue the discovery query and parse the nested entity search payload.
    ///
    /// An empty entity list with a success status is a valid zero-result
    /// run; transport errors, non-success statuses and shape mismatches are
    /// all fatal.
    pub async fn search_applications(&self) -> SyncResult<EntitySearchResult> {
        debug!(endpoint = %self.endpoint, "Issuing NerdGraph entity search");

        let response = self
            .client
            .post(&self.endpoint)
            .header("API-Key", &self.user_key)
            .body(ENTITY_SEARCH_QUERY)
            .send()
            .await
            .map_err(|e| SyncError::DiscoveryQueryFailed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::DiscoveryQueryFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let body: GraphQlResponse = response.json().await.map_err(|e| {
            SyncError::DiscoveryQueryFailed(format!("unexpected response shape: {}", e))
        })?;

        let search = body.data.actor.entity_search;
        info!(
            count = search.count,
            entities = search.results.entities.len(),
            "Entities discovered"
        );

        Ok(EntitySearchResult {
            count: search.count,
            entities: search.results.entities
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: ResponseData
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    actor: Actor
}

#[derive(Debug, Deserialize)]
struct Actor {
    #[serde(rename = "entitySearch")]
    entity_search: EntitySearch
}

#[derive(Debug, Deserialize)]
struct EntitySearch {
    count: i64,
    results: SearchResults
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    entities: Vec<MonitoredEntity>
}
