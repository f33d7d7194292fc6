use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// NerdGraph API endpoint the discovery query is posted to.
    pub nerdgraph_endpoint: String,
    /// Secrets Manager identifier of the secret holding the user key.
    pub user_key_secret_arn: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_schema_dir")]
    pub schema_dir: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub registry_endpoint: Option<String>,
    #[serde(default)]
    pub secrets_endpoint: Option<String>
}

fn default_namespace() -> String {
    "NewRelic".to_string()
}

fn default_schema_dir() -> String {
    "schemas".to_string()
}

impl SyncConfig {
    /// The required fields arrive through the environment; catch an empty
    /// value before any remote call is made.
    pub fn validate(&self) -> SyncResult<()> {
        if self.nerdgraph_endpoint.is_empty() {
            return Err(SyncError::Config("nerdgraph_endpoint is empty".to_string()));
        }
        if self.user_key_secret_arn.is_empty() {
            return Err(SyncError::Config("user_key_secret_arn is empty".to_string()));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            nerdgraph_endpoint: String::new(),
            user_key_secret_arn: String::new(),
            namespace: default_namespace(),
            schema_dir: default_schema_dir(),
            region: None,
            registry_endpoint: None,
            secrets_endpoint: None
        }
    }
}
