use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Field of the secret payload carrying the NerdGraph user key.
const USER_KEY_FIELD: &str = "UserKey";

#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Retrieve the raw secret payload for an identifier.
    async fn get_secret(&self, secret_id: &str) -> SyncResult<String>;
}

/// AWS Secrets Manager backed provider.
pub struct SecretsManagerProvider {
    client: aws_sdk_secretsmanager::Client
}

impl SecretsManagerProvider {
    pub async fn new(region: Option<String>, endpoint: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_sdk_secretsmanager::config::Region::new(region));
        }
        let config = loader.load().await;

        let mut builder = aws_sdk_secretsmanager::config::Builder::from(&config);
        if let Some(ep) = endpoint {
            builder = builder.endpoint_url(ep);
        }

        Self {
            client: aws_sdk_secretsmanager::Client::from_conf(builder.build())
        }
    }
}

#[async_trait]
impl SecretProvider for SecretsManagerProvider {
    async fn get_secret(&self, secret_id: &str) -> SyncResult<String> {
        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| SyncError::CredentialUnavailable(e.to_string()))?;

        response
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| {
                SyncError::CredentialUnavailable(format!(
                    "secret {} has no string payload",
                    secret_id
                ))
            })
    }
}

/// In-memory provider for local development and tests.
pub struct LocalSecretProvider {
    secrets: HashMap<String, String>
}

impl LocalSecretProvider {
    pub fn new(secrets: HashMap<String, String>) -> Self {
        Self { secrets }
    }
}

#[async_trait]
impl SecretProvider for LocalSecretProvider {
    async fn get_secret(&self, secret_id: &str) -> SyncResult<String> {
        self.secrets
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SyncError::CredentialUnavailable(format!("secret not found: {}", secret_id)))
    }
}

/// Extract the user key from a structured secret payload.
pub fn user_key_from_payload(payload: &str) -> SyncResult<String> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(|e| {
        SyncError::CredentialUnavailable(format!("secret payload is not valid JSON: {}", e))
    })?;

    value
        .get(USER_KEY_FIELD)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            SyncError::CredentialUnavailable(format!(
                "secret payload missing {} field",
                USER_KEY_FIELD
            ))
        })
}

/// Fetch and unwrap the user key. Any failure here is fatal for the run.
pub async fn resolve_user_key(
    provider: &dyn SecretProvider,
    secret_id: &str
) -> SyncResult<String> {
    let payload = provider.get_secret(secret_id).await?;
    debug!(secret_id = %secret_id, "Fetched credential payload");
    user_key_from_payload(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key_extraction() {
        let payload = r#"{"UserKey": "NRAK-ABC123"}"#;
        assert_eq!(user_key_from_payload(payload).unwrap(), "NRAK-ABC123");
    }

    #[test]
    fn test_user_key_missing_field() {
        let result = user_key_from_payload(r#"{"ApiKey": "NRAK-ABC123"}"#);
        assert!(matches!(result, Err(SyncError::CredentialUnavailable(_))));
    }

    #[test]
    fn test_user_key_invalid_payload() {
        let result = user_key_from_payload("not json");
        assert!(matches!(result, Err(SyncError::CredentialUnavailable(_))));
    }

    #[tokio::test]
    async fn test_local_provider_resolves_key() {
        let mut secrets = HashMap::new();
        secrets.insert(
            "arn:aws:secretsmanager:us-east-1:123456789012:secret:nr".to_string(),
            r#"{"UserKey": "NRAK-XYZ"}"#.to_string()
        );
        let provider = LocalSecretProvider::new(secrets);

        let key = resolve_user_key(
            &provider,
            "arn:aws:secretsmanager:us-east-1:123456789012:secret:nr"
        )
        .await
        .unwrap();
        assert_eq!(key, "NRAK-XYZ");
    }

    #[tokio::test]
    async fn test_local_provider_unknown_secret() {
        let provider = LocalSecretProvider::new(HashMap::new());
        let result = resolve_user_key(&provider, "missing").await;
        assert!(matches!(result, Err(SyncError::CredentialUnavailable(_))));
    }
}
