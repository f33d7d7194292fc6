use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Result of an idempotency-token-bearing create call. A token reuse is a
/// recoverable outcome, not an error; everything else surfaces as
/// `SyncError::Registry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(String),
    AlreadyExists
}

#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn create_attribute_group(
        &self,
        name: &str,
        description: &str,
        attributes: &serde_json::Value,
        client_token: &str
    ) -> SyncResult<CreateOutcome>;

    async fn create_application(
        &self,
        name: &str,
        tags: &HashMap<String, String>,
        client_token: &str
    ) -> SyncResult<CreateOutcome>;

    async fn associate_attribute_group(
        &self,
        application: &str,
        attribute_group: &str
    ) -> SyncResult<()>;
}

/// AWS Service Catalog AppRegistry backed client.
pub struct AppRegistryClient {
    client: aws_sdk_servicecatalogappregistry::Client
}

impl AppRegistryClient {
    pub async fn new(region: Option<String>, endpoint: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_sdk_servicecatalogappregistry::config::Region::new(region));
        }
        let config = loader.load().await;

        let mut builder = aws_sdk_servicecatalogappregistry::config::Builder::from(&config);
        if let Some(ep) = endpoint {
            builder = builder.endpoint_url(ep);
        }

        Self {
            client: aws_sdk_servicecatalogappregistry::Client::from_conf(builder.build())
        }
    }
}

#[async_trait]
impl RegistryClient for AppRegistryClient {
    async fn create_attribute_group(
        &self,
        name: &str,
        description: &str,
        attributes: &serde_json::Value,
        client_token: &str
    ) -> SyncResult<CreateOutcome> {
        let payload = serde_json::to_string(attributes)?;

        match self
            .client
            .create_attribute_group()
            .name(name)
            .description(description)
            .attributes(payload)
            .client_token(client_token)
            .send()
            .await
        {
            Ok(output) => {
                let id = output
                    .attribute_group()
                    .and_then(|group| group.id())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        SyncError::registry("create_attribute_group", name, "no id in response")
                    })?;
                debug!(group = %name, id = %id, "Attribute group created");
                Ok(CreateOutcome::Created(id))
            }
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_conflict_exception() {
                    Ok(CreateOutcome::AlreadyExists)
                } else {
                    Err(SyncError::registry("create_attribute_group", name, service_error))
                }
            }
        }
    }

    async fn create_application(
        &self,
        name: &str,
        tags: &HashMap<String, String>,
        client_token: &str
    ) -> SyncResult<CreateOutcome> {
        match self
            .client
            .create_application()
            .name(name)
            .set_tags(Some(tags.clone()))
            .client_token(client_token)
            .send()
            .await
        {
            Ok(output) => {
                let id = output
                    .application()
                    .and_then(|application| application.id())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        SyncError::registry("create_application", name, "no id in response")
                    })?;
                debug!(application = %name, id = %id, "Application created");
                Ok(CreateOutcome::Created(id))
            }
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_conflict_exception() {
                    Ok(CreateOutcome::AlreadyExists)
                } else {
                    Err(SyncError::registry("create_application", name, service_error))
                }
            }
        }
    }

    async fn associate_attribute_group(
        &self,
        application: &str,
        attribute_group: &str
    ) -> SyncResult<()> {
        self.client
            .associate_attribute_group()
            .application(application)
            .attribute_group(attribute_group)
            .send()
            .await
            .map_err(|e| {
                SyncError::registry(
                    "associate_attribute_group",
                    application,
                    e.into_service_error()
                )
            })?;

        Ok(())
    }
}
