use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::newrelic::{EntitySearchResult, MonitoredEntity, NerdGraphClient};
use crate::project::{registry_app_name, registry_app_tags};
use crate::registry::{CreateOutcome, RegistryClient};
use crate::schema::{AttributeGroupSchema, load_schema_bundles};
use crate::secrets::{SecretProvider, resolve_user_key};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SyncService {
    registry: Arc<dyn RegistryClient>,
    namespace: String
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Entities returned by the discovery query.
    pub discovered: usize,
    /// Total count advertised by the discovery API.
    pub advertised_count: i64,
    /// Distinct platform application ids among the discovered entities.
    pub unique_applications: usize,
    /// Distinct registry application references produced.
    pub applications_synced: usize,
    /// Entity categories with a usable attribute group reference.
    pub groups_mapped: usize,
    pub errors: Vec<SyncFailure>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailure {
    pub kind: String,
    pub subject: String,
    pub error: String,
    pub timestamp: DateTime<Utc>
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            ..Default::default()
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn add_error(&mut self, kind: &str, subject: &str, error: impl ToString) {
        self.errors.push(SyncFailure {
            kind: kind.to_string(),
            subject: subject.to_string(),
            error: error.to_string(),
            timestamp: Utc::now()
        });
    }

    pub fn summary(&self) -> String {
        format!(
            "{} apps, {} unique apps, {} apps created, {} failures",
            self.discovered,
            self.unique_applications,
            self.applications_synced,
            self.errors.len()
        )
    }
}

impl SyncService {
    pub fn new(registry: Arc<dyn RegistryClient>, namespace: impl Into<String>) -> Self {
        Self {
            registry,
            namespace: namespace.into()
        }
    }

    /// Ensure one attribute group per schema bundle, keyed by entity type.
    ///
    /// A conflict means the group already exists under the same idempotency
    /// token; its name then stands in as the reference. Any other failure
    /// leaves the category unmapped and is recorded in the report.
    pub async fn provision_attribute_groups(
        &self,
        schemas: &[AttributeGroupSchema],
        report: &mut SyncReport
    ) -> HashMap<String, String> {
        let mut groups = HashMap::new();

        for schema in schemas {
            let entity_type = match schema.entity_type() {
                Ok(entity_type) => entity_type.to_string(),
                Err(e) => {
                    warn!(bundle = %schema.name, error = %e, "Skipping malformed schema bundle");
                    report.add_error("attribute_group", &schema.name, &e);
                    continue;
                }
            };

            match self
                .registry
                .create_attribute_group(
                    &schema.name,
                    &schema.description,
                    &schema.attributes,
                    &schema.name
                )
                .await
            {
                Ok(CreateOutcome::Created(id)) => {
                    info!(group = %schema.name, id = %id, "Created attribute group");
                    groups.insert(entity_type, id);
                }
                Ok(CreateOutcome::AlreadyExists) => {
                    warn!(group = %schema.name, "Attribute group already exists, reusing name as reference");
                    groups.insert(entity_type, schema.name.clone());
                }
                Err(e) => {
                    warn!(group = %schema.name, error = %e, "Failed to create attribute group");
                    report.add_error("attribute_group", &schema.name, &e);
                }
            }
        }

        report.groups_mapped = groups.len();
        groups
    }

    /// Create-or-resolve a registry application per entity, in input order,
    /// and associate it with its category's attribute group.
    ///
    /// Only creation failure skips an entity's association and reference; a
    /// failed or skipped association still yields a reference.
    pub async fn sync_applications(
        &self,
        entities: &[MonitoredEntity],
        groups: &HashMap<String, String>,
        report: &mut SyncReport
    ) {
        report.discovered = entities.len();
        report.unique_applications = entities
            .iter()
            .map(|entity| entity.application_id)
            .collect::<HashSet<_>>()
            .len();
        info!(
            total = report.discovered,
            unique = report.unique_applications,
            "Synchronizing discovered applications"
        );

        let mut references: Vec<String> = Vec::new();

        for entity in entities {
            let name = registry_app_name(&self.namespace, entity);
            let tags = registry_app_tags(entity);
            let client_token = entity.application_id.to_string();

            let app_ref = match self
                .registry
                .create_application(&name, &tags, &client_token)
                .await
            {
                Ok(CreateOutcome::Created(id)) => {
                    debug!(application = %name, id = %id, "Created application");
                    id
                }
                Ok(CreateOutcome::AlreadyExists) => {
                    warn!(application = %name, "Application already exists, reusing name as reference");
                    name.clone()
                }
                Err(e) => {
                    warn!(application = %name, error = %e, "Failed to create application");
                    report.add_error("application", &client_token, &e);
                    continue;
                }
            };

            match groups.get(&entity.entity_type) {
                Some(group_ref) => {
                    match self
                        .registry
                        .associate_attribute_group(&app_ref, group_ref)
                        .await
                    {
                        Ok(()) => {
                            info!(application = %app_ref, group = %group_ref, "Associated attribute group");
                        }
                        Err(e) => {
                            warn!(application = %app_ref, group = %group_ref, error = %e, "Failed to associate attribute group");
                            report.add_error("association", &app_ref, &e);
                        }
                    }
                }
                None => {
                    warn!(
                        application = %app_ref,
                        entity_type = %entity.entity_type,
                        "No attribute group for entity type, skipping association"
                    );
                    report.add_error(
                        "association",
                        &app_ref,
                        format!("no attribute group for entity type {}", entity.entity_type)
                    );
                }
            }

            references.push(app_ref);
        }

        report.applications_synced = references.iter().collect::<HashSet<_>>().len();
    }
}

/// One full synchronization run: resolve the credential, discover entities,
/// provision attribute groups, then reconcile applications. Everything up to
/// and including schema loading is fatal on failure; past that the run
/// degrades per item.
pub async fn run_sync(
    config: &SyncConfig,
    secrets: &dyn SecretProvider,
    registry: Arc<dyn RegistryClient>
) -> SyncResult<SyncReport> {
    config.validate()?;
    let mut report = SyncReport::new();

    let user_key = resolve_user_key(secrets, &config.user_key_secret_arn).await?;

    let discovery = NerdGraphClient::new(config.nerdgraph_endpoint.clone(), user_key)?;
    let EntitySearchResult { count, entities } = discovery.search_applications().await?;
    report.advertised_count = count;

    let schemas = load_schema_bundles(Path::new(&config.schema_dir))?;

    let service = SyncService::new(registry, config.namespace.clone());
    let groups = service.provision_attribute_groups(&schemas, &mut report).await;
    service.sync_applications(&entities, &groups, &mut report).await;

    report.complete();
    info!(
        discovered = report.discovered,
        unique = report.unique_applications,
        synced = report.applications_synced,
        groups = report.groups_mapped,
        errors = report.errors.len(),
        "Sync completed"
    );

    Ok(report)
}
