use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A static attribute group bundle. The `attributes` document is opaque and
/// forwarded to the registry verbatim; the only field this system reads out
/// of it is `entityType`, which keys the group to one entity category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeGroupSchema {
    pub name: String,
    pub description: String,
    pub attributes: serde_json::Value
}

impl AttributeGroupSchema {
    pub fn entity_type(&self) -> SyncResult<&str> {
        self.attributes
            .get("entityType")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                SyncError::Schema(format!("bundle {} has no entityType attribute", self.name))
            })
    }
}

/// Load every `*.json` bundle from the schema directory, in sorted order.
///
/// Bundles are fixed deploy-time configuration; a directory with no bundles
/// or a bundle without an entity type is a startup error.
pub fn load_schema_bundles(dir: &Path) -> SyncResult<Vec<AttributeGroupSchema>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        SyncError::Schema(format!("cannot read schema directory {}: {}", dir.display(), e))
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(SyncError::Schema(format!(
            "no schema bundles found in {}",
            dir.display()
        )));
    }

    let mut bundles = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| SyncError::Schema(format!("cannot read {}: {}", path.display(), e)))?;
        let bundle: AttributeGroupSchema = serde_json::from_str(&raw)
            .map_err(|e| SyncError::Schema(format!("cannot parse {}: {}", path.display(), e)))?;
        bundle.entity_type()?;
        debug!(bundle = %bundle.name, "Loaded attribute group schema");
        bundles.push(bundle);
    }

    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_bundle(dir: &Path, file: &str, body: &str) {
        std::fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn test_load_bundles_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(
            dir.path(),
            "NewRelic-Browser-App.json",
            r#"{"name": "NewRelic-Browser-App", "description": "browser", "attributes": {"entityType": "BROWSER_APPLICATION_ENTITY"}}"#
        );
        write_bundle(
            dir.path(),
            "NewRelic-APM-App.json",
            r#"{"name": "NewRelic-APM-App", "description": "apm", "attributes": {"entityType": "APM_APPLICATION_ENTITY"}}"#
        );

        let bundles = load_schema_bundles(dir.path()).unwrap();
        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles[0].name, "NewRelic-APM-App");
        assert_eq!(bundles[1].name, "NewRelic-Browser-App");
        assert_eq!(bundles[0].entity_type().unwrap(), "APM_APPLICATION_ENTITY");
    }

    #[test]
    fn test_bundle_without_entity_type_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(
            dir.path(),
            "NewRelic-APM-App.json",
            r#"{"name": "NewRelic-APM-App", "description": "apm", "attributes": {"provider": "NewRelic"}}"#
        );

        let result = load_schema_bundles(dir.path());
        assert!(matches!(result, Err(SyncError::Schema(_))));
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_schema_bundles(dir.path());
        assert!(matches!(result, Err(SyncError::Schema(_))));
    }

    #[test]
    fn test_non_json_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "README.txt", "not a bundle");
        write_bundle(
            dir.path(),
            "NewRelic-Mobile-App.json",
            r#"{"name": "NewRelic-Mobile-App", "description": "mobile", "attributes": {"entityType": "MOBILE_APPLICATION_ENTITY"}}"#
        );

        let bundles = load_schema_bundles(dir.path()).unwrap();
        assert_eq!(bundles.len(), 1);
    }
}
