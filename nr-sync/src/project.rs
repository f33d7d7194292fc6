use crate::newrelic::MonitoredEntity;
use regex::Regex;
use std::collections::HashMap;

/// Derive the registry application name for an entity.
///
/// Registry names must match `[-.\w]+`, so whitespace is folded away:
/// a whitespace-hyphen-whitespace run collapses to a single hyphen, then
/// every remaining whitespace run becomes one hyphen. The result is
/// namespaced and suffixed with the platform application id, which keeps
/// names distinct across entities that share a display name.
pub fn registry_app_name(namespace: &str, entity: &MonitoredEntity) -> String {
    format!(
        "{}_{}_{}",
        namespace,
        sanitize_display_name(&entity.name),
        entity.application_id
    )
}

fn sanitize_display_name(name: &str) -> String {
    let collapsed = replace_pattern(name, r"\s+-\s+", "-");
    replace_pattern(&collapsed, r"\s+", "-")
}

fn replace_pattern(input: &str, pattern: &str, replacement: &str) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(input, replacement).to_string(),
        Err(_) => input.to_string()
    }
}

/// Flatten entity tags into a string map and overlay the scalar fields
/// (`applicationId`, `guid`, `language`, `reporting`, `permalink`).
///
/// Each entity tag contributes its first value; tags with no values are
/// skipped. Scalar fields win over a tag of the same key.
pub fn registry_app_tags(entity: &MonitoredEntity) -> HashMap<String, String> {
    let mut tags: HashMap<String, String> = entity
        .tags
        .iter()
        .filter_map(|tag| tag.values.first().map(|value| (tag.key.clone(), value.clone())))
        .collect();

    tags.insert("applicationId".to_string(), entity.application_id.to_string());
    tags.insert("guid".to_string(), entity.guid.clone());
    if let Some(language) = &entity.language {
        tags.insert("language".to_string(), language.clone());
    }
    tags.insert("reporting".to_string(), entity.reporting.to_string());
    tags.insert("permalink".to_string(), entity.permalink.clone());

    tags
}
