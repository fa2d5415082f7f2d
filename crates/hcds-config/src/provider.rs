use hcds_domain::{resolve, DatasetId, DomainError};
use tracing::debug;

pub const DEFAULT_HEALTHCARE_BASE_PATH: &str = "https://healthcare.googleapis.com/v1beta1/";

/// Location used for new datasets when no region is configured.
pub const DEFAULT_LOCATION: &str = "us-central1";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Environment variables checked, in order, for the default project.
const PROJECT_ENV_VARS: &[&str] = &["GOOGLE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"];
const REGION_ENV_VARS: &[&str] = &["GOOGLE_REGION", "GCLOUD_REGION", "CLOUDSDK_COMPUTE_REGION"];
const BASE_PATH_ENV_VAR: &str = "GOOGLE_HEALTHCARE_CUSTOM_ENDPOINT";
const ACCESS_TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Provider-level settings shared by every dataset operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Default project. Empty means none is configured.
    pub project: String,
    /// Default location for datasets created without one.
    pub region: Option<String>,
    /// Healthcare API endpoint; always ends with `/`.
    pub healthcare_base_path: String,
    /// Static bearer token. When absent, Application Default Credentials are used.
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            region: None,
            healthcare_base_path: DEFAULT_HEALTHCARE_BASE_PATH.to_string(),
            access_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.healthcare_base_path = normalize_base_path(base_path);
        self
    }

    /// Build a config purely from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Layer non-empty environment values over this config.
    pub fn with_env_overrides(self) -> Self {
        self.overlay(|key| std::env::var(key).ok())
    }

    /// Layer values from `lookup` over this config. Empty values are ignored.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some((key, project)) = first_set(&lookup, PROJECT_ENV_VARS) {
            debug!(var = key, %project, "default project from environment");
            self.project = project;
        }
        if let Some((_, region)) = first_set(&lookup, REGION_ENV_VARS) {
            self.region = Some(region);
        }
        if let Some((_, base)) = first_set(&lookup, &[BASE_PATH_ENV_VAR]) {
            self.healthcare_base_path = normalize_base_path(&base);
        }
        if let Some((_, token)) = first_set(&lookup, &[ACCESS_TOKEN_ENV_VAR]) {
            self.access_token = Some(token);
        }
        self
    }

    pub fn default_project(&self) -> Option<&str> {
        Some(self.project.as_str()).filter(|p| !p.is_empty())
    }

    pub fn default_location(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    /// Resolve an import-style dataset id, defaulting the project from this config.
    pub fn resolve_dataset_id(&self, input: &str) -> Result<DatasetId, DomainError> {
        resolve(input, self.default_project())
    }

    /// Full URL of a dataset in the Healthcare API.
    pub fn dataset_url(&self, id: &DatasetId) -> String {
        format!("{}{}", self.healthcare_base_path, id.resource_path())
    }
}

/// First key in `keys` with a non-empty value.
fn first_set<F>(lookup: &F, keys: &[&'static str]) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .find_map(|k| lookup(k).filter(|v| !v.is_empty()).map(|v| (*k, v)))
}

/// Append the trailing `/` resource paths are joined onto.
pub fn normalize_base_path(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ProviderConfig::default();
        assert_eq!(cfg.healthcare_base_path, DEFAULT_HEALTHCARE_BASE_PATH);
        assert_eq!(cfg.default_project(), None);
        assert_eq!(cfg.request_timeout_secs, 60);
    }

    #[test]
    fn project_env_precedence() {
        let cfg = ProviderConfig::default().overlay(env(&[
            ("GOOGLE_PROJECT", ""),
            ("GOOGLE_CLOUD_PROJECT", "from-cloud"),
            ("GCLOUD_PROJECT", "from-gcloud"),
        ]));
        assert_eq!(cfg.project, "from-cloud");
    }

    #[test]
    fn overlay_keeps_file_values_when_env_empty() {
        let cfg = ProviderConfig::default()
            .with_project("file-project")
            .overlay(env(&[]));
        assert_eq!(cfg.project, "file-project");
    }

    #[test]
    fn custom_endpoint_is_normalized() {
        let cfg = ProviderConfig::default().overlay(env(&[(
            "GOOGLE_HEALTHCARE_CUSTOM_ENDPOINT",
            "http://localhost:8080/v1",
        )]));
        assert_eq!(cfg.healthcare_base_path, "http://localhost:8080/v1/");
    }

    #[test]
    fn with_base_path_appends_slash() {
        let cfg = ProviderConfig::default().with_base_path("http://127.0.0.1:9000");
        assert_eq!(cfg.healthcare_base_path, "http://127.0.0.1:9000/");
    }

    #[test]
    fn default_location_follows_region() {
        assert_eq!(ProviderConfig::default().default_location(), "us-central1");
        let cfg = ProviderConfig::default().overlay(env(&[("GOOGLE_REGION", "europe-west2")]));
        assert_eq!(cfg.default_location(), "europe-west2");
    }

    #[test]
    fn normalize_base_path_is_idempotent() {
        assert_eq!(normalize_base_path("http://h/v1"), "http://h/v1/");
        assert_eq!(normalize_base_path("http://h/v1/"), "http://h/v1/");
    }

    #[test]
    fn resolves_ids_with_default_project() {
        let cfg = ProviderConfig::default().with_project("test-project");
        let id = cfg.resolve_dataset_id("us-central1/test-dataset").unwrap();
        assert_eq!(id.short_key(), "test-project/us-central1/test-dataset");
        assert_eq!(
            cfg.dataset_url(&id),
            "https://healthcare.googleapis.com/v1beta1/projects/test-project/locations/us-central1/datasets/test-dataset"
        );

        let err = ProviderConfig::default()
            .resolve_dataset_id("us-central1/test-dataset")
            .unwrap_err();
        assert!(matches!(err, DomainError::MissingProjectDefault(_)));
    }
}
