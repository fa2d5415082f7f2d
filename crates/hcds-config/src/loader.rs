use std::path::Path;

use hcds_domain::DatasetConfig;
use tracing::debug;

use crate::error::ConfigError;
use crate::provider::{normalize_base_path, ProviderConfig};
use crate::raw::{RawDataset, RawManifest, RawProvider};

/// Load a provider config file.
///
/// ```text
/// project: my-project
/// region: us-central1
/// healthcare_base_path: https://healthcare.googleapis.com/v1beta1/
/// request_timeout_secs: 60
/// ```
///
/// Every key is optional. Environment overrides are not applied here; call
/// [`ProviderConfig::with_env_overrides`] on the result.
pub fn load_provider_config(path: &Path) -> Result<ProviderConfig, ConfigError> {
    let raw: RawProvider = read_yaml(path)?;
    let config = convert_provider(raw, path)?;
    debug!(path = %path.display(), project = %config.project, "loaded provider config");
    Ok(config)
}

/// Load a manifest of declared datasets.
///
/// ```text
/// datasets:
///   - name: my-dataset
///     location: us-central1
///     time_zone: America/New_York
/// ```
pub fn load_dataset_configs(path: &Path) -> Result<Vec<DatasetConfig>, ConfigError> {
    let raw: RawManifest = read_yaml(path)?;
    let datasets = raw
        .datasets
        .into_iter()
        .map(|d| convert_dataset(d, path))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(path = %path.display(), count = datasets.len(), "loaded dataset manifest");
    Ok(datasets)
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })
}

fn convert_provider(raw: RawProvider, path: &Path) -> Result<ProviderConfig, ConfigError> {
    let mut config = ProviderConfig::default();
    if let Some(project) = raw.project {
        if project.contains('/') {
            return Err(ConfigError::Conversion {
                path: path.display().to_string(),
                message: format!("project {:?} must not contain '/'", project),
            });
        }
        config.project = project;
    }
    config.region = raw.region.filter(|r| !r.is_empty());
    if let Some(base) = raw.healthcare_base_path.filter(|b| !b.is_empty()) {
        config.healthcare_base_path = normalize_base_path(&base);
    }
    config.access_token = raw.access_token.filter(|t| !t.is_empty());
    if let Some(secs) = raw.request_timeout_secs {
        if secs == 0 {
            return Err(ConfigError::Conversion {
                path: path.display().to_string(),
                message: "request_timeout_secs must be greater than zero".into(),
            });
        }
        config.request_timeout_secs = secs;
    }
    Ok(config)
}

fn convert_dataset(raw: RawDataset, path: &Path) -> Result<DatasetConfig, ConfigError> {
    for (field, value) in [("name", &raw.name), ("location", &raw.location)] {
        if value.is_empty() || value.contains('/') {
            return Err(ConfigError::Conversion {
                path: path.display().to_string(),
                message: format!("dataset {} {:?} must be non-empty and contain no '/'", field, value),
            });
        }
    }
    Ok(DatasetConfig {
        name: raw.name,
        location: raw.location,
        project: raw.project.filter(|p| !p.is_empty()),
        time_zone: raw.time_zone.filter(|t| !t.is_empty()),
    })
}
