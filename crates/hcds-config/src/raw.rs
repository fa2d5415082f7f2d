use serde::{Deserialize, Serialize};

/// Raw YAML representation of a provider config file.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RawProvider {
    /// Default project for datasets that do not name one.
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Override for the Healthcare API endpoint.
    #[serde(default)]
    pub healthcare_base_path: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Raw YAML representation of a dataset manifest: a list of declared datasets.
#[derive(Debug, Deserialize, Serialize)]
pub struct RawManifest {
    #[serde(default)]
    pub datasets: Vec<RawDataset>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawDataset {
    pub name: String,
    pub location: String,
    pub project: Option<String>,
    pub time_zone: Option<String>,
}
