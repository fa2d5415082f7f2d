use serde::{Deserialize, Serialize};

use crate::id::DatasetId;

/// Time zone the Healthcare API assigns when none is given at creation.
pub const DEFAULT_TIME_ZONE: &str = "UTC";

// ── Desired state ─────────────────────────────────────────────────────────────

/// A dataset as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub location: String,
    /// None means use the provider's default project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// IANA time zone name, e.g. "America/New_York". None leaves the API default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl DatasetConfig {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            project: None,
            time_zone: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Locate this dataset, using `default_project` when no project is declared.
    /// Returns None when neither is set.
    pub fn dataset_id(&self, default_project: &str) -> Option<DatasetId> {
        let project = self
            .project
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(default_project);
        if project.is_empty() {
            return None;
        }
        Some(DatasetId::new(project, &self.location, &self.name))
    }
}

// ── Observed state ────────────────────────────────────────────────────────────

/// A dataset as it exists in the Healthcare API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub time_zone: String,
}
