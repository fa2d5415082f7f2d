use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Resource type name under which datasets are tracked in state.
pub const RESOURCE_TYPE: &str = "google_healthcare_dataset";

/// A dataset located by project, location and name.
///
/// Two renderings are derived from the same three fields:
/// - the short key `{project}/{location}/{name}`, used as the resource id in state
/// - the resource path `projects/{project}/locations/{location}/datasets/{name}`,
///   used to address the dataset in the Healthcare API
///
/// The project may carry a domain prefix (`example.com:my-project`); it is
/// treated as a single opaque token.
///
/// Serializes as the short key. Deserializing goes through [`resolve`] without
/// a fallback project, so only the full three-segment form is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasetId {
    project: String,
    location: String,
    name: String,
}

impl DatasetId {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            name: name.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_key(&self) -> String {
        format!("{}/{}/{}", self.project, self.location, self.name)
    }

    pub fn resource_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/datasets/{}",
            self.project, self.location, self.name
        )
    }

    /// Parse a fully-qualified resource path as returned in the API's `name` field.
    pub fn from_resource_path(path: &str) -> Result<Self, DomainError> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["projects", project, "locations", location, "datasets", name]
                if !project.is_empty() && !location.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(*project, *location, *name))
            }
            _ => Err(DomainError::MalformedResourcePath(path.to_string())),
        }
    }
}

impl std::fmt::Display for DatasetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.location, self.name)
    }
}

/// Parses the full `{project}/{location}/{name}` form only. Use [`resolve`]
/// when a default project is available.
impl std::str::FromStr for DatasetId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s, None)
    }
}

impl TryFrom<String> for DatasetId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        resolve(&s, None)
    }
}

impl From<DatasetId> for String {
    fn from(id: DatasetId) -> Self {
        id.short_key()
    }
}

/// Resolve a user-supplied dataset id into a [`DatasetId`].
///
/// Accepted shapes:
/// - `{project}/{location}/{name}`
/// - `{location}/{name}`, with the project taken from `fallback_project`
///
/// Every segment must be non-empty.
pub fn resolve(input: &str, fallback_project: Option<&str>) -> Result<DatasetId, DomainError> {
    let segments: Vec<&str> = input.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DomainError::MalformedIdentifier(input.to_string()));
    }

    match segments.as_slice() {
        [project, location, name] => Ok(DatasetId::new(*project, *location, *name)),
        [location, name] => match fallback_project.filter(|p| !p.is_empty()) {
            Some(project) => Ok(DatasetId::new(project, *location, *name)),
            None => Err(DomainError::MissingProjectDefault(input.to_string())),
        },
        _ => Err(DomainError::MalformedIdentifier(input.to_string())),
    }
}
