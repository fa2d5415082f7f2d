use std::collections::BTreeMap;

use hcds_domain::{resolve, Dataset, DatasetId, DomainError, RESOURCE_TYPE};
use serde::{Deserialize, Serialize};

/// Tracked resources, keyed by address (`google_healthcare_dataset.dataset`).
/// Data sources use addresses prefixed with `data.`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub resources: BTreeMap<String, ResourceState>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    pub fn insert(&mut self, address: impl Into<String>, resource: ResourceState) {
        self.resources.insert(address.into(), resource);
    }

    pub fn remove(&mut self, address: &str) -> Option<ResourceState> {
        self.resources.remove(address)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Managed dataset resources: type matches and the address is not a data source.
    pub fn datasets(&self) -> impl Iterator<Item = (&str, &ResourceState)> {
        self.resources
            .iter()
            .filter(|(addr, rs)| rs.resource_type == RESOURCE_TYPE && !addr.starts_with("data."))
            .map(|(addr, rs)| (addr.as_str(), rs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Short key `{project}/{location}/{name}`.
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    /// State entry for a dataset read from the API. `base_path` builds `self_link`.
    pub fn from_dataset(dataset: &Dataset, base_path: &str) -> Self {
        let id = &dataset.id;
        let attributes = BTreeMap::from([
            ("project".to_string(), id.project().to_string()),
            ("location".to_string(), id.location().to_string()),
            ("name".to_string(), id.name().to_string()),
            ("time_zone".to_string(), dataset.time_zone.clone()),
            ("self_link".to_string(), format!("{}{}", base_path, id.resource_path())),
        ]);
        Self {
            resource_type: RESOURCE_TYPE.to_string(),
            id: id.short_key(),
            attributes,
        }
    }

    /// Attribute value; empty strings count as unset.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn dataset_id(&self) -> Result<DatasetId, DomainError> {
        resolve(&self.id, None)
    }

    /// Attribute-level differences against `other`, rendered `key: "a" => "b"`.
    pub fn diff(&self, other: &ResourceState) -> Vec<String> {
        let mut diffs = Vec::new();
        if self.id != other.id {
            diffs.push(format!("id: {:?} => {:?}", self.id, other.id));
        }
        let keys: std::collections::BTreeSet<&String> =
            self.attributes.keys().chain(other.attributes.keys()).collect();
        for key in keys {
            let a = self.attributes.get(key);
            let b = other.attributes.get(key);
            if a != b {
                diffs.push(format!(
                    "{}: {:?} => {:?}",
                    key,
                    a.map(String::as_str).unwrap_or(""),
                    b.map(String::as_str).unwrap_or("")
                ));
            }
        }
        diffs
    }
}
