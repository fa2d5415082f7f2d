use std::collections::HashMap;

use async_trait::async_trait;
use hcds_domain::{Dataset, DatasetId, DEFAULT_TIME_ZONE};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::driver::DatasetDriver;
use crate::error::DriverError;

/// A driver that keeps datasets in memory.
///
/// - Behaves like the API for the operations the harness uses: duplicate
///   creates fail, missing datasets are `NotFound`, the time zone defaults to `UTC`.
/// - `fetch` accepts any URL whose path contains a dataset resource path,
///   so URLs built from any base path resolve.
#[derive(Debug, Default)]
pub struct LocalDriver {
    datasets: Mutex<HashMap<DatasetId, String>>,
}

impl LocalDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of datasets currently held.
    pub async fn len(&self) -> usize {
        self.datasets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn body(id: &DatasetId, time_zone: &str) -> Value {
        json!({ "name": id.resource_path(), "timeZone": time_zone })
    }
}

#[async_trait]
impl DatasetDriver for LocalDriver {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn create(&self, id: &DatasetId, time_zone: Option<&str>) -> Result<Dataset, DriverError> {
        debug!(dataset = %id, "LocalDriver: create");
        let mut datasets = self.datasets.lock().await;
        if datasets.contains_key(id) {
            return Err(DriverError::AlreadyExists(id.resource_path()));
        }
        let time_zone = time_zone.unwrap_or(DEFAULT_TIME_ZONE).to_string();
        datasets.insert(id.clone(), time_zone.clone());
        Ok(Dataset { id: id.clone(), time_zone })
    }

    async fn update_time_zone(
        &self,
        id: &DatasetId,
        time_zone: &str,
    ) -> Result<Dataset, DriverError> {
        debug!(dataset = %id, time_zone, "LocalDriver: update_time_zone");
        let mut datasets = self.datasets.lock().await;
        let current = datasets
            .get_mut(id)
            .ok_or_else(|| DriverError::NotFound(id.resource_path()))?;
        *current = time_zone.to_string();
        Ok(Dataset { id: id.clone(), time_zone: time_zone.to_string() })
    }

    async fn delete(&self, id: &DatasetId) -> Result<(), DriverError> {
        debug!(dataset = %id, "LocalDriver: delete");
        self.datasets
            .lock()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DriverError::NotFound(id.resource_path()))
    }

    async fn get(&self, id: &DatasetId) -> Result<Dataset, DriverError> {
        self.datasets
            .lock()
            .await
            .get(id)
            .map(|tz| Dataset { id: id.clone(), time_zone: tz.clone() })
            .ok_or_else(|| DriverError::NotFound(id.resource_path()))
    }

    async fn fetch(&self, url: &str) -> Result<Value, DriverError> {
        let path = url
            .find("projects/")
            .map(|i| &url[i..])
            .ok_or_else(|| DriverError::NotFound(url.to_string()))?;
        let id = DatasetId::from_resource_path(path)
            .map_err(|_| DriverError::NotFound(url.to_string()))?;
        let ds = self.get(&id).await.map_err(|_| DriverError::NotFound(url.to_string()))?;
        Ok(Self::body(&ds.id, &ds.time_zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> DatasetId {
        DatasetId::new("test-project", "us-central1", "test-dataset")
    }

    #[tokio::test]
    async fn create_defaults_time_zone() {
        let d = LocalDriver::new();
        let ds = d.create(&id(), None).await.unwrap();
        assert_eq!(ds.time_zone, "UTC");
        assert_eq!(d.get(&id()).await.unwrap(), ds);
    }

    #[tokio::test]
    async fn duplicate_create_fails() {
        let d = LocalDriver::new();
        d.create(&id(), None).await.unwrap();
        let err = d.create(&id(), Some("UTC")).await.unwrap_err();
        assert!(matches!(err, DriverError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_then_delete() {
        let d = LocalDriver::new();
        d.create(&id(), None).await.unwrap();
        let ds = d.update_time_zone(&id(), "America/New_York").await.unwrap();
        assert_eq!(ds.time_zone, "America/New_York");

        d.delete(&id()).await.unwrap();
        assert!(d.is_empty().await);
        assert!(d.get(&id()).await.unwrap_err().is_not_found());
        assert!(d.delete(&id()).await.unwrap_err().is_not_found());
        assert!(d.update_time_zone(&id(), "UTC").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn fetch_resolves_urls_from_any_base() {
        let d = LocalDriver::new();
        d.create(&id(), Some("Europe/Berlin")).await.unwrap();

        let url = format!("https://healthcare.googleapis.com/v1beta1/{}", id().resource_path());
        let body = d.fetch(&url).await.unwrap();
        assert_eq!(body["timeZone"], "Europe/Berlin");
        assert_eq!(body["name"], id().resource_path());

        assert!(d.fetch("https://example.com/nothing").await.unwrap_err().is_not_found());
    }
}
