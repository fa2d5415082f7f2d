use async_trait::async_trait;
use hcds_domain::{Dataset, DatasetId};
use serde_json::Value;

use crate::error::DriverError;

/// Operations on Healthcare datasets.
///
/// Every method addresses a dataset by its [`DatasetId`] except [`fetch`](Self::fetch),
/// which reads an arbitrary URL built by the caller (used when verifying teardown).
#[async_trait]
pub trait DatasetDriver: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    // ── Mutating ──────────────────────────────────────────────────────────────

    /// Create a dataset. `time_zone` None leaves the API default (`UTC`).
    async fn create(&self, id: &DatasetId, time_zone: Option<&str>) -> Result<Dataset, DriverError>;

    async fn update_time_zone(&self, id: &DatasetId, time_zone: &str)
        -> Result<Dataset, DriverError>;

    async fn delete(&self, id: &DatasetId) -> Result<(), DriverError>;

    // ── Read-only ─────────────────────────────────────────────────────────────

    /// Read a dataset. Returns [`DriverError::NotFound`] when it does not exist.
    async fn get(&self, id: &DatasetId) -> Result<Dataset, DriverError>;

    /// GET a raw API URL and return the decoded body.
    async fn fetch(&self, url: &str) -> Result<Value, DriverError>;
}
