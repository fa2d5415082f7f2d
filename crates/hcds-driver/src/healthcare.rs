use std::time::Duration;

use async_trait::async_trait;
use hcds_config::{normalize_base_path, ProviderConfig};
use hcds_domain::{Dataset, DatasetId, DEFAULT_TIME_ZONE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::driver::DatasetDriver;
use crate::error::DriverError;

// ── Token provider ────────────────────────────────────────────────────────────

/// Abstraction over GCP token acquisition, so tests can inject a fixed token.
#[async_trait]
trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, DriverError>;
}

/// Production token provider backed by Application Default Credentials.
struct AdcTokenProvider {
    inner: std::sync::Arc<dyn gcp_auth::TokenProvider>,
}

#[async_trait]
impl TokenProvider for AdcTokenProvider {
    async fn token(&self) -> Result<String, DriverError> {
        let token = self
            .inner
            .token(&["https://www.googleapis.com/auth/cloud-platform"])
            .await
            .map_err(|e| DriverError::Internal(format!("GCP auth failed: {}", e)))?;
        Ok(token.as_str().to_string())
    }
}

/// Fixed bearer token, from `access_token` in config or from tests.
struct StaticToken(String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String, DriverError> {
        Ok(self.0.clone())
    }
}

// ── HealthcareDriver ──────────────────────────────────────────────────────────

/// [`DatasetDriver`] backed by the Cloud Healthcare REST API.
pub struct HealthcareDriver {
    client: reqwest::Client,
    token:  Box<dyn TokenProvider>,
    /// API base, always ending with `/`. Resource paths are appended directly.
    base:   String,
}

impl HealthcareDriver {
    /// Build a driver from provider config.
    ///
    /// Uses `access_token` when set, otherwise Application Default Credentials:
    /// 1. `GOOGLE_APPLICATION_CREDENTIALS` env var (service account JSON key)
    /// 2. Workload Identity (when running on GCP)
    /// 3. `gcloud auth application-default login` for local dev
    pub async fn from_config(config: &ProviderConfig) -> Result<Self, DriverError> {
        let token: Box<dyn TokenProvider> = match &config.access_token {
            Some(t) => Box::new(StaticToken(t.clone())),
            None => {
                let inner = gcp_auth::provider().await.map_err(|e| {
                    DriverError::Internal(format!("Failed to initialise GCP ADC: {}", e))
                })?;
                Box::new(AdcTokenProvider { inner })
            }
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DriverError::Internal(format!("build http client: {}", e)))?;
        Ok(Self {
            client,
            token,
            base: config.healthcare_base_path.clone(),
        })
    }

    /// Build a driver with a fixed bearer token against `base_path`.
    pub fn with_static_token(base_path: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token:  Box::new(StaticToken(token.to_string())),
            base:   normalize_base_path(base_path),
        }
    }

    async fn bearer(&self) -> Result<String, DriverError> {
        self.token.token().await
    }

    fn dataset_url(&self, id: &DatasetId) -> String {
        format!("{}{}", self.base, id.resource_path())
    }

    // ── GCP error parsing ─────────────────────────────────────────────────────

    /// Render a GCP REST error envelope as
    ///   `"PERMISSION_DENIED: The caller does not have permission [IAM_PERMISSION_DENIED: healthcare.datasets.create]"`
    fn extract_gcp_error(body: &Value) -> String {
        let err = &body["error"];
        let status  = err["status"].as_str().unwrap_or("UNKNOWN");
        let message = err["message"].as_str().unwrap_or("unknown error");

        let detail_suffix = err["details"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|d| {
                let reason = d["reason"].as_str()?;
                let meta_vals: Vec<&str> = d["metadata"]
                    .as_object()
                    .map(|m| m.values().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();
                Some(format!(" [{}: {}]", reason, meta_vals.join(", ")))
            })
            .unwrap_or_default();

        format!("{}: {}{}", status, message, detail_suffix)
    }

    /// Map an HTTP response to its JSON body or a [`DriverError`].
    /// An empty success body (DELETE) decodes as `{}`. A success body is
    /// returned as-is, even when it carries an `error` field (finished operations do).
    async fn read_response(url: &str, resp: reqwest::Response) -> Result<Value, DriverError> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| DriverError::Internal(format!("read {}: {}", url, e)))?;
        let body: Result<Value, _> = if text.trim().is_empty() {
            Ok(json!({}))
        } else {
            serde_json::from_str(&text)
        };

        match status {
            StatusCode::NOT_FOUND => Err(DriverError::NotFound(url.to_string())),
            s if !s.is_success() => {
                let body = body.unwrap_or_else(|_| {
                    json!({ "error": { "status": s.as_str(), "message": text } })
                });
                Err(DriverError::Api(Self::extract_gcp_error(&body)))
            }
            _ => body.map_err(|e| DriverError::Internal(format!("decode {}: {}", url, e))),
        }
    }

    /// Reject a success body that is really a GCP error envelope.
    fn reject_error_envelope(body: Value) -> Result<Value, DriverError> {
        if body.get("error").is_some() {
            return Err(DriverError::Api(Self::extract_gcp_error(&body)));
        }
        Ok(body)
    }

    fn dataset_from_body(body: &Value) -> Result<Dataset, DriverError> {
        let name = body["name"]
            .as_str()
            .ok_or_else(|| DriverError::Internal("dataset response has no name".into()))?;
        let id = DatasetId::from_resource_path(name)
            .map_err(|e| DriverError::Internal(e.to_string()))?;
        let time_zone = body["timeZone"]
            .as_str()
            .filter(|tz| !tz.is_empty())
            .unwrap_or(DEFAULT_TIME_ZONE)
            .to_string();
        Ok(Dataset { id, time_zone })
    }

    fn is_operation(body: &Value) -> bool {
        body["name"]
            .as_str()
            .map_or(false, |n| n.contains("/operations/"))
    }

    // ── Long-running operation polling ────────────────────────────────────────

    /// Poll a long-running operation URL until it completes or times out.
    ///
    /// Backoff: 1 s, 2 s, 4 s, 8 s, 16 s, 30 s, 30 s, … (max 30 polls).
    async fn wait_for_operation(&self, op_url: &str) -> Result<Value, DriverError> {
        let token = self.bearer().await?;
        let delays = [1u64, 2, 4, 8, 16, 30];

        for &delay in delays.iter().cycle().take(30) {
            let resp = self
                .client
                .get(op_url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| DriverError::Internal(format!("poll {}: {}", op_url, e)))?;
            let op = Self::read_response(op_url, resp).await?;

            if op["done"].as_bool().unwrap_or(false) {
                if op.get("error").is_some() {
                    let msg = Self::extract_gcp_error(&json!({ "error": op["error"] }));
                    return Err(DriverError::Api(format!("operation failed: {}", msg)));
                }
                return Ok(op["response"].clone());
            }

            debug!(op_url, delay, "operation still running");
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        Err(DriverError::Api("operation timed out after 30 polls".into()))
    }

    async fn send_raw(
        &self,
        req: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, DriverError> {
        let token = self.bearer().await?;
        req.bearer_auth(&token)
            .send()
            .await
            .map_err(|e| DriverError::Internal(format!("request {}: {}", url, e)))
    }

    async fn send(&self, req: reqwest::RequestBuilder, url: &str) -> Result<Value, DriverError> {
        let resp = self.send_raw(req, url).await?;
        Self::reject_error_envelope(Self::read_response(url, resp).await?)
    }
}

// ── DatasetDriver impl ────────────────────────────────────────────────────────

#[async_trait]
impl DatasetDriver for HealthcareDriver {
    fn name(&self) -> &'static str {
        "healthcare"
    }

    async fn create(&self, id: &DatasetId, time_zone: Option<&str>) -> Result<Dataset, DriverError> {
        let url = format!(
            "{}projects/{}/locations/{}/datasets",
            self.base,
            id.project(),
            id.location()
        );
        let mut body = json!({});
        if let Some(tz) = time_zone {
            body["timeZone"] = json!(tz);
        }

        info!(dataset = %id, time_zone = ?time_zone, "Creating healthcare dataset");
        let req = self
            .client
            .post(&url)
            .query(&[("datasetId", id.name())])
            .json(&body);
        let resp = self.send_raw(req, &url).await?;
        // Only a create conflict means the dataset exists; 409 elsewhere is ABORTED.
        if resp.status() == StatusCode::CONFLICT {
            return Err(DriverError::AlreadyExists(id.resource_path()));
        }
        let resp = Self::reject_error_envelope(Self::read_response(&url, resp).await?)?;

        let created = if Self::is_operation(&resp) {
            let op_name = resp["name"].as_str().unwrap_or_default();
            let op_url = format!("{}{}", self.base, op_name);
            self.wait_for_operation(&op_url).await?
        } else {
            resp
        };

        // Some API versions return an empty operation response; read the dataset back.
        if created.get("name").is_some() {
            Self::dataset_from_body(&created)
        } else {
            self.get(id).await
        }
    }

    async fn update_time_zone(
        &self,
        id: &DatasetId,
        time_zone: &str,
    ) -> Result<Dataset, DriverError> {
        let url = self.dataset_url(id);
        info!(dataset = %id, time_zone, "Updating healthcare dataset time zone");
        let req = self
            .client
            .patch(&url)
            .query(&[("updateMask", "timeZone")])
            .json(&json!({ "timeZone": time_zone }));
        let resp = self.send(req, &url).await?;
        Self::dataset_from_body(&resp)
    }

    async fn delete(&self, id: &DatasetId) -> Result<(), DriverError> {
        let url = self.dataset_url(id);
        info!(dataset = %id, "Deleting healthcare dataset");
        self.send(self.client.delete(&url), &url).await?;
        Ok(())
    }

    async fn get(&self, id: &DatasetId) -> Result<Dataset, DriverError> {
        let url = self.dataset_url(id);
        debug!(dataset = %id, "Reading healthcare dataset");
        let resp = self.send(self.client.get(&url), &url).await?;
        Self::dataset_from_body(&resp)
    }

    async fn fetch(&self, url: &str) -> Result<Value, DriverError> {
        self.send(self.client.get(url), url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const DATASET_PATH: &str = "/projects/test-project/locations/us-central1/datasets/test-dataset";

    fn driver(server: &MockServer) -> HealthcareDriver {
        HealthcareDriver::with_static_token(&server.uri(), "fake-token")
    }

    fn test_id() -> DatasetId {
        DatasetId::new("test-project", "us-central1", "test-dataset")
    }

    fn dataset_body(time_zone: &str) -> Value {
        json!({
            "name":     "projects/test-project/locations/us-central1/datasets/test-dataset",
            "timeZone": time_zone,
        })
    }

    // ── GCP error parsing (pure, no mocking) ──────────────────────────────────

    #[test]
    fn parse_gcp_error_simple() {
        let body = json!({
            "error": {
                "code":    403,
                "status":  "PERMISSION_DENIED",
                "message": "The caller does not have permission",
            }
        });
        let msg = HealthcareDriver::extract_gcp_error(&body);
        assert_eq!(msg, "PERMISSION_DENIED: The caller does not have permission");
    }

    #[test]
    fn parse_gcp_error_with_error_info_details() {
        let body = json!({
            "error": {
                "code":    403,
                "status":  "PERMISSION_DENIED",
                "message": "The caller does not have permission",
                "details": [{
                    "@type":    "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason":   "IAM_PERMISSION_DENIED",
                    "metadata": { "permission": "healthcare.datasets.create" },
                }],
            }
        });
        let msg = HealthcareDriver::extract_gcp_error(&body);
        assert_eq!(
            msg,
            "PERMISSION_DENIED: The caller does not have permission [IAM_PERMISSION_DENIED: healthcare.datasets.create]"
        );
    }

    #[test]
    fn parse_gcp_error_missing_fields_gives_fallback() {
        let msg = HealthcareDriver::extract_gcp_error(&json!({ "error": {} }));
        assert_eq!(msg, "UNKNOWN: unknown error");
    }

    #[test]
    fn dataset_body_without_time_zone_defaults_to_utc() {
        let ds = HealthcareDriver::dataset_from_body(&json!({
            "name": "projects/p/locations/l/datasets/d",
        }))
        .unwrap();
        assert_eq!(ds.id, DatasetId::new("p", "l", "d"));
        assert_eq!(ds.time_zone, "UTC");
    }

    // ── create ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_returns_dataset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/test-project/locations/us-central1/datasets"))
            .and(query_param("datasetId", "test-dataset"))
            .and(header("authorization", "Bearer fake-token"))
            .and(body_json(json!({ "timeZone": "America/New_York" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(dataset_body("America/New_York")))
            .expect(1)
            .mount(&server)
            .await;

        let ds = driver(&server)
            .create(&test_id(), Some("America/New_York"))
            .await
            .unwrap();
        assert_eq!(ds.id, test_id());
        assert_eq!(ds.time_zone, "America/New_York");
    }

    #[tokio::test]
    async fn create_polls_long_running_operation() {
        let server = MockServer::start().await;
        let op_name = "projects/test-project/locations/us-central1/datasets/test-dataset/operations/op-1";
        Mock::given(method("POST"))
            .and(path("/projects/test-project/locations/us-central1/datasets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": op_name })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", op_name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name":     op_name,
                "done":     true,
                "response": dataset_body("UTC"),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ds = driver(&server).create(&test_id(), None).await.unwrap();
        assert_eq!(ds.time_zone, "UTC");
    }

    #[tokio::test]
    async fn create_surfaces_failed_operation() {
        let server = MockServer::start().await;
        let op_name = "projects/test-project/locations/us-central1/datasets/test-dataset/operations/op-fail";
        Mock::given(method("POST"))
            .and(path("/projects/test-project/locations/us-central1/datasets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": op_name })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}", op_name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": op_name,
                "done": true,
                "error": {
                    "code":    400,
                    "status":  "INVALID_ARGUMENT",
                    "message": "invalid time zone",
                },
            })))
            .mount(&server)
            .await;

        let err = driver(&server)
            .create(&test_id(), Some("Mars/Olympus"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DriverError::Api(ref m) if m == "operation failed: INVALID_ARGUMENT: invalid time zone"),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn operation_polling_reads_error_body_raw() {
        let op = json!({ "name": "op", "done": false, "error": { "status": "ABORTED" } });
        let body = HealthcareDriver::reject_error_envelope(op.clone());
        assert!(matches!(body, Err(DriverError::Api(_))));

        // Polling reads the raw body so `done` is inspected before `error`.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/op"))
            .respond_with(ResponseTemplate::new(200).set_body_json(op.clone()))
            .mount(&server)
            .await;
        let url = format!("{}/op", server.uri());
        let resp = reqwest::get(&url).await.unwrap();
        let raw = HealthcareDriver::read_response(&url, resp).await.unwrap();
        assert_eq!(raw, op);
    }

    #[tokio::test]
    async fn create_conflict_is_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects/test-project/locations/us-central1/datasets"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": { "code": 409, "status": "ALREADY_EXISTS", "message": "exists" },
            })))
            .mount(&server)
            .await;

        let err = driver(&server).create(&test_id(), None).await.unwrap_err();
        assert!(matches!(err, DriverError::AlreadyExists(ref p) if p == &test_id().resource_path()));
    }

    #[tokio::test]
    async fn update_conflict_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": { "code": 409, "status": "ABORTED", "message": "concurrent modification" },
            })))
            .mount(&server)
            .await;

        let err = driver(&server)
            .update_time_zone(&test_id(), "UTC")
            .await
            .unwrap_err();
        assert!(
            matches!(err, DriverError::Api(ref m) if m == "ABORTED: concurrent modification"),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn delete_conflict_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": { "code": 409, "status": "ABORTED", "message": "operation in progress" },
            })))
            .mount(&server)
            .await;

        let err = driver(&server).delete(&test_id()).await.unwrap_err();
        assert!(matches!(err, DriverError::Api(_)), "got {err:?}");
    }

    #[test]
    fn static_token_driver_normalizes_base() {
        let d = HealthcareDriver::with_static_token("http://127.0.0.1:9000/v1", "t");
        assert_eq!(
            d.dataset_url(&test_id()),
            "http://127.0.0.1:9000/v1/projects/test-project/locations/us-central1/datasets/test-dataset"
        );
    }

    // ── get / update / delete ─────────────────────────────────────────────────

    #[tokio::test]
    async fn get_missing_dataset_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = driver(&server).get(&test_id()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn get_error_envelope_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "status": "PERMISSION_DENIED", "message": "denied" },
            })))
            .mount(&server)
            .await;

        let err = driver(&server).get(&test_id()).await.unwrap_err();
        assert!(matches!(err, DriverError::Api(ref m) if m == "PERMISSION_DENIED: denied"));
    }

    #[tokio::test]
    async fn update_patches_time_zone_with_mask() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(DATASET_PATH))
            .and(query_param("updateMask", "timeZone"))
            .and(body_json(json!({ "timeZone": "America/New_York" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(dataset_body("America/New_York")))
            .expect(1)
            .mount(&server)
            .await;

        let ds = driver(&server)
            .update_time_zone(&test_id(), "America/New_York")
            .await
            .unwrap();
        assert_eq!(ds.time_zone, "America/New_York");
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        driver(&server).delete(&test_id()).await.unwrap();
    }

    #[tokio::test]
    async fn fetch_returns_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DATASET_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(dataset_body("UTC")))
            .mount(&server)
            .await;

        let url = format!("{}{}", server.uri(), DATASET_PATH);
        let body = driver(&server).fetch(&url).await.unwrap();
        assert_eq!(body["timeZone"], "UTC");
    }
}
