//! Scanner API client.
//!
//! [`ApiClient`] is a thin wrapper around `reqwest` that knows the API base
//! URL and the `X-Auth` key. It exposes generic JSON helpers used by the CLI's
//! resource subcommands and implements [`ResourceClient`], the narrow trait the
//! auto workflow depends on. Tests drive the workflow through
//! `MockResourceClient` instead.
//!
//! # Endpoints
//!
//! | Operation | Target | Scan | Report | Export |
//! |-----------|--------|------|--------|--------|
//! | create    | `POST /targets/add` | `POST /scans` | `POST /reports` | `POST /exports` |
//! | read      | `GET /targets/{id}` | `GET /scans/{id}` | `GET /reports/{id}` | `GET /exports/{id}` |
//! | delete    | `POST /targets/delete` | `DELETE /scans/{id}` | `POST /reports/delete` | `POST /exports/delete` |

use std::fmt;
use std::future::Future;
use std::path::Path;

use acuctl_core::config::ApiConfig;
use acuctl_core::metrics as m;
use acuctl_core::types::{CreateRequest, ResourceKind, ResourceStatus};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::error::WorkflowError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Auth";

/// Maximum number of body characters kept in error messages.
const ERROR_BODY_LIMIT: usize = 512;

/// Rejects ids that would change the request path.
///
/// Ids are opaque strings issued by the service, so only the characters that
/// break out of a path segment are refused.
pub fn validate_resource_id(kind: impl fmt::Display, id: &str) -> Result<(), WorkflowError> {
    if id.trim().is_empty() {
        return Err(WorkflowError::Validation(format!("{kind} id is empty")));
    }
    if id.contains(['/', '?', '#', '%']) || id.contains("..") {
        return Err(WorkflowError::Validation(format!(
            "invalid {kind} id '{id}': contains path characters"
        )));
    }
    Ok(())
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_LIMIT {
        body.to_owned()
    } else {
        let mut truncated: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        truncated.push_str("...");
        truncated
    }
}

/// Operations the auto workflow needs from the scanner service.
///
/// The trait is `Send + Sync + 'static` so the orchestrator can hold it in an
/// `Arc` and drive it from any tokio task.
///
/// # Implementations
///
/// - [`ApiClient`]: HTTP implementation
/// - `MockResourceClient`: scripted responses (tests only)
pub trait ResourceClient: Send + Sync + 'static {
    /// Creates a resource and returns the id the service assigned.
    ///
    /// # Errors
    ///
    /// - `Rejected`: non-2xx response
    /// - `Decode`: body is not JSON
    /// - `MissingField`: the id field is absent
    fn create(
        &self,
        request: &CreateRequest,
    ) -> impl Future<Output = Result<String, WorkflowError>> + Send;

    /// Succeeds only when reading the resource returns 200.
    fn ensure_exists(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> impl Future<Output = Result<(), WorkflowError>> + Send;

    /// Reads the current status (and download links for reports/exports).
    ///
    /// For scans the status lives at `current_session.status`; for every other
    /// kind it is the top-level `status` field.
    fn status(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> impl Future<Output = Result<ResourceStatus, WorkflowError>> + Send;

    /// Deletes a resource and returns the observed HTTP status.
    ///
    /// Any 2xx is success. Other statuses yield `WorkflowError::Delete`.
    fn delete(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> impl Future<Output = Result<u16, WorkflowError>> + Send;

    /// Streams a download link into `dest` and returns the bytes written.
    ///
    /// The parent directory of `dest` must already exist.
    fn download(
        &self,
        link: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, WorkflowError>> + Send;
}

/// Response of a generic API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json(&self, kind: ResourceKind) -> Result<Value, WorkflowError> {
        serde_json::from_str(&self.body).map_err(|e| WorkflowError::Decode {
            kind,
            reason: e.to_string(),
        })
    }

    /// Returns the decoded body, or `{status_code, body}` when it is not JSON.
    ///
    /// Empty bodies (e.g. `204 No Content`) are reported the same way.
    pub fn into_value(self) -> Value {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(value) if !self.body.trim().is_empty() => value,
            _ => json!({
                "status_code": self.status,
                "body": self.body,
            }),
        }
    }
}

/// HTTP client for the scanner REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Builds a client from the `[api]` config section.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` if the URL does not parse or the API
    /// key is not a valid header value, and `WorkflowError::Request` if the TLS
    /// backend fails to initialize.
    pub fn from_config(config: &ApiConfig) -> Result<Self, WorkflowError> {
        let base_url = Url::parse(&config.url).map_err(|e| {
            WorkflowError::Validation(format!("invalid api url '{}': {e}", config.url))
        })?;

        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let mut key = HeaderValue::from_str(&config.api_key).map_err(|_| {
                WorkflowError::Validation("api key contains invalid header characters".to_owned())
            })?;
            key.set_sensitive(true);
            headers.insert(API_KEY_HEADER, key);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| WorkflowError::request(config.url.as_str(), &e))?;

        Ok(Self { http, base_url })
    }

    /// Configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins an API path (starting with `/`) onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Resolves a download link returned by the service.
    ///
    /// Absolute links are used as-is. A relative link that already starts with
    /// the base path (`/api/v1/...`) is joined onto the origin so the prefix is
    /// not doubled; any other relative link is joined onto the base URL.
    pub fn resolve_link(&self, link: &str) -> Result<Url, WorkflowError> {
        let invalid =
            |e: url::ParseError| WorkflowError::Validation(format!("invalid link '{link}': {e}"));

        if link.starts_with("http://") || link.starts_with("https://") {
            return Url::parse(link).map_err(invalid);
        }

        let link_path = if link.starts_with('/') {
            link.to_owned()
        } else {
            format!("/{link}")
        };
        let base_path = self.base_url.path().trim_end_matches('/');
        let origin = self.base_url.origin().ascii_serialization();

        let already_prefixed = !base_path.is_empty()
            && (link_path == base_path || link_path.starts_with(&format!("{base_path}/")));
        let full = if already_prefixed {
            format!("{origin}{link_path}")
        } else {
            format!("{origin}{base_path}{link_path}")
        };
        Url::parse(&full).map_err(invalid)
    }

    /// `GET {base}{path}`
    pub async fn get(&self, path: &str) -> Result<ApiResponse, WorkflowError> {
        let url = self.endpoint(path);
        self.send(self.http.get(&url), "GET", url).await
    }

    /// `POST {base}{path}` with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, WorkflowError> {
        let url = self.endpoint(path);
        self.send(self.http.post(&url).json(body), "POST", url).await
    }

    /// `PATCH {base}{path}` with a JSON body.
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, WorkflowError> {
        let url = self.endpoint(path);
        self.send(self.http.patch(&url).json(body), "PATCH", url).await
    }

    /// `DELETE {base}{path}`
    pub async fn delete_path(&self, path: &str) -> Result<ApiResponse, WorkflowError> {
        let url = self.endpoint(path);
        self.send(self.http.delete(&url), "DELETE", url).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        method: &'static str,
        url: String,
    ) -> Result<ApiResponse, WorkflowError> {
        metrics::counter!(m::API_REQUESTS_TOTAL, m::LABEL_METHOD => method).increment(1);

        let response = request
            .send()
            .await
            .map_err(|e| WorkflowError::request(url.as_str(), &e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| WorkflowError::request(url.as_str(), &e))?;

        debug!(method, url = %url, status, "api request completed");
        Ok(ApiResponse { status, body })
    }

    fn resource_path(kind: ResourceKind, id: &str) -> String {
        format!("{}/{}", kind.collection_path(), id)
    }
}

/// Extracts the id from a create response.
///
/// Exports report their id under `report_id`, like reports do.
fn created_id(kind: ResourceKind, body: &Value) -> Result<String, WorkflowError> {
    let (pointer, field) = match kind {
        ResourceKind::Target => ("/targets/0/target_id", "targets[0].target_id"),
        ResourceKind::Scan => ("/scan_id", "scan_id"),
        ResourceKind::Report | ResourceKind::Export => ("/report_id", "report_id"),
    };
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .ok_or(WorkflowError::MissingField { kind, field })
}

/// Extracts status and download links from a read response.
fn parse_status(kind: ResourceKind, body: &Value) -> Result<ResourceStatus, WorkflowError> {
    let (pointer, field) = match kind {
        ResourceKind::Scan => ("/current_session/status", "current_session.status"),
        _ => ("/status", "status"),
    };
    let status = body
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or(WorkflowError::MissingField { kind, field })?;
    let download = body
        .get("download")
        .and_then(Value::as_array)
        .map(|links| {
            links
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    Ok(ResourceStatus::with_download(status, download))
}

impl ResourceClient for ApiClient {
    async fn create(&self, request: &CreateRequest) -> Result<String, WorkflowError> {
        let kind = request.kind();
        let response = match request {
            CreateRequest::Target(body) => self.post_json("/targets/add", body).await?,
            CreateRequest::Scan(body) => self.post_json("/scans", body).await?,
            CreateRequest::Report(body) => self.post_json("/reports", body).await?,
            CreateRequest::Export(body) => self.post_json("/exports", body).await?,
        };

        if !response.is_success() {
            return Err(WorkflowError::Rejected {
                operation: format!("create {kind}"),
                status: response.status,
                body: truncate_body(&response.body),
            });
        }

        let id = created_id(kind, &response.json(kind)?)?;
        debug!(resource = %kind, id = %id, status = response.status, "resource created");
        Ok(id)
    }

    async fn ensure_exists(&self, kind: ResourceKind, id: &str) -> Result<(), WorkflowError> {
        validate_resource_id(kind, id)?;
        let response = self.get(&Self::resource_path(kind, id)).await?;
        if response.status != 200 {
            return Err(WorkflowError::NotFound {
                kind,
                id: id.to_owned(),
                status: response.status,
            });
        }
        Ok(())
    }

    async fn status(&self, kind: ResourceKind, id: &str) -> Result<ResourceStatus, WorkflowError> {
        validate_resource_id(kind, id)?;
        let response = self.get(&Self::resource_path(kind, id)).await?;
        if response.status != 200 {
            return Err(WorkflowError::NotFound {
                kind,
                id: id.to_owned(),
                status: response.status,
            });
        }
        parse_status(kind, &response.json(kind)?)
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<u16, WorkflowError> {
        validate_resource_id(kind, id)?;
        let response = match kind {
            ResourceKind::Target => {
                self.post_json("/targets/delete", &json!({ "target_id_list": [id] }))
                    .await?
            }
            ResourceKind::Scan => self.delete_path(&Self::resource_path(kind, id)).await?,
            ResourceKind::Report => {
                self.post_json("/reports/delete", &json!({ "report_id_list": [id] }))
                    .await?
            }
            ResourceKind::Export => {
                self.post_json("/exports/delete", &json!({ "export_id_list": [id] }))
                    .await?
            }
        };

        if !response.is_success() {
            return Err(WorkflowError::Delete {
                kind,
                id: id.to_owned(),
                status: response.status,
            });
        }
        debug!(resource = %kind, id, status = response.status, "resource deleted");
        Ok(response.status)
    }

    async fn download(&self, link: &str, dest: &Path) -> Result<u64, WorkflowError> {
        let url = self.resolve_link(link)?;
        metrics::counter!(m::API_REQUESTS_TOTAL, m::LABEL_METHOD => "GET").increment(1);

        let mut response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| WorkflowError::request(url.as_str(), &e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Rejected {
                operation: format!("download {link}"),
                status,
                body: truncate_body(&body),
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| WorkflowError::io(dest, e))?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| WorkflowError::request(url.as_str(), &e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| WorkflowError::io(dest, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| WorkflowError::io(dest, e))?;

        debug!(url = %url, path = %dest.display(), bytes = written, "download written");
        Ok(written)
    }
}

/// Scripted client for workflow tests.
///
/// Every resource kind succeeds by default with ids `t1`, `s1`, `r1`, `e1` and
/// a `completed` status. Builder methods switch individual operations to fail
/// and every call is recorded in order.
#[cfg(test)]
#[derive(Default)]
pub struct MockResourceClient {
    state: std::sync::Mutex<MockState>,
}

#[cfg(test)]
#[derive(Default)]
struct MockState {
    fail_create: Vec<ResourceKind>,
    fail_exists: Vec<ResourceKind>,
    fail_status: Vec<ResourceKind>,
    statuses: std::collections::HashMap<ResourceKind, std::collections::VecDeque<ResourceStatus>>,
    delete_status: std::collections::HashMap<ResourceKind, u16>,
    fail_download: bool,
    calls: Vec<MockCall>,
}

/// A call observed by `MockResourceClient`.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Create(ResourceKind),
    Exists(ResourceKind, String),
    Status(ResourceKind, String),
    Delete(ResourceKind, String),
    Download(String),
}

#[cfg(test)]
impl MockResourceClient {
    /// Client whose every operation succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
        self
    }

    /// `create` for `kind` returns a 500 rejection.
    pub fn failing_create(self, kind: ResourceKind) -> Self {
        self.with_state(|s| s.fail_create.push(kind))
    }

    /// `ensure_exists` for `kind` returns 404.
    pub fn failing_exists(self, kind: ResourceKind) -> Self {
        self.with_state(|s| s.fail_exists.push(kind))
    }

    /// `status` for `kind` returns a transport error.
    pub fn failing_status(self, kind: ResourceKind) -> Self {
        self.with_state(|s| s.fail_status.push(kind))
    }

    /// Scripted statuses for `kind`. The last one repeats.
    pub fn with_statuses(self, kind: ResourceKind, statuses: Vec<ResourceStatus>) -> Self {
        self.with_state(|s| {
            s.statuses.insert(kind, statuses.into_iter().collect());
        })
    }

    /// `delete` for `kind` observes `status`.
    pub fn with_delete_status(self, kind: ResourceKind, status: u16) -> Self {
        self.with_state(|s| {
            s.delete_status.insert(kind, status);
        })
    }

    /// `download` returns a 500 rejection.
    pub fn failing_download(self) -> Self {
        self.with_state(|s| s.fail_download = true)
    }

    /// Calls observed so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Deletions observed so far, in order.
    pub fn deletions(&self) -> Vec<(ResourceKind, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Delete(kind, id) => Some((kind, id)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) -> std::sync::MutexGuard<'_, MockState> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(call);
        state
    }

    fn id_for(kind: ResourceKind) -> &'static str {
        match kind {
            ResourceKind::Target => "t1",
            ResourceKind::Scan => "s1",
            ResourceKind::Report => "r1",
            ResourceKind::Export => "e1",
        }
    }

    fn default_status(kind: ResourceKind) -> ResourceStatus {
        match kind {
            ResourceKind::Report => ResourceStatus::with_download(
                "completed",
                vec![
                    "/api/v1/reports/download/r1.html".to_owned(),
                    "/api/v1/reports/download/r1.pdf".to_owned(),
                ],
            ),
            ResourceKind::Export => ResourceStatus::with_download(
                "completed",
                vec!["/api/v1/exports/download/e1.csv".to_owned()],
            ),
            _ => ResourceStatus::new("completed"),
        }
    }
}

#[cfg(test)]
impl ResourceClient for MockResourceClient {
    async fn create(&self, request: &CreateRequest) -> Result<String, WorkflowError> {
        let kind = request.kind();
        let state = self.record(MockCall::Create(kind));
        if state.fail_create.contains(&kind) {
            return Err(WorkflowError::Rejected {
                operation: format!("create {kind}"),
                status: 500,
                body: "mock failure".to_owned(),
            });
        }
        Ok(Self::id_for(kind).to_owned())
    }

    async fn ensure_exists(&self, kind: ResourceKind, id: &str) -> Result<(), WorkflowError> {
        let state = self.record(MockCall::Exists(kind, id.to_owned()));
        if state.fail_exists.contains(&kind) {
            return Err(WorkflowError::NotFound {
                kind,
                id: id.to_owned(),
                status: 404,
            });
        }
        Ok(())
    }

    async fn status(&self, kind: ResourceKind, id: &str) -> Result<ResourceStatus, WorkflowError> {
        let mut state = self.record(MockCall::Status(kind, id.to_owned()));
        if state.fail_status.contains(&kind) {
            return Err(WorkflowError::Request {
                url: format!("mock://{kind}/{id}"),
                reason: "connection reset".to_owned(),
            });
        }
        let status = match state.statuses.get_mut(&kind) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(status.unwrap_or_else(|| Self::default_status(kind)))
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<u16, WorkflowError> {
        let state = self.record(MockCall::Delete(kind, id.to_owned()));
        let status = state.delete_status.get(&kind).copied().unwrap_or(204);
        if !(200..300).contains(&status) {
            return Err(WorkflowError::Delete {
                kind,
                id: id.to_owned(),
                status,
            });
        }
        Ok(status)
    }

    async fn download(&self, link: &str, dest: &Path) -> Result<u64, WorkflowError> {
        let fail = self.record(MockCall::Download(link.to_owned())).fail_download;
        if fail {
            return Err(WorkflowError::Rejected {
                operation: format!("download {link}"),
                status: 500,
                body: String::new(),
            });
        }
        let content = format!("content of {link}");
        std::fs::write(dest, &content).map_err(|e| WorkflowError::io(dest, e))?;
        Ok(content.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> ApiClient {
        let config = ApiConfig {
            url: url.to_owned(),
            api_key: "secret".to_owned(),
            ..ApiConfig::default()
        };
        ApiClient::from_config(&config).expect("client should build")
    }

    #[test]
    fn resolve_link_does_not_double_base_path() {
        let client = client("https://scanner.local:3443/api/v1");
        let url = client
            .resolve_link("/api/v1/reports/download/r1.html")
            .expect("link should resolve");
        assert_eq!(
            url.as_str(),
            "https://scanner.local:3443/api/v1/reports/download/r1.html"
        );
    }

    #[test]
    fn resolve_link_joins_plain_relative_path_onto_base() {
        let client = client("https://scanner.local:3443/api/v1/");
        let url = client
            .resolve_link("/reports/download/r1.html")
            .expect("link should resolve");
        assert_eq!(
            url.as_str(),
            "https://scanner.local:3443/api/v1/reports/download/r1.html"
        );
    }

    #[test]
    fn resolve_link_keeps_absolute_links() {
        let client = client("https://scanner.local:3443/api/v1");
        let url = client
            .resolve_link("https://cdn.local/files/r1.html?sig=1")
            .expect("link should resolve");
        assert_eq!(url.as_str(), "https://cdn.local/files/r1.html?sig=1");
    }

    #[test]
    fn resolve_link_with_root_base_url() {
        let client = client("https://scanner.local");
        let url = client
            .resolve_link("/api/v1/exports/download/e1.csv")
            .expect("link should resolve");
        assert_eq!(url.as_str(), "https://scanner.local/api/v1/exports/download/e1.csv");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = client("https://scanner.local:3443/api/v1/");
        assert_eq!(
            client.endpoint("/targets"),
            "https://scanner.local:3443/api/v1/targets"
        );
    }

    #[test]
    fn from_config_rejects_bad_url() {
        let config = ApiConfig {
            url: "not a url".to_owned(),
            ..ApiConfig::default()
        };
        let err = ApiClient::from_config(&config).expect_err("bad url should fail");
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn from_config_rejects_header_breaking_key() {
        let config = ApiConfig {
            api_key: "line\nbreak".to_owned(),
            ..ApiConfig::default()
        };
        let err = ApiClient::from_config(&config).expect_err("bad key should fail");
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn created_id_per_kind() {
        let target = json!({"targets": [{"target_id": "t1", "address": "https://x"}]});
        assert_eq!(created_id(ResourceKind::Target, &target).expect("id"), "t1");

        let scan = json!({"scan_id": "s1"});
        assert_eq!(created_id(ResourceKind::Scan, &scan).expect("id"), "s1");

        // exports are keyed by report_id
        let export = json!({"report_id": "e1"});
        assert_eq!(created_id(ResourceKind::Export, &export).expect("id"), "e1");
    }

    #[test]
    fn created_id_missing_field() {
        let err = created_id(ResourceKind::Target, &json!({"targets": []}))
            .expect_err("empty targets should fail");
        assert!(matches!(
            err,
            WorkflowError::MissingField {
                kind: ResourceKind::Target,
                field: "targets[0].target_id"
            }
        ));

        let err = created_id(ResourceKind::Scan, &json!({"scan_id": ""}))
            .expect_err("empty id should fail");
        assert!(matches!(err, WorkflowError::MissingField { .. }));
    }

    #[test]
    fn parse_status_reads_scan_session() {
        let body = json!({"scan_id": "s1", "current_session": {"status": "processing"}});
        let status = parse_status(ResourceKind::Scan, &body).expect("status");
        assert_eq!(status, ResourceStatus::new("processing"));
    }

    #[test]
    fn parse_status_reads_report_links() {
        let body = json!({
            "status": "completed",
            "download": ["/api/v1/reports/download/r1.html", 5, "/api/v1/reports/download/r1.pdf"]
        });
        let status = parse_status(ResourceKind::Report, &body).expect("status");
        assert_eq!(status.status, "completed");
        assert_eq!(status.download.len(), 2);
    }

    #[test]
    fn parse_status_missing_field() {
        let err = parse_status(ResourceKind::Scan, &json!({"status": "completed"}))
            .expect_err("scan status lives under current_session");
        assert!(matches!(err, WorkflowError::MissingField { .. }));
    }

    #[test]
    fn validate_resource_id_rejects_path_characters() {
        assert!(validate_resource_id(ResourceKind::Scan, "s1").is_ok());
        assert!(validate_resource_id(ResourceKind::Scan, "").is_err());
        assert!(validate_resource_id(ResourceKind::Scan, "../targets").is_err());
        assert!(validate_resource_id(ResourceKind::Scan, "s1?x=1").is_err());
    }

    #[test]
    fn api_response_into_value_wraps_non_json() {
        let value = ApiResponse {
            status: 204,
            body: String::new(),
        }
        .into_value();
        assert_eq!(value, json!({"status_code": 204, "body": ""}));

        let value = ApiResponse {
            status: 200,
            body: r#"{"targets": []}"#.to_owned(),
        }
        .into_value();
        assert_eq!(value, json!({"targets": []}));
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(ERROR_BODY_LIMIT + 10);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), ERROR_BODY_LIMIT + 3);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn mock_client_records_calls_and_repeats_last_status() {
        let mock = MockResourceClient::new().with_statuses(
            ResourceKind::Scan,
            vec![ResourceStatus::new("queued"), ResourceStatus::new("processing")],
        );
        assert_eq!(mock.status(ResourceKind::Scan, "s1").await.expect("status").status, "queued");
        assert_eq!(
            mock.status(ResourceKind::Scan, "s1").await.expect("status").status,
            "processing"
        );
        assert_eq!(
            mock.status(ResourceKind::Scan, "s1").await.expect("status").status,
            "processing"
        );
        assert_eq!(mock.calls().len(), 3);
    }

    #[test]
    fn resource_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<ApiClient>();
        assert_send_sync::<MockResourceClient>();
    }
}
