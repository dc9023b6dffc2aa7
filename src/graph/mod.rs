pub mod auth;
pub mod intune;
pub mod registry;
pub mod safe;
pub mod snapshot;

use crate::config::AppConfig;
use crate::error::{AiItError, Result};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub use registry::{EndpointDescriptor, ProbeStatus, endpoint_registry};
pub use safe::{Limitations, safe};
pub use snapshot::{AreaStatus, IntuneSnapshot, OsCount};

pub const GRAPH_API_BASE: &str = crate::config::DEFAULT_GRAPH_BASE_URL;

/// Per-request timeout. A timed-out call is final; nothing is retried.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Largest `$top` Graph accepts for a single page
pub const MAX_PAGE_SIZE: usize = 999;

/// Graph API client (app-only auth, single attempt per call)
pub struct GraphClient {
    client: Client,
    auth: auth::GraphAuth,
    base_url: String,
    last_snapshot_status: Vec<(&'static str, AreaStatus)>,
}

impl GraphClient {
    /// Create a client from the resolved config.
    ///
    /// Fails with a configuration error naming the missing Graph settings.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let credentials = config.credentials()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AiItError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth: auth::GraphAuth::new(credentials, &config.authority_host),
            base_url: config.graph_base_url.trim_end_matches('/').to_string(),
            last_snapshot_status: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenant_id(&self) -> &str {
        self.auth.tenant_id()
    }

    /// Relative endpoints are joined to the base URL; absolute URLs (nextLink)
    /// pass through unchanged.
    fn resolve_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }

    /// Send one authenticated request and decode the JSON body.
    ///
    /// Any status outside 2xx becomes a Graph error carrying that status.
    /// Transport failures and undecodable bodies carry no status. An empty
    /// success body decodes to an empty object.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&[(&str, &str)]>,
        json_body: Option<&Value>,
    ) -> Result<Value> {
        let token = self.auth.get_access_token().await?;
        let url = self.resolve_url(endpoint);

        tracing::debug!(%method, %url, "Graph request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(token.secret());

        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(body) = json_body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "Graph transport failure");
            AiItError::graph(None, "Microsoft Graph request failed (network or timeout).")
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%method, %url, status = status.as_u16(), "Graph request rejected");
            return Err(AiItError::graph(
                Some(status.as_u16()),
                format!("Microsoft Graph request failed (HTTP {}).", status.as_u16()),
            ));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::debug!(error = %e, "Graph body read failure");
            AiItError::graph(None, "Microsoft Graph request failed (network or timeout).")
        })?;

        if body.is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_slice(&body)
            .map_err(|_| AiItError::graph(None, "Microsoft Graph returned invalid JSON."))
    }

    /// GET a request and return the body when it is a JSON object
    pub async fn get_object(&self, endpoint: &str, params: Option<&[(&str, &str)]>) -> Result<Value> {
        let data = self.request(Method::GET, endpoint, params, None).await?;
        Ok(if data.is_object() {
            data
        } else {
            Value::Object(Map::new())
        })
    }
}

// ============================================================================
// Pagination Helpers
// ============================================================================

/// OData collection page: `value` array plus optional `@odata.nextLink`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse {
    #[serde(default)]
    pub value: Vec<Value>,
    #[serde(
        rename = "@odata.nextLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_link: Option<String>,
}

impl PaginatedResponse {
    /// Lenient conversion: a missing or non-array `value` is an empty page and
    /// an empty nextLink counts as absent.
    pub fn from_response(data: &Value) -> Self {
        let value = data
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Self {
            value,
            next_link: next_link(data),
        }
    }
}

fn next_link(data: &Value) -> Option<String> {
    data.get("@odata.nextLink")
        .and_then(Value::as_str)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
}

impl GraphClient {
    /// Fetch up to `max_items` from a collection, following `@odata.nextLink`.
    ///
    /// Stops when enough items are collected, when no nextLink is returned, or
    /// when a page comes back empty (a nextLink that yields nothing would
    /// otherwise loop forever). The result never exceeds `max_items`.
    pub async fn paginate(
        &self,
        endpoint: &str,
        max_items: usize,
        page_size: usize,
    ) -> Result<PaginatedResponse> {
        let top = page_size.min(max_items).to_string();
        let first = self
            .request(Method::GET, endpoint, Some(&[("$top", top.as_str())]), None)
            .await?;

        let mut page = PaginatedResponse::from_response(&first);
        let mut items = std::mem::take(&mut page.value);
        let mut pages = 1;

        while items.len() < max_items {
            let Some(next) = page.next_link.take() else {
                break;
            };

            let data = self.request(Method::GET, &next, None, None).await?;
            page = PaginatedResponse::from_response(&data);
            pages += 1;

            if page.value.is_empty() {
                tracing::debug!(endpoint, pages, "empty page with nextLink, stopping");
                break;
            }
            items.append(&mut page.value);
        }

        items.truncate(max_items);
        tracing::debug!(endpoint, pages, items = items.len(), "pagination complete");

        Ok(PaginatedResponse {
            value: items,
            next_link: None,
        })
    }
}
