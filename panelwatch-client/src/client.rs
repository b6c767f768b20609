//! Dashboard backend client.
//!
//! Talks to the dashboard backend over HTTP: panel/dashboard metadata,
//! single panel queries, and batch queries. Health statuses are derived
//! client-side by running the first sample value through the threshold
//! evaluator, so callers get the same classification whether a result came
//! from a single query or a batch.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use panelwatch_types::{
    evaluate_value, BatchOutcome, CategoryDashboards, CategoryIndex, Dashboard, DashboardIndex,
    HealthStatus, Panel, PanelBatchResult, PanelList, QueryPayload, QueryResult, RegistryStats,
    SearchResults, Threshold,
};

use crate::ClientError;

/// Default backend base URL (the dashboards API mount point).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/dashboards";

/// Default time range for panel queries.
pub const DEFAULT_TIME_RANGE: &str = "5m";

/// Anything that can execute a panel's query and classify the result.
///
/// [`DashboardClient`] is the real implementation; the aggregator and
/// scheduler take this trait so tests can substitute a stub.
#[async_trait]
pub trait PanelQuerier: Send + Sync {
    /// Execute the panel's query and derive its health status.
    async fn query_panel(&self, panel: &Panel, time_range: &str)
        -> Result<QueryResult, ClientError>;
}

/// Client for the dashboard backend HTTP API.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: Client,
    base_url: String,
}

impl DashboardClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> DashboardClientBuilder {
        DashboardClientBuilder::default()
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch all dashboards plus registry-wide stats.
    pub async fn dashboards(&self) -> Result<DashboardIndex, ClientError> {
        self.get_json(&format!("{}/", self.base_url), &[]).await
    }

    /// Fetch registry statistics.
    pub async fn stats(&self) -> Result<RegistryStats, ClientError> {
        self.get_json(&format!("{}/stats", self.base_url), &[]).await
    }

    /// Fetch the category list with per-category panel counts.
    pub async fn categories(&self) -> Result<CategoryIndex, ClientError> {
        self.get_json(&format!("{}/categories", self.base_url), &[]).await
    }

    /// Fetch dashboard summaries for one category.
    pub async fn dashboards_by_category(
        &self,
        category: &str,
    ) -> Result<CategoryDashboards, ClientError> {
        self.get_json(&format!("{}/category/{}", self.base_url, category), &[])
            .await
    }

    /// Fetch a full dashboard with its nested panels.
    pub async fn dashboard(&self, uid: &str) -> Result<Dashboard, ClientError> {
        self.get_json(&format!("{}/{}", self.base_url, uid), &[]).await
    }

    /// Fetch the flat panel list, optionally filtered by category and capped.
    pub async fn all_panels(
        &self,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<PanelList, ClientError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        self.get_json(&format!("{}/panels/all", self.base_url), &params).await
    }

    /// Search panels by query string, optionally filtered by category.
    pub async fn search_panels(
        &self,
        q: &str,
        category: Option<&str>,
    ) -> Result<SearchResults, ClientError> {
        let mut params = vec![("q", q.to_string())];
        if let Some(category) = category {
            params.push(("category", category.to_string()));
        }
        self.get_json(&format!("{}/panels/search", self.base_url), &params).await
    }

    /// Execute queries for multiple panels in one request.
    ///
    /// A single panel's failure never aborts the batch: failed entries carry
    /// their error string and tally as [`HealthStatus::Unknown`]. The ids go
    /// over the wire as repeated `panel_ids` params; the panels themselves
    /// are needed locally for threshold classification.
    pub async fn query_panels_batch(
        &self,
        panels: &[Panel],
        time_range: &str,
    ) -> Result<BatchOutcome, ClientError> {
        let url = format!("{}/panels/batch-query", self.base_url);
        let mut params: Vec<(&str, String)> = vec![("time_range", time_range.to_string())];
        for panel in panels {
            params.push(("panel_ids", panel.id.to_string()));
        }

        let response = self.client.post(&url).query(&params).send().await?;
        let raw: RawBatchResponse = Self::decode(response).await?;

        let thresholds: BTreeMap<i64, Threshold> = panels
            .iter()
            .filter_map(|p| p.thresholds.clone().map(|t| (p.id, t)))
            .collect();

        debug!(total = raw.results.len(), time_range, "batch query completed");
        Ok(assemble_batch(raw, &thresholds))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let mut request = self.client.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Check the status line, then parse the body. Non-2xx responses surface
    /// the status code and the backend's message verbatim where available.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PanelQuerier for DashboardClient {
    async fn query_panel(
        &self,
        panel: &Panel,
        time_range: &str,
    ) -> Result<QueryResult, ClientError> {
        let url = format!("{}/panels/{}/query", self.base_url, panel.id);
        let response = self
            .client
            .post(&url)
            .query(&[("time_range", time_range)])
            .send()
            .await?;

        let mut result: QueryResult = Self::decode(response).await?;

        // The backend's own classification is advisory; derive locally so
        // panel and batch paths agree.
        result.health_status = derive_health(&result.result, panel.thresholds.as_ref());
        debug!(panel_id = panel.id, status = %result.health_status, "panel query completed");
        Ok(result)
    }
}

/// Extract the human-readable message from an error response body.
///
/// The backend wraps errors as JSON `{"detail": "..."}`; the detail text is
/// surfaced verbatim. Non-JSON bodies pass through untouched, and an empty
/// body falls back to the status line's canonical reason.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if body.is_empty() {
        return status.canonical_reason().unwrap_or("unknown error").to_string();
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    body.to_string()
}

/// Derive a health status from a query payload and optional thresholds.
///
/// An executed query with an empty result set (or a value that cannot be
/// extracted) is [`HealthStatus::NoData`]; a value without configured
/// thresholds is [`HealthStatus::Unknown`]. These are distinct user-visible
/// states.
pub fn derive_health(payload: &QueryPayload, thresholds: Option<&Threshold>) -> HealthStatus {
    if !payload.is_success() {
        return HealthStatus::Unknown;
    }
    if payload.first_sample().is_none() {
        return HealthStatus::NoData;
    }
    match payload.first_value() {
        Some(value) => evaluate_value(value, thresholds),
        None => HealthStatus::NoData,
    }
}

/// Raw wire shape of one batch entry (error entries omit the payload).
#[derive(Debug, Deserialize)]
struct RawBatchEntry {
    panel_id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    result: Option<QueryPayload>,
    #[serde(default)]
    error: Option<String>,
}

/// Raw wire shape of the batch response.
#[derive(Debug, Deserialize)]
struct RawBatchResponse {
    #[serde(default)]
    results: Vec<RawBatchEntry>,
    #[serde(default)]
    total: usize,
}

/// Map raw batch entries to classified results.
///
/// The success count is recomputed locally rather than trusted from the
/// backend, so it always matches the entries the caller can see.
fn assemble_batch(raw: RawBatchResponse, thresholds: &BTreeMap<i64, Threshold>) -> BatchOutcome {
    let total = if raw.total > 0 { raw.total } else { raw.results.len() };

    let results: Vec<PanelBatchResult> = raw
        .results
        .into_iter()
        .map(|entry| {
            let health_status = match (&entry.error, &entry.result) {
                (Some(_), _) | (None, None) => HealthStatus::Unknown,
                (None, Some(payload)) => {
                    derive_health(payload, thresholds.get(&entry.panel_id))
                }
            };
            PanelBatchResult {
                panel_id: entry.panel_id,
                title: entry.title,
                query: entry.query,
                result: entry.result,
                health_status,
                error: entry.error,
            }
        })
        .collect();

    let success_count = results.iter().filter(|r| r.is_success()).count();

    BatchOutcome {
        results,
        success_count,
        total,
    }
}

/// Builder for [`DashboardClient`].
#[derive(Debug, Default)]
pub struct DashboardClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl DashboardClientBuilder {
    /// Set the backend base URL (e.g. "http://localhost:8000/api/dashboards").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> DashboardClient {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        DashboardClient { client, base_url }
    }
}
