//! Query result payloads.
//!
//! The backend wraps the metrics store's instant-query response in its own
//! envelope, so the payload is doubly nested: the outer layer reports the
//! backend's view of the query, the inner layer is the store's response,
//! and the samples live two levels down. The first sample is authoritative;
//! an empty result set means "no data", which is a health status of its own.

use std::collections::BTreeMap;

use crate::health::HealthStatus;

/// One sample from the metrics store: a label set and an optional
/// `[timestamp, "stringValue"]` pair.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSample {
    #[cfg_attr(feature = "serde", serde(default))]
    pub metric: BTreeMap<String, String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<(f64, String)>,
}

impl MetricSample {
    /// Parse the sample's string value as a number.
    pub fn numeric_value(&self) -> Option<f64> {
        let (_, raw) = self.value.as_ref()?;
        raw.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// The metrics store's instant-query data block.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstantData {
    #[cfg_attr(feature = "serde", serde(default, rename = "resultType"))]
    pub result_type: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub result: Vec<MetricSample>,
}

/// The metrics store's response: `{status, data?}`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PromResponse {
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data: Option<InstantData>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub error: Option<String>,
}

/// The backend's query envelope wrapping the store response.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryPayload {
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub data: Option<PromResponse>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub error: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub execution_time_ms: Option<f64>,
}

impl QueryPayload {
    /// True when both the backend and the store report success.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// The authoritative first sample, if any.
    pub fn first_sample(&self) -> Option<&MetricSample> {
        self.data.as_ref()?.data.as_ref()?.result.first()
    }

    /// The first sample's numeric value, reaching through both layers.
    /// Only the first sample counts; later samples are never consulted.
    pub fn first_value(&self) -> Option<f64> {
        self.first_sample()?.numeric_value()
    }

    /// True when the query executed but returned an empty result set.
    pub fn is_empty(&self) -> bool {
        self.first_sample().is_none()
    }
}

/// Panel metadata echoed back alongside a single query result.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelInfo {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default, rename = "type"))]
    pub panel_type: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub dashboard_title: Option<String>,
}

/// The result of executing a single panel's query.
///
/// `health_status` is always populated; when the client cannot derive a
/// status it resolves to [`HealthStatus::Unknown`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryResult {
    pub panel: PanelInfo,
    pub query: String,
    pub time_range: String,
    pub result: QueryPayload,
    pub health_status: HealthStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: Option<String>,
}

impl QueryResult {
    /// Human-readable first-sample value, formatted with the given unit.
    /// `"N/A"` when the result carries no sample.
    pub fn display_value(&self, unit: Option<&str>) -> String {
        match self.result.first_sample().and_then(|s| s.value.as_ref()) {
            Some((_, raw)) => crate::format_raw(raw, unit),
            None => "N/A".to_string(),
        }
    }
}

/// One entry of a batch query response.
///
/// A failed entry carries `error` and no payload; a single panel's failure
/// never aborts the batch.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelBatchResult {
    pub panel_id: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub query: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub result: Option<QueryPayload>,
    pub health_status: HealthStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub error: Option<String>,
}

impl PanelBatchResult {
    /// True when the entry completed without an error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of a batch query. Partial success is the normal case.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatchOutcome {
    pub results: Vec<PanelBatchResult>,
    pub success_count: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_with_value(raw: &str) -> QueryPayload {
        QueryPayload {
            status: "success".to_string(),
            data: Some(PromResponse {
                status: "success".to_string(),
                data: Some(InstantData {
                    result_type: Some("vector".to_string()),
                    result: vec![MetricSample {
                        metric: BTreeMap::new(),
                        value: Some((1_700_000_000.0, raw.to_string())),
                    }],
                }),
                error: None,
            }),
            error: None,
            timestamp: None,
            execution_time_ms: None,
        }
    }

    #[test]
    fn test_first_value_reaches_through_both_layers() {
        assert_eq!(payload_with_value("42.5").first_value(), Some(42.5));
    }

    #[test]
    fn test_unparseable_value_is_none() {
        assert_eq!(payload_with_value("garbage").first_value(), None);
    }

    #[test]
    fn test_empty_result_set() {
        let payload = QueryPayload {
            status: "success".to_string(),
            data: Some(PromResponse {
                status: "success".to_string(),
                data: Some(InstantData::default()),
                error: None,
            }),
            ..Default::default()
        };

        assert!(payload.is_success());
        assert!(payload.is_empty());
        assert_eq!(payload.first_value(), None);
    }

    #[test]
    fn test_display_value_formats_with_unit() {
        let result = QueryResult {
            panel: PanelInfo::default(),
            query: "cache_hit_ratio".to_string(),
            time_range: "5m".to_string(),
            result: payload_with_value("45.678"),
            health_status: HealthStatus::Healthy,
            timestamp: None,
        };

        assert_eq!(result.display_value(Some("percent")), "45.7%");
        assert_eq!(result.display_value(None), "45.68");
    }

    #[test]
    fn test_display_value_without_sample_is_na() {
        let result = QueryResult {
            panel: PanelInfo::default(),
            query: "up".to_string(),
            time_range: "5m".to_string(),
            result: QueryPayload::default(),
            health_status: HealthStatus::NoData,
            timestamp: None,
        };

        assert_eq!(result.display_value(Some("bytes")), "N/A");
    }

    #[test]
    fn test_missing_inner_layer_is_empty() {
        let payload = QueryPayload {
            status: "success".to_string(),
            ..Default::default()
        };
        assert!(payload.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserializes_nested_backend_payload() {
        let json = r#"{
            "status": "success",
            "data": {
                "status": "success",
                "data": {
                    "resultType": "vector",
                    "result": [
                        {"metric": {"instance": "localhost:8001"}, "value": [1700000000.1, "1"]}
                    ]
                }
            },
            "timestamp": "2026-08-23T10:00:00",
            "execution_time_ms": 12.5
        }"#;

        let payload: QueryPayload = serde_json::from_str(json).unwrap();
        assert!(payload.is_success());
        assert_eq!(payload.first_value(), Some(1.0));
        assert_eq!(
            payload.first_sample().unwrap().metric.get("instance").unwrap(),
            "localhost:8001"
        );
    }
}
