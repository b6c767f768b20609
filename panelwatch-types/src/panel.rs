//! Panel and dashboard schema.
//!
//! These types mirror the dashboard backend's metadata responses. Panels are
//! immutable once fetched; identity is the integer `id`, unique within a
//! dashboard's panel set.

use std::collections::BTreeMap;

/// Rendering type for a panel.
///
/// `Row` is a layout grouping in the source dashboards and never carries a
/// query of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PanelType {
    Gauge,
    Stat,
    Timeseries,
    Table,
    Piechart,
    Bargauge,
    Heatmap,
    Row,
}

impl PanelType {
    /// True for panel types that execute a metric query.
    pub fn is_queryable(&self) -> bool {
        !matches!(self, PanelType::Row)
    }
}

/// Threshold evaluation mode.
///
/// `Percentage` requires an explicit maximum to normalize against; the
/// evaluator treats steps as absolute unless asked otherwise (see
/// [`Threshold::evaluate_percent_of`](crate::Threshold::evaluate_percent_of)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ThresholdMode {
    #[default]
    Absolute,
    Percentage,
}

/// A single threshold boundary: a color tag and an optional floor value.
///
/// A step without a value is the base step and sorts before all value-bearing
/// steps. Colors are an open set; see
/// [`HealthStatus::from_color`](crate::HealthStatus::from_color) for the
/// recognized palette.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThresholdStep {
    pub color: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub value: Option<f64>,
}

/// Threshold configuration for a panel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Threshold {
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: ThresholdMode,
    #[cfg_attr(feature = "serde", serde(default))]
    pub steps: Vec<ThresholdStep>,
}

/// Panel grid position within its dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPos {
    pub h: u32,
    pub w: u32,
    pub x: u32,
    pub y: u32,
}

/// One monitored metric visualization backed by a query expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Panel {
    pub id: i64,
    pub title: String,

    /// Rendering type.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub panel_type: PanelType,

    /// Open-set grouping tag shared by related panels (e.g. "cache").
    pub category: String,

    /// Opaque query expression passed through to the metrics store.
    pub query: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub unit: Option<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub has_thresholds: bool,

    #[cfg_attr(feature = "serde", serde(default))]
    pub thresholds: Option<Threshold>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub grid_pos: Option<GridPos>,
}

/// Dashboard summary returned by listing endpoints.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashboardSummary {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub category: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub panel_count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

/// A full dashboard with its nested panels.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dashboard {
    pub uid: String,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub panels: Vec<Panel>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub panel_count: usize,
}

/// Registry-wide statistics from the backend.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistryStats {
    #[cfg_attr(feature = "serde", serde(default))]
    pub total_panels: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub total_dashboards: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub categories: BTreeMap<String, usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub panel_types: BTreeMap<String, usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub panels_by_category: BTreeMap<String, usize>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub loaded: bool,
}

/// Response of `GET /` - all dashboards plus aggregate stats.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashboardIndex {
    #[cfg_attr(feature = "serde", serde(default))]
    pub dashboards: Vec<DashboardSummary>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stats: RegistryStats,
}

/// Response of `GET /categories`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryIndex {
    #[cfg_attr(feature = "serde", serde(default))]
    pub categories: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub panels_by_category: BTreeMap<String, usize>,
}

/// Response of `GET /category/{category}`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryDashboards {
    pub category: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub dashboards: Vec<DashboardSummary>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub count: usize,
}

/// Response of `GET /panels/all`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelList {
    #[cfg_attr(feature = "serde", serde(default))]
    pub panels: Vec<Panel>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub total: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: Option<String>,
}

/// Response of `GET /panels/search`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchResults {
    pub query: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub results: Vec<Panel>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_panels_are_not_queryable() {
        assert!(!PanelType::Row.is_queryable());
        assert!(PanelType::Timeseries.is_queryable());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_panel_deserializes_backend_shape() {
        let json = r#"{
            "id": 3,
            "title": "Request Rate",
            "type": "timeseries",
            "category": "banking",
            "query": "rate(http_requests_total[5m])",
            "unit": "reqps",
            "has_thresholds": false
        }"#;

        let panel: Panel = serde_json::from_str(json).unwrap();
        assert_eq!(panel.id, 3);
        assert_eq!(panel.panel_type, PanelType::Timeseries);
        assert!(panel.thresholds.is_none());
        assert!(panel.grid_pos.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_threshold_step_without_value() {
        let step: ThresholdStep = serde_json::from_str(r#"{"color": "green"}"#).unwrap();
        assert_eq!(step.value, None);
    }
}
