//! Health statuses and threshold evaluation.
//!
//! A panel's numeric value is classified into a [`HealthStatus`] by scanning
//! its threshold steps in ascending order. Colors map to statuses through an
//! open lookup: unrecognized colors fall back to [`HealthStatus::Unknown`]
//! rather than failing, since new colors can appear from dashboard
//! configuration at any time.

use core::cmp::Ordering;

use crate::panel::{Threshold, ThresholdStep};

/// Health classification for a panel, category, or service.
///
/// `NoData` and `Unknown` are distinct, user-visible states: `NoData` means
/// the query executed but returned an empty result set, while `Unknown` means
/// the value could not be classified (no thresholds configured, unrecognized
/// color, or the query never ran).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
    NoData,
    Unhealthy,
}

impl HealthStatus {
    /// Map a threshold step color to a status.
    ///
    /// Recognized palette: green and blue are healthy, yellow is warning,
    /// red is critical. Anything else is `Unknown`.
    pub fn from_color(color: &str) -> Self {
        match color {
            "green" | "blue" => HealthStatus::Healthy,
            "yellow" => HealthStatus::Warning,
            "red" => HealthStatus::Critical,
            _ => HealthStatus::Unknown,
        }
    }

    /// True for the states that count against a category's health
    /// (critical and unhealthy share a bucket during aggregation).
    pub fn is_down(&self) -> bool {
        matches!(self, HealthStatus::Critical | HealthStatus::Unhealthy)
    }
}

impl core::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
            HealthStatus::Unknown => "unknown",
            HealthStatus::NoData => "no_data",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(name)
    }
}

impl Threshold {
    /// Classify `value` against this threshold's steps.
    ///
    /// Steps are scanned in ascending order of their floor value, with
    /// value-less base steps first. The scan keeps the color of the highest
    /// step whose floor does not exceed `value`, starting from `"green"`.
    /// Steps are treated as absolute comparisons regardless of
    /// [`ThresholdMode`](crate::ThresholdMode); see [`Threshold::evaluate_percent_of`]
    /// for percentage normalization.
    ///
    /// An empty step list yields [`HealthStatus::Unknown`]. Multiple base
    /// steps are tolerated: the sort is stable, so the last base step wins
    /// as the fallback color.
    pub fn evaluate(&self, value: f64) -> HealthStatus {
        if self.steps.is_empty() {
            return HealthStatus::Unknown;
        }

        let mut steps: Vec<&ThresholdStep> = self.steps.iter().collect();
        steps.sort_by(|a, b| match (a.value, b.value) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        });

        let mut current_color = "green";
        for step in steps {
            match step.value {
                None => current_color = &step.color,
                Some(floor) if value >= floor => current_color = &step.color,
                Some(_) => {}
            }
        }

        HealthStatus::from_color(current_color)
    }

    /// Classify `value` as a percentage of `max`.
    ///
    /// Percentage-mode thresholds require an explicit maximum to be
    /// meaningful; a non-positive or non-finite `max` yields
    /// [`HealthStatus::Unknown`] instead of guessing.
    pub fn evaluate_percent_of(&self, value: f64, max: f64) -> HealthStatus {
        if !max.is_finite() || max <= 0.0 {
            return HealthStatus::Unknown;
        }
        self.evaluate(value / max * 100.0)
    }
}

/// Classify a value against an optional threshold configuration.
///
/// Returns [`HealthStatus::Unknown`] when no thresholds are configured,
/// which is the normal case for informational panels.
pub fn evaluate_value(value: f64, thresholds: Option<&Threshold>) -> HealthStatus {
    match thresholds {
        Some(t) => t.evaluate(value),
        None => HealthStatus::Unknown,
    }
}
