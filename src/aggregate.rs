//! Category health aggregation.
//!
//! Rolls many panel results up into one category-level status. Only a
//! bounded sample of each category's panels is queried - a deliberate
//! cost/accuracy tradeoff that keeps request fan-out constant no matter how
//! large a category grows.

use futures_util::future::join_all;
use tracing::debug;

use panelwatch_client::PanelQuerier;
use panelwatch_types::{HealthStatus, Panel};

/// Upper bound on panels queried per category.
pub const CATEGORY_SAMPLE_LIMIT: usize = 3;

/// Derived health rollup for one category. Not persisted anywhere;
/// recomputed whenever the underlying panel set changes.
///
/// `healthy_count` comes from the sampled tally while `total_panels` is the
/// full set size, so "healthy/total" is a sampled-numerator-over-full-
/// denominator approximation, not an exact fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryHealth {
    pub category: String,
    pub healthy_count: usize,
    pub status: HealthStatus,
    pub sample_size: usize,
    pub total_panels: usize,
}

/// Query a bounded sample of `panels` and reduce their statuses into one
/// category-level status.
///
/// Individual query failures count as `Unknown` rather than failing the
/// aggregation; the sampled queries run concurrently.
pub async fn aggregate_category<Q: PanelQuerier>(
    querier: &Q,
    category: &str,
    panels: &[Panel],
    time_range: &str,
) -> CategoryHealth {
    let sample = &panels[..panels.len().min(CATEGORY_SAMPLE_LIMIT)];

    let queries = sample.iter().map(|panel| async move {
        match querier.query_panel(panel, time_range).await {
            Ok(result) => result.health_status,
            Err(err) => {
                debug!(panel_id = panel.id, %err, "sampled panel query failed");
                HealthStatus::Unknown
            }
        }
    });

    let statuses = join_all(queries).await;
    reduce(category, &statuses, sample.len(), panels.len())
}

/// Tally sampled statuses and apply the fixed precedence rule.
fn reduce(
    category: &str,
    statuses: &[HealthStatus],
    sample_size: usize,
    total_panels: usize,
) -> CategoryHealth {
    let mut healthy = 0usize;
    let mut unhealthy = 0usize;
    let mut warning = 0usize;
    let mut unknown = 0usize;

    for status in statuses {
        if status.is_down() {
            unhealthy += 1;
            continue;
        }
        match status {
            HealthStatus::Healthy => healthy += 1,
            HealthStatus::Warning => warning += 1,
            _ => unknown += 1,
        }
    }

    // Precedence, highest wins: any failure makes the category critical,
    // else any warning, else any healthy, else any unknown/no_data.
    let status = if unhealthy > 0 {
        HealthStatus::Critical
    } else if warning > 0 {
        HealthStatus::Warning
    } else if healthy > 0 {
        HealthStatus::Healthy
    } else if unknown > 0 {
        HealthStatus::NoData
    } else {
        HealthStatus::Unknown
    };

    CategoryHealth {
        category: category.to_string(),
        healthy_count: healthy,
        status,
        sample_size,
        total_panels,
    }
}
