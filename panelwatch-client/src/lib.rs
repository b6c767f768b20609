//! # panelwatch-client
//!
//! HTTP client for the panelwatch dashboard backend. Fetches dashboard and
//! panel metadata, executes single and batched metric queries, and derives
//! per-panel health statuses through the threshold evaluator in
//! [`panelwatch_types`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use panelwatch_client::{DashboardClient, PanelQuerier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DashboardClient::builder()
//!         .base_url("http://localhost:8000/api/dashboards")
//!         .build();
//!
//!     let index = client.categories().await?;
//!     for category in &index.categories {
//!         let panels = client.all_panels(Some(category), Some(10)).await?;
//!         println!("{}: {} panels", category, panels.total);
//!
//!         for panel in &panels.panels {
//!             let result = client.query_panel(panel, "5m").await?;
//!             println!("  {} -> {}", panel.title, result.health_status);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error handling
//!
//! Single queries surface [`ClientError`] to the caller and are never
//! retried internally. Batch queries isolate per-panel failures: one bad
//! panel cannot abort the batch, and the outcome carries a success count
//! distinct from the total.

mod client;
mod error;

pub use client::{
    derive_health, DashboardClient, DashboardClientBuilder, PanelQuerier, DEFAULT_BASE_URL,
    DEFAULT_TIME_RANGE,
};
pub use error::ClientError;
