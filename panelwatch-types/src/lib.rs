//! # panelwatch-types
//!
//! Core types for dashboard panel monitoring. This crate defines the schema
//! shared between the panelwatch client, aggregator, and live-status channel:
//! panels and their threshold configuration, the six-state health taxonomy,
//! metric query payloads, and the pushed system-status snapshot.
//!
//! ## Design Goals
//!
//! - **Pure evaluation**: threshold evaluation and value formatting are
//!   side-effect-free functions that never panic - bad input degrades to
//!   [`HealthStatus::Unknown`] or `"N/A"`, never to an error
//! - **Optional serialization**: enable the `serde` feature for JSON
//!   interchange with the dashboard backend
//! - **Open sets**: panel categories and threshold colors arrive from
//!   configuration data, so both are modeled as strings with a defined
//!   fallback rather than closed enums
//!
//! ## Example
//!
//! ```rust
//! use panelwatch_types::{HealthStatus, Threshold, ThresholdMode, ThresholdStep};
//!
//! let threshold = Threshold {
//!     mode: ThresholdMode::Absolute,
//!     steps: vec![
//!         ThresholdStep { color: "green".into(), value: None },
//!         ThresholdStep { color: "yellow".into(), value: Some(70.0) },
//!         ThresholdStep { color: "red".into(), value: Some(90.0) },
//!     ],
//! };
//!
//! assert_eq!(threshold.evaluate(45.0), HealthStatus::Healthy);
//! assert_eq!(threshold.evaluate(75.0), HealthStatus::Warning);
//! assert_eq!(threshold.evaluate(95.0), HealthStatus::Critical);
//! ```

mod format;
mod health;
mod panel;
mod query;
mod status;

pub use format::*;
pub use health::*;
pub use panel::*;
pub use query::*;
pub use status::*;
