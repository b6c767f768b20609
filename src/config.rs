//! Watcher configuration.
//!
//! Settings come from three layers, later layers overriding earlier ones:
//! built-in defaults, an optional TOML file, and `PANELWATCH_*` environment
//! variables. Command-line flags are applied on top by the binary.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use panelwatch_client::{DEFAULT_BASE_URL, DEFAULT_TIME_RANGE};

/// Default websocket endpoint for the live status channel.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/api/dashboards/ws/status";
/// Default REST endpoint polled when the live channel is in fallback mode.
pub const DEFAULT_STATUS_URL: &str = "http://localhost:8000/api/dashboards/system/status";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the dashboard backend API.
    pub backend_url: String,
    /// Websocket URL of the live status channel.
    pub ws_url: String,
    /// REST status endpoint used for fallback polling.
    pub status_url: String,
    /// Seconds between panel refreshes.
    pub refresh_interval_secs: u64,
    /// Relative time range passed to metric queries.
    pub time_range: String,
    /// Categories to watch; empty means all categories the backend reports.
    pub categories: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BASE_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            status_url: DEFAULT_STATUS_URL.to_string(),
            refresh_interval_secs: 30,
            time_range: DEFAULT_TIME_RANGE.to_string(),
            categories: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from an optional config file plus the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();

        let mut builder = Config::builder()
            .set_default("backend_url", defaults.backend_url)?
            .set_default("ws_url", defaults.ws_url)?
            .set_default("status_url", defaults.status_url)?
            .set_default("refresh_interval_secs", defaults.refresh_interval_secs)?
            .set_default("time_range", defaults.time_range)?
            .set_default("categories", Vec::<String>::new())?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(Environment::with_prefix("PANELWATCH"))
            .build()
            .context("failed to assemble configuration")?;

        config
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, DEFAULT_BASE_URL);
        assert_eq!(settings.refresh_interval_secs, 30);
        assert_eq!(settings.time_range, "5m");
        assert!(settings.categories.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = Config::builder()
            .set_default("backend_url", Settings::default().backend_url)
            .unwrap()
            .set_default("ws_url", Settings::default().ws_url)
            .unwrap()
            .set_default("status_url", Settings::default().status_url)
            .unwrap()
            .set_default("refresh_interval_secs", 30u64)
            .unwrap()
            .set_default("time_range", "5m")
            .unwrap()
            .set_default("categories", Vec::<String>::new())
            .unwrap()
            .add_source(File::from_str(
                r#"
                backend_url = "http://dash.internal:9000/api/dashboards"
                refresh_interval_secs = 10
                categories = ["cache", "banking"]
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let settings: Settings = config.try_deserialize().unwrap();
        assert_eq!(
            settings.backend_url,
            "http://dash.internal:9000/api/dashboards"
        );
        assert_eq!(settings.refresh_interval_secs, 10);
        assert_eq!(settings.categories, vec!["cache", "banking"]);
        // Untouched keys keep their defaults.
        assert_eq!(settings.time_range, "5m");
    }
}
