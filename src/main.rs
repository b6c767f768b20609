use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use panelwatch::aggregate::aggregate_category;
use panelwatch::config::Settings;
use panelwatch::live::LiveStatusManager;
use panelwatch::refresh::RefreshScheduler;
use panelwatch::state::{EntityId, EntityState, StateStore};
use panelwatch_client::{DashboardClient, PanelQuerier};
use panelwatch_types::{Panel, QueryResult};

#[derive(Parser, Debug)]
#[command(name = "panelwatch")]
#[command(about = "Headless watcher for dashboard panel health")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the dashboard backend API
    #[arg(long)]
    backend_url: Option<String>,

    /// Websocket URL of the live status channel
    #[arg(long)]
    ws_url: Option<String>,

    /// Watch only these categories (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Refresh interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Relative time range for metric queries (e.g. "5m", "1h")
    #[arg(short, long)]
    time_range: Option<String>,

    /// Run one query pass and exit instead of watching
    #[arg(long)]
    once: bool,
}

impl Args {
    /// Fold CLI flags over the loaded settings.
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(backend_url) = self.backend_url {
            settings.backend_url = backend_url;
        }
        if let Some(ws_url) = self.ws_url {
            settings.ws_url = ws_url;
        }
        if !self.categories.is_empty() {
            settings.categories = self.categories;
        }
        if let Some(interval) = self.interval {
            settings.refresh_interval_secs = interval;
        }
        if let Some(time_range) = self.time_range {
            settings.time_range = time_range;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("panelwatch=info")),
        )
        .init();

    let args = Args::parse();
    let once = args.once;
    let config_path = args.config.clone();
    let settings = args.apply(Settings::load(config_path.as_deref())?);

    let client = Arc::new(
        DashboardClient::builder()
            .base_url(&settings.backend_url)
            .build(),
    );

    let panels = load_watched_panels(&client, &settings).await?;
    if panels.is_empty() {
        warn!("no panels to watch");
        return Ok(());
    }
    info!(panels = panels.len(), "loaded watched panels");

    if once {
        return run_once(&client, &panels, &settings).await;
    }

    run_watcher(client, panels, settings).await
}

/// Fetch the panels in scope: all categories the backend reports, or only
/// the configured subset.
async fn load_watched_panels(
    client: &DashboardClient,
    settings: &Settings,
) -> Result<Vec<Panel>> {
    let categories = if settings.categories.is_empty() {
        client
            .categories()
            .await
            .context("failed to fetch categories")?
            .categories
    } else {
        settings.categories.clone()
    };

    let mut panels = Vec::new();
    for category in &categories {
        let list = client
            .all_panels(Some(category), None)
            .await
            .with_context(|| format!("failed to fetch panels for category {category}"))?;
        // Row panels are layout groupings and carry no query of their own.
        panels.extend(
            list.panels
                .into_iter()
                .filter(|p| p.panel_type.is_queryable() && !p.query.is_empty()),
        );
    }
    Ok(panels)
}

/// Single pass: one category rollup per category, then exit.
async fn run_once(client: &DashboardClient, panels: &[Panel], settings: &Settings) -> Result<()> {
    for category in categories_of(panels) {
        let in_category: Vec<Panel> = panels
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        let health =
            aggregate_category(client, &category, &in_category, &settings.time_range).await;
        info!(
            category = %health.category,
            status = %health.status,
            healthy = health.healthy_count,
            sampled = health.sample_size,
            total = health.total_panels,
            "category health"
        );
    }
    Ok(())
}

/// Continuous mode: per-panel refresh tasks feeding the state store, plus
/// the live status channel, until ctrl-c.
async fn run_watcher(
    client: Arc<DashboardClient>,
    panels: Vec<Panel>,
    settings: Settings,
) -> Result<()> {
    let store: StateStore<QueryResult> = StateStore::new();
    let mut scheduler = RefreshScheduler::new();
    let interval = Duration::from_secs(settings.refresh_interval_secs);

    for panel in panels {
        let id = EntityId::Panel(panel.id);
        store.register(id.clone());

        let client = Arc::clone(&client);
        let store = store.clone();
        let time_range = settings.time_range.clone();
        let job_id = id.clone();

        scheduler.activate(id, interval, move || {
            let client = Arc::clone(&client);
            let store = store.clone();
            let time_range = time_range.clone();
            let id = job_id.clone();
            let panel = panel.clone();

            async move {
                let generation = store.begin(&id);
                match client.query_panel(&panel, &time_range).await {
                    Ok(result) => {
                        if store.complete(&id, generation, result) {
                            log_refresh(&store, &id, &panel);
                        }
                    }
                    Err(err) => {
                        if store.fail(&id, generation, err.to_string()) {
                            error!(entity = %id, title = %panel.title, %err, "panel refresh failed");
                        }
                    }
                }
            }
        });
    }

    let mut live = LiveStatusManager::new(settings.ws_url.clone(), Some(settings.status_url));
    let mut live_rx = live.subscribe();
    live.connect();

    let live_logger = tokio::spawn(async move {
        while live_rx.changed().await.is_ok() {
            let status = live_rx.borrow_and_update().clone();
            if let Some(snapshot) = &status.snapshot {
                info!(
                    connected = status.connected,
                    fallback = status.fallback_mode,
                    services_healthy = snapshot.banking_services.healthy,
                    services_total = snapshot.banking_services.total,
                    overall = snapshot.overall_health,
                    "system status"
                );
            } else if !status.connected && status.reconnect_attempts > 0 {
                warn!(
                    attempts = status.reconnect_attempts,
                    "live status channel reconnecting"
                );
            }
        }
    });

    info!("watching, press ctrl-c to stop");
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("shutting down");

    scheduler.shutdown();
    live.disconnect();
    live_logger.abort();
    Ok(())
}

fn log_refresh(store: &StateStore<QueryResult>, id: &EntityId, panel: &Panel) {
    if let Some(EntityState::Ready(result)) = store.get(id) {
        info!(
            entity = %id,
            title = %panel.title,
            status = %result.health_status,
            value = %result.display_value(panel.unit.as_deref()),
            "panel refreshed"
        );
    }
}

/// Distinct categories in first-seen order.
fn categories_of(panels: &[Panel]) -> Vec<String> {
    let mut seen = Vec::new();
    for panel in panels {
        if !seen.contains(&panel.category) {
            seen.push(panel.category.clone());
        }
    }
    seen
}
