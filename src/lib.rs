//! # panelwatch
//!
//! Headless watcher for dashboard panel health. Builds on
//! [`panelwatch_types`] (schema, threshold evaluation, value formatting) and
//! [`panelwatch_client`] (backend HTTP API) and adds the runtime pieces:
//!
//! - [`state`]: per-entity request state machine with generation counters,
//!   so overlapping refreshes resolve last-write-wins and removed entities
//!   never receive dangling writes
//! - [`refresh`]: explicit activate/deactivate scheduling of recurring
//!   refresh tasks, one per entity, with deterministic teardown
//! - [`aggregate`]: bounded-sample category health rollups
//! - [`live`]: websocket channel for pushed system-status snapshots, with
//!   capped exponential-backoff reconnects and REST fallback polling
//! - [`config`]: layered settings (defaults, TOML file, environment)

pub mod aggregate;
pub mod config;
pub mod live;
pub mod refresh;
pub mod state;

pub use aggregate::{aggregate_category, CategoryHealth, CATEGORY_SAMPLE_LIMIT};
pub use live::{backoff_delay, LiveStatus, LiveStatusManager};
pub use refresh::{RefreshScheduler, DEFAULT_PANEL_INTERVAL};
pub use state::{EntityId, EntityState, StateStore};
