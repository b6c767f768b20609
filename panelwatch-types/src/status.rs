//! Pushed system-status snapshot.
//!
//! The live channel delivers whole-system snapshots as tagged envelopes.
//! Snapshots are replaced wholesale on every push - there is no incremental
//! merge, so a snapshot is always internally consistent.

/// Envelope for messages pushed over the live channel.
///
/// Only `type == "system_status"` is consumed; other types are ignored for
/// forward compatibility. `data` stays opaque here so that unknown message
/// types never fail envelope parsing.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StatusEnvelope {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Health detail for one monitored service instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceDetail {
    pub name: String,
    pub healthy: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub port: Option<String>,
}

/// Fleet-level rollup of the monitored services.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceFleet {
    #[cfg_attr(feature = "serde", serde(default))]
    pub healthy: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub total: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub percentage: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub services: Vec<ServiceDetail>,
}

/// Cache-layer status.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStatus {
    #[cfg_attr(feature = "serde", serde(default))]
    pub connected_clients: i64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hit_ratio: f64,
}

/// A full-replace system status payload pushed over the live channel.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemStatusSnapshot {
    #[cfg_attr(feature = "serde", serde(default))]
    pub banking_services: ServiceFleet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cache: CacheStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub overall_health: bool,
}
