// Container resources + global play statistics (/resources)

use serde::{Deserialize, Serialize};

/// Game container power state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Running,
    Starting,
    Stopping,
    #[serde(other)]
    Offline,
}

impl ServerStatus {
    /// Parse from the control plane `current_state` string. Anything unknown is offline.
    pub fn from_panel(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "running" => ServerStatus::Running,
            "starting" => ServerStatus::Starting,
            "stopping" => ServerStatus::Stopping,
            _ => ServerStatus::Offline,
        }
    }
}

/// Memory in whole megabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub current: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub status: ServerStatus,
    pub memory: MemoryUsage,
    /// Percent of the configured CPU limit; may exceed 100 when no limit is known.
    pub cpu: f64,
    /// Disk usage in whole megabytes.
    pub disk: u64,
}

impl ResourceSnapshot {
    /// Snapshot reported when the usage call fails.
    pub fn offline() -> Self {
        Self {
            status: ServerStatus::Offline,
            memory: MemoryUsage::default(),
            cpu: 0.0,
            disk: 0,
        }
    }
}

impl Default for ResourceSnapshot {
    fn default() -> Self {
        Self::offline()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPlayStats {
    /// Open sessions (null end timestamp).
    pub online: u64,
    pub total_players: u64,
    /// Registered within the last 24 hours.
    pub new_players: u64,
    pub total_playtime_hours: u64,
}

/// Body of GET /resources: key-set union of the snapshot and the play stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcesResponse {
    #[serde(flatten)]
    pub resources: ResourceSnapshot,
    #[serde(flatten)]
    pub stats: GlobalPlayStats,
}

impl ResourcesResponse {
    pub fn merge(resources: ResourceSnapshot, stats: GlobalPlayStats) -> Self {
        Self { resources, stats }
    }
}
