// Merge control-plane usage + limits into a ResourceSnapshot.

use crate::models::{MemoryUsage, ResourceSnapshot, ServerStatus};
use serde::Deserialize;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// `GET {base}/servers/{id}/resources`
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResponse {
    pub attributes: UsageAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageAttributes {
    pub current_state: String,
    pub resources: UsageResources,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsageResources {
    #[serde(default)]
    pub memory_bytes: u64,
    #[serde(default)]
    pub cpu_absolute: f64,
    #[serde(default)]
    pub disk_bytes: u64,
}

/// `GET {base}/servers/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerDetailsResponse {
    pub attributes: ServerDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerDetails {
    #[serde(default)]
    pub identifier: Option<String>,
    pub limits: LimitAttributes,
}

/// Configured limits: memory/disk in MB, cpu in percent of one core (0 = unlimited).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct LimitAttributes {
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub disk: u64,
}

pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / BYTES_PER_MB
}

/// `used / limit * 100` for a positive limit, else the raw value.
pub fn normalize_cpu(used: f64, limit: Option<f64>) -> f64 {
    match limit.filter(|l| *l > 0.0) {
        Some(limit) => used / limit * 100.0,
        None => used,
    }
}

/// Process usage + optional limits into the dashboard snapshot. Exposed for unit tests.
pub fn normalize(usage: &UsageAttributes, limits: Option<&LimitAttributes>) -> ResourceSnapshot {
    ResourceSnapshot {
        status: ServerStatus::from_panel(&usage.current_state),
        memory: MemoryUsage {
            current: bytes_to_mb(usage.resources.memory_bytes),
            limit: limits.map_or(0, |l| l.memory),
        },
        cpu: normalize_cpu(usage.resources.cpu_absolute, limits.map(|l| l.cpu)),
        disk: bytes_to_mb(usage.resources.disk_bytes),
    }
}
