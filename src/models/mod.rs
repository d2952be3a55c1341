// Domain models served to the dashboard

mod resources;
mod staff;

pub use resources::{
    GlobalPlayStats, MemoryUsage, ResourceSnapshot, ResourcesResponse, ServerStatus,
};
pub use staff::{PermissionRow, StaffPresenceEntry};
