// Online staff presence (/staff)

use serde::{Deserialize, Serialize};

/// One online privileged player, built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffPresenceEntry {
    pub username: String,
    /// Display label (normalized group).
    pub role: String,
    /// Rank badge override, when the role has one.
    pub role_image: Option<String>,
    pub uuid: String,
    pub avatar: String,
    /// Latest session start, epoch ms.
    pub login_time: i64,
}

/// Permission-group row for an online player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRow {
    pub username: String,
    pub uuid: String,
    pub group: String,
}
