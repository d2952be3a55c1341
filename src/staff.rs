// Online staff: console presence x permission groups x skins x open sessions.
// The join is best-effort: missing skin/session rows fall back to defaults, never drop a player.

use crate::analytics_repo::AnalyticsRepo;
use crate::error::AggregatorError;
use crate::models::{PermissionRow, StaffPresenceEntry};
use std::collections::HashMap;
use tracing::{instrument, warn};

/// Privileged groups (compared lower-cased).
pub const ALLOWED_GROUPS: &[&str] = &[
    "neroferno",
    "killuwu",
    "developer",
    "admin",
    "moderator",
    "mod",
    "helper",
    "staff",
    BLANK_RANK_GROUP,
];

/// Group whose display name is a Hangul filler, rendering as an empty rank.
pub const BLANK_RANK_GROUP: &str = "\u{3164}";

pub const FOUNDER_ROLE: &str = "Founder";
pub const FOUNDER_BADGE: &str = "/ranks/rank-neroferno.png";

const AVATAR_BASE: &str = "https://mc-heads.net/avatar";

/// Historical rewrites. `username: None` matches any player in `group`; names compare
/// ignoring ASCII case since the permission store keeps them lower-cased.
pub struct RoleOverride {
    pub username: Option<&'static str>,
    pub group: &'static str,
    pub role: &'static str,
    pub badge: &'static str,
}

pub const ROLE_OVERRIDES: &[RoleOverride] = &[
    // Legacy founder account still on the default group.
    RoleOverride {
        username: Some("UltraXn"),
        group: "default",
        role: FOUNDER_ROLE,
        badge: FOUNDER_BADGE,
    },
    RoleOverride {
        username: None,
        group: BLANK_RANK_GROUP,
        role: FOUNDER_ROLE,
        badge: FOUNDER_BADGE,
    },
];

/// Badge for groups that keep their own label.
pub const GROUP_BADGES: &[(&str, &str)] = &[("neroferno", FOUNDER_BADGE)];

/// Usernames queried regardless of group, so their overrides can apply.
pub fn identity_exceptions() -> Vec<&'static str> {
    ROLE_OVERRIDES.iter().filter_map(|o| o.username).collect()
}

fn find_override(username: &str, group: &str) -> Option<&'static RoleOverride> {
    ROLE_OVERRIDES.iter().find(|o| {
        o.group.eq_ignore_ascii_case(group)
            && o.username.is_none_or(|u| u.eq_ignore_ascii_case(username))
    })
}

/// Display role and optional badge for a permission row.
pub fn normalize_role(username: &str, group: &str) -> (String, Option<String>) {
    if let Some(o) = find_override(username, group) {
        return (o.role.to_string(), Some(o.badge.to_string()));
    }
    let badge = GROUP_BADGES
        .iter()
        .find(|(g, _)| g.eq_ignore_ascii_case(group))
        .map(|(_, b)| b.to_string());
    (group.to_string(), badge)
}

pub fn is_staff(username: &str, group: &str) -> bool {
    find_override(username, group).is_some()
        || ALLOWED_GROUPS.iter().any(|g| g.eq_ignore_ascii_case(group))
}

/// Head render keyed by skin identifier, else by uuid.
pub fn avatar_url(uuid: &str, skin: Option<&str>) -> String {
    format!("{}/{}/100", AVATAR_BASE, skin.unwrap_or(uuid))
}

/// Join online names with the stored rows. Output follows `rows` order.
pub fn build_entries(
    online: &[String],
    rows: &[PermissionRow],
    skins: &HashMap<String, String>,
    sessions: &HashMap<String, i64>,
    now_ms: i64,
) -> Vec<StaffPresenceEntry> {
    rows.iter()
        .filter(|r| online.iter().any(|n| n.eq_ignore_ascii_case(&r.username)))
        .filter(|r| is_staff(&r.username, &r.group))
        .map(|r| {
            let (role, role_image) = normalize_role(&r.username, &r.group);
            StaffPresenceEntry {
                username: r.username.clone(),
                role,
                role_image,
                uuid: r.uuid.clone(),
                avatar: avatar_url(&r.uuid, skins.get(&r.uuid).map(String::as_str)),
                login_time: sessions.get(&r.uuid).copied().unwrap_or(now_ms),
            }
        })
        .collect()
}

pub struct StaffResolver<'a> {
    repo: &'a AnalyticsRepo,
}

impl<'a> StaffResolver<'a> {
    pub fn new(repo: &'a AnalyticsRepo) -> Self {
        Self { repo }
    }

    /// Fails only when the permission lookup fails; skin and session lookups degrade to defaults.
    #[instrument(skip_all, fields(operation = "resolve_staff", online = online.len()))]
    pub async fn resolve(
        &self,
        online: &[String],
        now_ms: i64,
    ) -> Result<Vec<StaffPresenceEntry>, AggregatorError> {
        if online.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .repo
            .staff_permissions(online, ALLOWED_GROUPS, &identity_exceptions())
            .await?;
        let uuids: Vec<String> = rows.iter().map(|r| r.uuid.clone()).collect();

        let (skins, sessions) =
            tokio::join!(self.repo.skins(&uuids), self.repo.session_starts(&uuids));
        let skins = skins.unwrap_or_else(|e| {
            warn!(
                source = "database",
                db = %self.repo.target(),
                error = %e,
                "skin lookup failed, using uuid avatars"
            );
            HashMap::new()
        });
        let sessions = sessions.unwrap_or_else(|e| {
            warn!(
                source = "database",
                db = %self.repo.target(),
                error = %e,
                "session lookup failed, using now as login time"
            );
            HashMap::new()
        });

        Ok(build_entries(online, &rows, &skins, &sessions, now_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(username: &str, uuid: &str, group: &str) -> PermissionRow {
        PermissionRow {
            username: username.into(),
            uuid: uuid.into(),
            group: group.into(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn member_is_not_staff_admin_is() {
        let online = names(&["Alice", "Bob"]);
        let rows = vec![row("Alice", "u-a", "member"), row("Bob", "u-b", "admin")];
        let out = build_entries(&online, &rows, &HashMap::new(), &HashMap::new(), 1_000);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].username, "Bob");
        assert_eq!(out[0].role, "admin");
        assert_eq!(out[0].role_image, None);
    }

    #[test]
    fn legacy_founder_is_relabeled() {
        let (role, badge) = normalize_role("UltraXn", "default");
        assert_eq!(role, FOUNDER_ROLE);
        assert_eq!(badge.as_deref(), Some(FOUNDER_BADGE));
        assert!(is_staff("UltraXn", "default"));
    }

    #[test]
    fn founder_rewrite_applies_to_no_other_player() {
        let (role, badge) = normalize_role("Steve", "default");
        assert_eq!(role, "default");
        assert_eq!(badge, None);
        assert!(!is_staff("Steve", "default"));
        assert!(!is_staff("UltraXn2", "default"));
    }

    #[test]
    fn lowercased_founder_row_is_relabeled() {
        let online = names(&["UltraXn"]);
        let rows = vec![row("ultraxn", "u-f", "default")];
        let out = build_entries(&online, &rows, &HashMap::new(), &HashMap::new(), 0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, FOUNDER_ROLE);
        assert_eq!(out[0].role_image.as_deref(), Some(FOUNDER_BADGE));
    }

    #[test]
    fn legacy_account_with_other_group_is_not_rewritten() {
        assert!(!is_staff("UltraXn", "member"));
        assert_eq!(normalize_role("UltraXn", "admin").0, "admin");
    }

    #[test]
    fn blank_rank_becomes_founder() {
        let (role, badge) = normalize_role("Someone", BLANK_RANK_GROUP);
        assert_eq!(role, FOUNDER_ROLE);
        assert_eq!(badge.as_deref(), Some(FOUNDER_BADGE));
    }

    #[test]
    fn founder_equivalent_group_keeps_label_with_badge() {
        let (role, badge) = normalize_role("Nero", "Neroferno");
        assert_eq!(role, "Neroferno");
        assert_eq!(badge.as_deref(), Some(FOUNDER_BADGE));
    }

    #[test]
    fn role_membership_is_case_insensitive() {
        assert!(is_staff("x", "ADMIN"));
        assert!(is_staff("x", "Helper"));
    }

    #[test]
    fn missing_side_rows_use_defaults() {
        let online = names(&["Bob"]);
        let rows = vec![row("Bob", "u-b", "mod")];
        let out = build_entries(&online, &rows, &HashMap::new(), &HashMap::new(), 42);
        assert_eq!(out[0].avatar, "https://mc-heads.net/avatar/u-b/100");
        assert_eq!(out[0].login_time, 42);
    }

    #[test]
    fn side_rows_fill_avatar_and_login() {
        let online = names(&["Bob"]);
        let rows = vec![row("Bob", "u-b", "mod")];
        let skins = HashMap::from([("u-b".to_string(), "skin123".to_string())]);
        let sessions = HashMap::from([("u-b".to_string(), 7_i64)]);
        let out = build_entries(&online, &rows, &skins, &sessions, 42);
        assert_eq!(out[0].avatar, "https://mc-heads.net/avatar/skin123/100");
        assert_eq!(out[0].login_time, 7);
    }

    #[test]
    fn output_follows_row_order() {
        let online = names(&["A", "B", "C"]);
        let rows = vec![
            row("C", "u-c", "staff"),
            row("A", "u-a", "helper"),
            row("B", "u-b", "admin"),
        ];
        let out = build_entries(&online, &rows, &HashMap::new(), &HashMap::new(), 0);
        let order: Vec<_> = out.iter().map(|e| e.username.as_str()).collect();
        assert_eq!(order, ["C", "A", "B"]);
    }

    #[test]
    fn offline_rows_are_ignored() {
        let online = names(&["A"]);
        let rows = vec![row("Z", "u-z", "admin")];
        assert!(build_entries(&online, &rows, &HashMap::new(), &HashMap::new(), 0).is_empty());
    }

    #[test]
    fn identity_exceptions_come_from_override_table() {
        assert_eq!(identity_exceptions(), vec!["UltraXn"]);
    }
}
