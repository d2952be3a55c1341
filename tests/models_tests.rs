// Response JSON shape served to the dashboard

use opsboard::models::*;
use serde_json::json;

#[test]
fn test_resources_response_is_flat_union() {
    let body = ResourcesResponse::merge(
        ResourceSnapshot {
            status: ServerStatus::Running,
            memory: MemoryUsage {
                current: 2048,
                limit: 4096,
            },
            cpu: 25.0,
            disk: 900,
        },
        GlobalPlayStats {
            online: 3,
            total_players: 120,
            new_players: 4,
            total_playtime_hours: 5000,
        },
    );
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(
        value,
        json!({
            "status": "running",
            "memory": { "current": 2048, "limit": 4096 },
            "cpu": 25.0,
            "disk": 900,
            "online": 3,
            "total_players": 120,
            "new_players": 4,
            "total_playtime_hours": 5000
        })
    );
}

#[test]
fn test_offline_snapshot_defaults() {
    let value = serde_json::to_value(ResourceSnapshot::offline()).unwrap();
    assert_eq!(
        value,
        json!({ "status": "offline", "memory": { "current": 0, "limit": 0 }, "cpu": 0.0, "disk": 0 })
    );
}

#[test]
fn test_server_status_from_panel() {
    assert_eq!(ServerStatus::from_panel("running"), ServerStatus::Running);
    assert_eq!(ServerStatus::from_panel("STARTING"), ServerStatus::Starting);
    assert_eq!(ServerStatus::from_panel("stopping"), ServerStatus::Stopping);
    assert_eq!(ServerStatus::from_panel("offline"), ServerStatus::Offline);
    assert_eq!(ServerStatus::from_panel(""), ServerStatus::Offline);
}

#[test]
fn test_unknown_status_deserializes_as_offline() {
    let s: ServerStatus = serde_json::from_str("\"installing\"").unwrap();
    assert_eq!(s, ServerStatus::Offline);
}

#[test]
fn test_staff_entry_field_names() {
    let entry = StaffPresenceEntry {
        username: "UltraXn".into(),
        role: "Founder".into(),
        role_image: Some("/ranks/rank-neroferno.png".into()),
        uuid: "0f0e".into(),
        avatar: "https://mc-heads.net/avatar/0f0e/100".into(),
        login_time: 1_700_000_000_000,
    };
    let value = serde_json::to_value(&entry).unwrap();
    for key in ["username", "role", "role_image", "uuid", "avatar", "login_time"] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    let plain = StaffPresenceEntry {
        role_image: None,
        ..entry
    };
    assert!(serde_json::to_value(&plain).unwrap()["role_image"].is_null());
}
