// GET /staff — online privileged players. Always 200; any upstream failure yields [].

use axum::{Json, extract::State};
use tracing::{error, instrument, warn};

use super::{AppState, now_ms};
use crate::error::AggregatorError;
use crate::models::StaffPresenceEntry;
use crate::presence::parse_online_players;
use crate::rcon_client;
use crate::staff::StaffResolver;

#[instrument(skip_all, fields(route = "/staff"))]
pub(super) async fn staff_handler(
    State(state): State<AppState>,
) -> Json<Vec<StaffPresenceEntry>> {
    Json(online_staff(&state).await)
}

async fn online_staff(state: &AppState) -> Vec<StaffPresenceEntry> {
    let console = &state.config.console;
    let password = match console.password() {
        Ok(p) => p,
        Err(e) => {
            error!(source = "console", error = %e, "console misconfigured, reporting no staff");
            return Vec::new();
        }
    };

    let reply = match rcon_client::query(console, password, &console.command).await {
        Ok(reply) => reply,
        Err(e @ AggregatorError::Authentication { .. }) => {
            error!(
                source = "console",
                addr = %console.target(),
                error = %e,
                "console rejected credentials"
            );
            return Vec::new();
        }
        Err(e) => {
            warn!(
                source = "console",
                addr = %console.target(),
                error = %e,
                "console unavailable, reporting no staff"
            );
            return Vec::new();
        }
    };

    let online = parse_online_players(&reply);
    if online.is_empty() {
        return Vec::new();
    }

    match StaffResolver::new(&state.analytics)
        .resolve(&online, now_ms())
        .await
    {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                source = "database",
                db = %state.analytics.target(),
                error = %e,
                "permission lookup failed, reporting no staff"
            );
            Vec::new()
        }
    }
}
