// GET /resources — container resources merged with global play stats.
// Always 200 once configured; upstream failures only degrade fields.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, instrument, warn};

use super::{AppState, now_ms};
use crate::models::{GlobalPlayStats, ResourcesResponse};

#[instrument(skip_all, fields(route = "/resources"))]
pub(super) async fn resources_handler(State(state): State<AppState>) -> impl IntoResponse {
    let Some(panel) = state.panel.as_ref() else {
        let reason = state
            .config
            .panel
            .credentials()
            .err()
            .map_or_else(|| "panel client unavailable".to_string(), |e| e.to_string());
        error!(source = "panel", %reason, "refusing /resources: misconfigured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Pterodactyl credentials missing" })),
        )
            .into_response();
    };

    let (snapshot, stats) = tokio::join!(
        panel.snapshot(),
        state.analytics.global_stats(now_ms())
    );
    let stats = stats.unwrap_or_else(|e| {
        warn!(
            source = "database",
            db = %state.analytics.target(),
            error = %e,
            "play stats unavailable, reporting zeros"
        );
        GlobalPlayStats::default()
    });

    Json(ResourcesResponse::merge(snapshot, stats)).into_response()
}
