// HTTP routes

mod http;
mod resources;
mod staff;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::analytics_repo::AnalyticsRepo;
use crate::config::AppConfig;
use crate::panel_repo::PanelClient;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<AppConfig>,
    /// Absent when panel credentials are missing; /resources then answers 500.
    pub(crate) panel: Option<Arc<PanelClient>>,
    pub(crate) analytics: Arc<AnalyticsRepo>,
}

pub fn app(config: AppConfig, analytics: Arc<AnalyticsRepo>) -> Router {
    let panel = build_panel(&config);
    let state = AppState {
        config: Arc::new(config),
        panel,
        analytics,
    };
    Router::new()
        .route("/", get(|| async { "opsboard: live operational aggregator" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/resources", get(resources::resources_handler)) // GET /resources
        .route("/staff", get(staff::staff_handler)) // GET /staff
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

fn build_panel(config: &AppConfig) -> Option<Arc<PanelClient>> {
    let credentials = match config.panel.credentials() {
        Ok(c) => c,
        Err(e) => {
            error!(source = "panel", error = %e, "panel disabled: credentials missing");
            return None;
        }
    };
    match PanelClient::new(&config.panel, &credentials) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            error!(source = "panel", error = %e, "panel disabled: client setup failed");
            None
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
