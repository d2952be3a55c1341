// Container control-plane client (bearer-token HTTP) for live usage and configured limits.

mod normalize;

pub use normalize::{
    LimitAttributes, ServerDetailsResponse, UsageAttributes, UsageResources, UsageResponse,
    bytes_to_mb, normalize, normalize_cpu,
};

use crate::config::{PanelConfig, PanelCredentials};
use crate::error::{AggregatorError, Source};
use crate::models::ResourceSnapshot;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

pub struct PanelClient {
    http: reqwest::Client,
    base_url: String,
    server_id: String,
}

impl PanelClient {
    pub fn new(
        config: &PanelConfig,
        credentials: &PanelCredentials,
    ) -> Result<Self, AggregatorError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Bearer {}", credentials.api_key))
            .map_err(|_| AggregatorError::Configuration("panel.api_key"))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| AggregatorError::unavailable(Source::Panel, config.base_url.clone(), e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            server_id: credentials.server_id.clone(),
        })
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    fn server_url(&self, suffix: &str) -> String {
        format!("{}/servers/{}{}", self.base_url, self.server_id, suffix)
    }

    #[instrument(skip(self), fields(repo = "panel", operation = "fetch_usage", server_id = %self.server_id))]
    pub async fn fetch_usage(&self) -> Result<UsageAttributes, AggregatorError> {
        let body: UsageResponse = self.get_json(&self.server_url("/resources")).await?;
        Ok(body.attributes)
    }

    /// Limits for the configured container. A reply for a different container is rejected.
    #[instrument(skip(self), fields(repo = "panel", operation = "fetch_limits", server_id = %self.server_id))]
    pub async fn fetch_limits(&self) -> Result<LimitAttributes, AggregatorError> {
        let url = self.server_url("");
        let body: ServerDetailsResponse = self.get_json(&url).await?;
        if let Some(identifier) = body.attributes.identifier.as_deref()
            && identifier != self.server_id
        {
            return Err(AggregatorError::unavailable(
                Source::Panel,
                url,
                format!("limits belong to container {}", identifier),
            ));
        }
        Ok(body.attributes.limits)
    }

    /// Usage and limits fetched concurrently, merged by container. Never fails: a usage
    /// failure yields the offline snapshot, a limits failure falls back to raw CPU.
    pub async fn snapshot(&self) -> ResourceSnapshot {
        let (usage, limits) = tokio::join!(self.fetch_usage(), self.fetch_limits());
        merge_outcomes(&self.server_id, usage, limits)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AggregatorError> {
        let resp = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AggregatorError::Timeout {
                    upstream: Source::Panel,
                    target: url.to_string(),
                }
            } else {
                AggregatorError::unavailable(Source::Panel, url, e)
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AggregatorError::Upstream {
                upstream: Source::Panel,
                target: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.json()
            .await
            .map_err(|e| AggregatorError::unavailable(Source::Panel, url, e))
    }
}

/// Combine the two independent call outcomes, logging each degradation.
pub fn merge_outcomes(
    server_id: &str,
    usage: Result<UsageAttributes, AggregatorError>,
    limits: Result<LimitAttributes, AggregatorError>,
) -> ResourceSnapshot {
    let usage = match usage {
        Ok(u) => u,
        Err(e) => {
            warn!(source = "panel", server_id, error = %e, "usage unavailable, reporting offline");
            return ResourceSnapshot::offline();
        }
    };
    let limits = match limits {
        Ok(l) => Some(l),
        Err(e) => {
            warn!(source = "panel", server_id, error = %e, "limits unavailable, using raw cpu");
            None
        }
    };
    normalize(&usage, limits.as_ref())
}
