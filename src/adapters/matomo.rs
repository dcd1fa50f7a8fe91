//! Matomo HTTP tracking API.
//!
//! Events go out as a GET "beacon" against the tracker URL. When that fails the
//! same parameters are POSTed form-encoded to the API URL.

use crate::config::MatomoConfig;
use crate::domain::model::{truthy, value_to_param, EventData, TriggerType};
use crate::domain::ports::Backend;
use crate::utils::error::{EventHubError, Result};
use crate::utils::validation::{validate_required_field, validate_url};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

pub const BEACON_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_ACTION_NAME: &str = "Event Tracking";

/// Payload keys that map onto dedicated Matomo parameters instead of custom dimensions.
const RESERVED_KEYS: [&str; 7] = [
    "category",
    "action",
    "name",
    "value",
    "pageTitle",
    "pageUrl",
    "referrer",
];

#[derive(Debug, Clone)]
pub struct MatomoBackend {
    site_id: String,
    tracker_url: Url,
    api_url: Url,
    default_url: Option<String>,
    beacon_timeout: Duration,
    debug: bool,
}

impl MatomoBackend {
    /// Overrides the beacon deadline (defaults to [`BEACON_TIMEOUT`]).
    pub fn with_beacon_timeout(mut self, timeout: Duration) -> Self {
        self.beacon_timeout = timeout;
        self
    }

    /// Tracking parameters in the order they are sent.
    pub fn tracking_params(&self, event_name: &str, data: &EventData) -> Vec<(String, String)> {
        let text_or = |key: &str, fallback: &str| {
            truthy(data, key)
                .map(value_to_param)
                .unwrap_or_else(|| fallback.to_string())
        };

        let mut params = vec![
            ("idsite".to_string(), self.site_id.clone()),
            ("rec".to_string(), "1".to_string()),
            ("action_name".to_string(), text_or("pageTitle", DEFAULT_ACTION_NAME)),
        ];

        let page_url = truthy(data, "pageUrl")
            .map(value_to_param)
            .or_else(|| self.default_url.clone());
        if let Some(page_url) = page_url {
            params.push(("url".to_string(), page_url));
        }
        if let Some(referrer) = truthy(data, "referrer") {
            params.push(("urlref".to_string(), value_to_param(referrer)));
        }

        params.push(("e_c".to_string(), text_or("category", event_name)));
        params.push(("e_a".to_string(), text_or("action", event_name)));
        params.push(("e_n".to_string(), text_or("name", event_name)));

        if let Some(value) = data.get("value").filter(|v| !v.is_null()) {
            params.push(("e_v".to_string(), value_to_param(value)));
        }

        // Dimension numbers follow the key's position in the whole payload.
        for (index, (key, value)) in data.iter().enumerate() {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                params.push((
                    format!("dimension{}", index + 1),
                    format!("{}:{}", key, value_to_param(value)),
                ));
            }
        }

        params
    }

    pub fn tracking_url(&self, params: &[(String, String)]) -> Url {
        let mut url = self.tracker_url.clone();
        url.query_pairs_mut().extend_pairs(params);
        url
    }

    async fn send_beacon(&self, client: &Client, url: Url) -> reqwest::Result<()> {
        client
            .get(url)
            .timeout(self.beacon_timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn send_fallback(&self, client: &Client, params: &[(String, String)]) -> reqwest::Result<()> {
        client
            .post(self.api_url.clone())
            .form(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn describe_beacon_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Matomo event tracking timeout".to_string()
    } else {
        error.to_string()
    }
}

#[async_trait]
impl Backend for MatomoBackend {
    type Config = MatomoConfig;

    const TRIGGER: TriggerType = TriggerType::Matomo;

    fn from_config(config: &MatomoConfig) -> Result<Self> {
        let site_id = validate_required_field("matomo.site_id", &config.site_id)?;
        let tracker_url = validate_required_field("matomo.tracker_url", &config.tracker_url)?;
        let tracker_url = validate_url("matomo.tracker_url", tracker_url)?;

        let api_url = match &config.api_url {
            Some(api_url) => validate_url("matomo.api_url", api_url)?,
            None => tracker_url.clone(),
        };

        Ok(Self {
            site_id: site_id.to_string(),
            tracker_url,
            api_url,
            default_url: config.default_url.clone(),
            beacon_timeout: BEACON_TIMEOUT,
            debug: config.base.debug,
        })
    }

    async fn send_event(&self, client: &Client, event_name: &str, data: &EventData) -> Result<()> {
        let params = self.tracking_params(event_name, data);
        let url = self.tracking_url(&params);

        if self.debug {
            tracing::info!("[Matomo] Sending event {}: {}", event_name, url);
        }

        let beacon_error = match self.send_beacon(client, url).await {
            Ok(()) => {
                if self.debug {
                    tracing::info!("[Matomo] Event sent successfully via beacon");
                }
                return Ok(());
            }
            Err(e) => describe_beacon_error(&e),
        };

        if self.debug {
            tracing::warn!("[Matomo] Beacon failed ({}), trying POST to {}", beacon_error, self.api_url);
        }

        match self.send_fallback(client, &params).await {
            Ok(()) => {
                if self.debug {
                    tracing::info!("[Matomo] Event sent via POST fallback");
                }
                Ok(())
            }
            Err(fallback_error) => {
                if self.debug {
                    tracing::error!("[Matomo] POST fallback also failed: {}", fallback_error);
                }
                Err(EventHubError::delivery(TriggerType::Matomo, beacon_error))
            }
        }
    }
}
