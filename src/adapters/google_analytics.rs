use crate::config::GoogleAnalyticsConfig;
use crate::domain::model::{truthy, EventData, TriggerType};
use crate::domain::ports::Backend;
use crate::utils::error::{EventHubError, Result};
use crate::utils::validation::{validate_required_field, validate_url};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

const DEFAULT_ENGAGEMENT_TIME_MSEC: u64 = 100;

/// GA4 Measurement Protocol.
#[derive(Debug, Clone)]
pub struct GoogleAnalyticsBackend {
    collect_url: Url,
    debug: bool,
}

impl GoogleAnalyticsBackend {
    pub fn collect_url(&self) -> &Url {
        &self.collect_url
    }

    pub fn payload(event_name: &str, data: &EventData) -> Value {
        let client_id = truthy(data, "client_id")
            .cloned()
            .unwrap_or_else(|| Value::from("anonymous"));

        let mut params = data.clone();
        let engagement = truthy(data, "engagement_time_msec")
            .cloned()
            .unwrap_or_else(|| Value::from(DEFAULT_ENGAGEMENT_TIME_MSEC));
        params.insert("engagement_time_msec".to_string(), engagement);

        json!({
            "client_id": client_id,
            "events": [{
                "name": event_name,
                "params": params,
            }],
        })
    }
}

#[async_trait]
impl Backend for GoogleAnalyticsBackend {
    type Config = GoogleAnalyticsConfig;

    const TRIGGER: TriggerType = TriggerType::GoogleAnalytics;

    fn from_config(config: &GoogleAnalyticsConfig) -> Result<Self> {
        let measurement_id =
            validate_required_field("google_analytics.measurement_id", &config.measurement_id)?;
        let mut collect_url = validate_url("google_analytics.endpoint", config.endpoint())?;

        {
            let mut query = collect_url.query_pairs_mut();
            query.append_pair("measurement_id", measurement_id);
            if let Some(secret) = config.api_secret.as_deref().filter(|s| !s.is_empty()) {
                query.append_pair("api_secret", secret);
            }
        }

        Ok(Self {
            collect_url,
            debug: config.base.debug,
        })
    }

    async fn send_event(&self, client: &Client, event_name: &str, data: &EventData) -> Result<()> {
        let payload = Self::payload(event_name, data);
        if self.debug {
            tracing::info!("[Google Analytics] Sending event {} to {}", event_name, self.collect_url.path());
        }

        let response = client
            .post(self.collect_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| EventHubError::delivery(TriggerType::GoogleAnalytics, e))?;

        if !response.status().is_success() {
            return Err(EventHubError::delivery(
                TriggerType::GoogleAnalytics,
                format!(
                    "Google Analytics API responded with status: {}",
                    response.status().as_u16()
                ),
            ));
        }

        Ok(())
    }
}
