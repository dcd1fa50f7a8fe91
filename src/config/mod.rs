#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::TriggerType;
use crate::domain::ports::TriggerConfig;
use crate::utils::error::{EventHubError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_GA_ENDPOINT: &str = "https://www.google-analytics.com/mp/collect";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_user_agent() -> String {
    format!("event-hub/{}", env!("CARGO_PKG_VERSION"))
}

/// Switches shared by every backend section. A section without `enabled = true`
/// is initialized but never sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub debug: bool,
}

impl BaseConfig {
    pub fn active() -> Self {
        Self {
            enabled: true,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatomoConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub site_id: Option<String>,
    pub tracker_url: Option<String>,
    /// Endpoint for the POST fallback; defaults to `tracker_url`.
    pub api_url: Option<String>,
    /// Sent as `url` when an event carries no `pageUrl`.
    pub default_url: Option<String>,
}

impl MatomoConfig {
    pub fn new(site_id: impl Into<String>, tracker_url: impl Into<String>) -> Self {
        Self {
            base: BaseConfig::active(),
            site_id: Some(site_id.into()),
            tracker_url: Some(tracker_url.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleAnalyticsConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub measurement_id: Option<String>,
    pub api_secret: Option<String>,
    pub endpoint: Option<String>,
}

impl GoogleAnalyticsConfig {
    pub fn new(measurement_id: impl Into<String>) -> Self {
        Self {
            base: BaseConfig::active(),
            measurement_id: Some(measurement_id.into()),
            ..Default::default()
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_GA_ENDPOINT)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostHogConfig {
    #[serde(flatten)]
    pub base: BaseConfig,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
}

impl PostHogConfig {
    pub fn new(api_key: impl Into<String>, api_host: impl Into<String>) -> Self {
        Self {
            base: BaseConfig::active(),
            api_key: Some(api_key.into()),
            api_host: Some(api_host.into()),
            ..Default::default()
        }
    }
}

impl TriggerConfig for MatomoConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }
}

impl TriggerConfig for GoogleAnalyticsConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }
}

impl TriggerConfig for PostHogConfig {
    fn base(&self) -> &BaseConfig {
        &self.base
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn build_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(self.user_agent.as_str())
            .build()?;
        Ok(client)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventHubConfig {
    pub matomo: Option<MatomoConfig>,
    pub google_analytics: Option<GoogleAnalyticsConfig>,
    pub posthog: Option<PostHogConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    /// Routing table: event name -> triggers that receive it.
    #[serde(default)]
    pub events: HashMap<String, Vec<TriggerType>>,
}

impl EventHubConfig {
    pub fn with_route(mut self, event_name: impl Into<String>, triggers: &[TriggerType]) -> Self {
        self.events.insert(event_name.into(), triggers.to_vec());
        self
    }

    pub fn is_configured(&self, trigger: TriggerType) -> bool {
        match trigger {
            TriggerType::Matomo => self.matomo.is_some(),
            TriggerType::GoogleAnalytics => self.google_analytics.is_some(),
            TriggerType::PostHog => self.posthog.is_some(),
        }
    }

    pub fn configured_triggers(&self) -> Vec<TriggerType> {
        TriggerType::ALL
            .into_iter()
            .filter(|t| self.is_configured(*t))
            .collect()
    }

    fn validate_routes(&self) -> Result<()> {
        for (event_name, triggers) in &self.events {
            validation::validate_event_name(event_name)?;

            if triggers.is_empty() {
                return Err(EventHubError::ConfigValidationError {
                    field: format!("events.{}", event_name),
                    message: "Route must list at least one trigger".to_string(),
                });
            }

            if let Some(missing) = triggers.iter().find(|t| !self.is_configured(**t)) {
                return Err(EventHubError::ConfigValidationError {
                    field: format!("events.{}", event_name),
                    message: format!("Trigger '{}' is routed to but has no configuration section", missing),
                });
            }
        }
        Ok(())
    }
}

impl Validate for MatomoConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_required_field("matomo.site_id", &self.site_id)?;
        let tracker_url = validation::validate_required_field("matomo.tracker_url", &self.tracker_url)?;
        validation::validate_url("matomo.tracker_url", tracker_url)?;
        if let Some(api_url) = &self.api_url {
            validation::validate_url("matomo.api_url", api_url)?;
        }
        if let Some(default_url) = &self.default_url {
            validation::validate_url("matomo.default_url", default_url)?;
        }
        Ok(())
    }
}

impl Validate for GoogleAnalyticsConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_required_field("google_analytics.measurement_id", &self.measurement_id)?;
        validation::validate_url("google_analytics.endpoint", self.endpoint())?;
        Ok(())
    }
}

impl Validate for PostHogConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_required_field("posthog.api_key", &self.api_key)?;
        let api_host = validation::validate_required_field("posthog.api_host", &self.api_host)?;
        validation::validate_url("posthog.api_host", api_host)?;
        Ok(())
    }
}

impl Validate for HttpConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_range("http.timeout_seconds", self.timeout_seconds, 1, 300)
    }
}

impl Validate for EventHubConfig {
    fn validate(&self) -> Result<()> {
        if let Some(matomo) = &self.matomo {
            matomo.validate()?;
        }
        if let Some(ga) = &self.google_analytics {
            ga.validate()?;
        }
        if let Some(posthog) = &self.posthog {
            posthog.validate()?;
        }
        self.http.validate()?;
        self.validate_routes()
    }
}
