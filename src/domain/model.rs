use crate::utils::error::EventHubError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Open-ended event payload. Key order is preserved.
pub type EventData = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    #[serde(rename = "matomo")]
    Matomo,
    #[serde(rename = "googleAnalytics", alias = "google_analytics", alias = "ga")]
    GoogleAnalytics,
    #[serde(rename = "posthog", alias = "postHog")]
    PostHog,
}

impl TriggerType {
    pub const ALL: [TriggerType; 3] = [
        TriggerType::Matomo,
        TriggerType::GoogleAnalytics,
        TriggerType::PostHog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Matomo => "matomo",
            TriggerType::GoogleAnalytics => "googleAnalytics",
            TriggerType::PostHog => "posthog",
        }
    }

    /// Human readable backend name.
    pub fn label(&self) -> &'static str {
        match self {
            TriggerType::Matomo => "Matomo",
            TriggerType::GoogleAnalytics => "Google Analytics",
            TriggerType::PostHog => "PostHog",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = EventHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matomo" => Ok(TriggerType::Matomo),
            "googleAnalytics" | "google_analytics" | "ga" => Ok(TriggerType::GoogleAnalytics),
            "posthog" | "postHog" => Ok(TriggerType::PostHog),
            other => Err(EventHubError::UnknownTrigger {
                name: other.to_string(),
            }),
        }
    }
}

/// Loose truthiness for payload fallbacks: null, false, 0 and "" count as absent.
pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Looks up `key` and returns it when truthy.
pub(crate) fn truthy<'a>(data: &'a EventData, key: &str) -> Option<&'a serde_json::Value> {
    data.get(key).filter(|v| is_truthy(v))
}

/// Stringifies a payload value for a query parameter: strings stay raw, everything
/// else (arrays and objects included) becomes its JSON text.
pub(crate) fn value_to_param(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
