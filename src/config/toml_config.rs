use crate::config::EventHubConfig;
use crate::utils::error::{EventHubError, Result};
use regex::Regex;
use std::path::Path;

impl EventHubConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EventHubError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a TOML document after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EventHubError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// Replaces `${VAR}` with the environment value; unknown variables are kept verbatim.
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EventHubError::ConfigValidationError {
        field: "env_substitution".to_string(),
        message: e.to_string(),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PostHogConfig;
    use crate::core::hub::EventHub;
    use crate::domain::model::{EventData, TriggerType};
    use crate::utils::validation::Validate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[matomo]
site_id = "1"
tracker_url = "https://stats.example.com/matomo.php"
enabled = true
debug = true

[google_analytics]
measurement_id = "G-TEST123"
api_secret = "secret"
enabled = false

[posthog]
api_key = "phc_test"
api_host = "https://eu.posthog.com"

[http]
timeout_seconds = 5

[events]
signup = ["matomo", "posthog"]
"checkout.completed" = ["googleAnalytics", "matomo"]
"#;

        let config = EventHubConfig::from_toml_str(toml_content).unwrap();

        let matomo = config.matomo.as_ref().unwrap();
        assert_eq!(matomo.site_id.as_deref(), Some("1"));
        assert!(matomo.base.enabled);
        assert!(matomo.base.debug);

        let ga = config.google_analytics.as_ref().unwrap();
        assert!(!ga.base.enabled);
        assert_eq!(ga.api_secret.as_deref(), Some("secret"));

        assert_eq!(config.http.timeout_seconds, 5);
        assert_eq!(config.events["signup"], vec![TriggerType::Matomo, TriggerType::PostHog]);
        assert_eq!(
            config.events["checkout.completed"],
            vec![TriggerType::GoogleAnalytics, TriggerType::Matomo]
        );
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_section_without_enabled_never_sends() {
        let toml_content = r#"
[posthog]
api_key = "phc_test"
api_host = "https://eu.posthog.com"
"#;

        let config = EventHubConfig::from_toml_str(toml_content).unwrap();
        let posthog = config.posthog.as_ref().unwrap();
        assert!(!posthog.base.enabled);
        assert!(!posthog.base.debug);

        // Port 9 refuses connections, so any outbound call would surface as an error.
        let hub = EventHub::new();
        hub.initialize(&EventHubConfig {
            posthog: Some(PostHogConfig {
                api_host: Some("http://127.0.0.1:9".to_string()),
                ..posthog.clone()
            }),
            ..Default::default()
        })
        .unwrap();
        assert!(hub.track(TriggerType::PostHog, "signup", &EventData::new()).await.is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EventHubConfig::from_toml_str("").unwrap();
        assert!(config.configured_triggers().is_empty());
        assert!(config.events.is_empty());
        assert_eq!(config.http.timeout_seconds, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("EVENT_HUB_TEST_POSTHOG_KEY", "phc_from_env");

        let toml_content = r#"
[posthog]
api_key = "${EVENT_HUB_TEST_POSTHOG_KEY}"
api_host = "https://app.posthog.com"
"#;

        let config = EventHubConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.posthog.unwrap().api_key.as_deref(), Some("phc_from_env"));

        std::env::remove_var("EVENT_HUB_TEST_POSTHOG_KEY");
    }

    #[test]
    fn test_unresolved_env_var_is_kept() {
        let toml_content = r#"
[google_analytics]
measurement_id = "${EVENT_HUB_TEST_UNSET_VARIABLE}"
"#;

        let config = EventHubConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.google_analytics.unwrap().measurement_id.as_deref(),
            Some("${EVENT_HUB_TEST_UNSET_VARIABLE}")
        );
    }

    #[test]
    fn test_unknown_trigger_in_routes_fails_to_parse() {
        let toml_content = r#"
[events]
signup = ["mixpanel"]
"#;

        let err = EventHubConfig::from_toml_str(toml_content).unwrap_err();
        assert!(matches!(err, EventHubError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_validation_rejects_bad_url() {
        let toml_content = r#"
[matomo]
site_id = "1"
tracker_url = "invalid-url"
"#;

        let config = EventHubConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[matomo]
site_id = "7"
tracker_url = "https://stats.example.com/matomo.php"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = EventHubConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.matomo.unwrap().site_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EventHubConfig::from_file("/nonexistent/event-hub.toml").unwrap_err();
        assert!(matches!(err, EventHubError::IoError(_)));
    }
}
