use crate::config::PostHogConfig;
use crate::domain::model::{truthy, EventData, TriggerType};
use crate::domain::ports::Backend;
use crate::utils::error::{EventHubError, Result};
use crate::utils::validation::{validate_required_field, validate_url};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

#[derive(Debug, Clone)]
pub struct PostHogBackend {
    api_key: String,
    capture_url: Url,
    debug: bool,
}

impl PostHogBackend {
    pub fn capture_url(&self) -> &Url {
        &self.capture_url
    }

    pub fn payload(event_name: &str, data: &EventData, time: DateTime<Utc>) -> Value {
        let mut properties = data.clone();
        let distinct_id = truthy(data, "distinct_id")
            .cloned()
            .unwrap_or_else(|| Value::from("anonymous"));
        properties.insert("distinct_id".to_string(), distinct_id);
        properties.insert(
            "time".to_string(),
            Value::from(time.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        json!({
            "event": event_name,
            "properties": properties,
        })
    }
}

#[async_trait]
impl Backend for PostHogBackend {
    type Config = PostHogConfig;

    const TRIGGER: TriggerType = TriggerType::PostHog;

    fn from_config(config: &PostHogConfig) -> Result<Self> {
        let api_key = validate_required_field("posthog.api_key", &config.api_key)?;
        let api_host = validate_required_field("posthog.api_host", &config.api_host)?;
        let capture_url = validate_url(
            "posthog.api_host",
            &format!("{}/capture/", api_host.trim_end_matches('/')),
        )?;

        Ok(Self {
            api_key: api_key.to_string(),
            capture_url,
            debug: config.base.debug,
        })
    }

    async fn send_event(&self, client: &Client, event_name: &str, data: &EventData) -> Result<()> {
        let payload = Self::payload(event_name, data, Utc::now());
        if self.debug {
            tracing::info!("[PostHog] Sending event {} to {}", event_name, self.capture_url);
        }

        let response = client
            .post(self.capture_url.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EventHubError::delivery(TriggerType::PostHog, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventHubError::delivery(
                TriggerType::PostHog,
                format!("PostHog API responded with status: {}", status.as_u16()),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaseConfig;
    use chrono::TimeZone;
    use httpmock::prelude::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_payload_shape() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let data = json!({"plan": "pro", "distinct_id": ""}).as_object().cloned().unwrap();

        let payload = PostHogBackend::payload("upgrade", &data, time);

        assert_eq!(
            payload,
            json!({
                "event": "upgrade",
                "properties": {
                    "plan": "pro",
                    "distinct_id": "anonymous",
                    "time": "2024-03-01T12:30:05.000Z"
                }
            })
        );
    }

    #[test]
    fn test_payload_keeps_distinct_id() {
        let data = json!({"distinct_id": "user-42"}).as_object().cloned().unwrap();
        let payload = PostHogBackend::payload("login", &data, Utc::now());
        assert_eq!(payload["properties"]["distinct_id"], "user-42");
    }

    #[test]
    fn test_capture_url_ignores_trailing_slash() {
        let backend =
            PostHogBackend::from_config(&PostHogConfig::new("phc_key", "https://eu.posthog.com/")).unwrap();
        assert_eq!(backend.capture_url().as_str(), "https://eu.posthog.com/capture/");
    }

    #[test]
    fn test_api_key_and_host_required() {
        let err = PostHogBackend::from_config(&PostHogConfig {
            api_host: Some("https://eu.posthog.com".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, EventHubError::MissingConfigError { field } if field == "posthog.api_key"));
    }

    #[tokio::test]
    async fn test_send_event_uses_bearer_auth() {
        let server = MockServer::start();
        let capture = server.mock(|when, then| {
            when.method(POST)
                .path("/capture/")
                .header("authorization", "Bearer phc_test")
                .json_body_partial(r#"{"event":"signup","properties":{"distinct_id":"user-1","source":"cli"}}"#);
            then.status(200).json_body(json!({"status": 1}));
        });

        let backend = PostHogBackend::from_config(&PostHogConfig::new("phc_test", server.base_url())).unwrap();
        let data = json!({"distinct_id": "user-1", "source": "cli"})
            .as_object()
            .cloned()
            .unwrap();

        backend.send_event(&Client::new(), "signup", &data).await.unwrap();
        capture.assert();
    }

    #[tokio::test]
    async fn test_unreachable_host_is_delivery_error() {
        // Port 9 (discard) is expected to refuse connections on test machines.
        let backend = PostHogBackend::from_config(&PostHogConfig::new("phc_test", "http://127.0.0.1:9")).unwrap();

        let err = backend
            .send_event(&Client::new(), "signup", &EventData::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EventHubError::DeliveryError {
                trigger: TriggerType::PostHog,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_send_logs_only_when_debug() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/capture/");
            then.status(200);
        });

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let quiet = PostHogBackend::from_config(&PostHogConfig::new("phc_test", server.base_url())).unwrap();
        quiet.send_event(&Client::new(), "signup", &EventData::new()).await.unwrap();
        assert!(!logs.contents().contains("[PostHog]"));

        let chatty = PostHogBackend::from_config(&PostHogConfig {
            base: BaseConfig {
                enabled: true,
                debug: true,
            },
            ..PostHogConfig::new("phc_test", server.base_url())
        })
        .unwrap();
        chatty.send_event(&Client::new(), "signup", &EventData::new()).await.unwrap();
        assert!(logs.contents().contains("[PostHog] Sending event signup"));
    }
}
