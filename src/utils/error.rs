use crate::domain::model::TriggerType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventHubError {
    #[error("EventHub already initialized")]
    AlreadyInitialized,

    #[error("EventHub not initialized. Call initialize() first.")]
    NotInitialized,

    #[error("{} trigger not initialized. Call initialize() first.", .trigger.label())]
    TriggerNotInitialized { trigger: TriggerType },

    #[error("Event trigger '{name}' not found")]
    UnknownTrigger { name: String },

    #[error("No triggers mapped for event '{name}'")]
    UnknownEvent { name: String },

    #[error("Invalid event name '{name}': {reason}")]
    InvalidEventName { name: String, reason: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Failed to send {} event: {reason}", .trigger.label())]
    DeliveryError { trigger: TriggerType, reason: String },

    #[error("Dispatch of '{event}' failed: {}", format_failures(.failures))]
    DispatchFailed {
        event: String,
        failures: Vec<(TriggerType, EventHubError)>,
    },

    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EventHubError>;

fn format_failures(failures: &[(TriggerType, EventHubError)]) -> String {
    failures
        .iter()
        .map(|(trigger, error)| format!("[{}] {}", trigger, error))
        .collect::<Vec<_>>()
        .join("; ")
}

impl EventHubError {
    pub(crate) fn delivery(trigger: TriggerType, reason: impl ToString) -> Self {
        Self::DeliveryError {
            trigger,
            reason: reason.to_string(),
        }
    }

    /// True when the failure happened on the far side of an HTTP call.
    pub fn is_remote(&self) -> bool {
        match self {
            Self::DeliveryError { .. } | Self::ApiError(_) => true,
            Self::DispatchFailed { failures, .. } => failures.iter().any(|(_, e)| e.is_remote()),
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "Initialize the hub once at startup and reuse it",
            Self::NotInitialized | Self::TriggerNotInitialized { .. } => {
                "Add the backend section to the configuration and call initialize() before tracking"
            }
            Self::UnknownTrigger { .. } => "Use one of: matomo, googleAnalytics, posthog",
            Self::UnknownEvent { .. } => "Map the event to one or more triggers in the [events] table",
            Self::InvalidEventName { .. } => {
                "Event names must start with a letter and contain only letters, digits, '_', '.', ':' or '-'"
            }
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => "Check the configuration file and fix the reported field",
            Self::DeliveryError { .. } | Self::DispatchFailed { .. } | Self::ApiError(_) => {
                "Check network connectivity and the backend credentials"
            }
            Self::IoError(_) => "Check that the file exists and is readable",
            Self::SerializationError(_) => "Event data must be a valid JSON object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_message_uses_backend_label() {
        let err = EventHubError::delivery(
            TriggerType::GoogleAnalytics,
            "Google Analytics API responded with status: 500",
        );
        assert_eq!(
            err.to_string(),
            "Failed to send Google Analytics event: Google Analytics API responded with status: 500"
        );
        assert!(err.is_remote());
    }

    #[test]
    fn test_dispatch_failed_lists_every_trigger() {
        let err = EventHubError::DispatchFailed {
            event: "signup".to_string(),
            failures: vec![
                (TriggerType::Matomo, EventHubError::delivery(TriggerType::Matomo, "timeout")),
                (
                    TriggerType::PostHog,
                    EventHubError::TriggerNotInitialized {
                        trigger: TriggerType::PostHog,
                    },
                ),
            ],
        };

        let message = err.to_string();
        assert!(message.starts_with("Dispatch of 'signup' failed: [matomo]"));
        assert!(message.contains("[posthog] PostHog trigger not initialized"));
        assert!(err.is_remote());
    }

    #[test]
    fn test_local_errors_are_not_remote() {
        assert!(!EventHubError::NotInitialized.is_remote());
        assert!(!EventHubError::MissingConfigError {
            field: "matomo.site_id".to_string()
        }
        .is_remote());
    }
}
