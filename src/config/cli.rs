use crate::domain::model::EventData;
use crate::utils::error::{EventHubError, Result};
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "event-hub")]
#[command(about = "Send analytics events to Matomo, Google Analytics and PostHog")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "event-hub.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load and validate the configuration without sending anything
    Check,
    /// Send one event to a single trigger
    Track {
        /// matomo, googleAnalytics or posthog
        trigger: String,
        event: String,
        /// Event data as a JSON object
        #[arg(long, default_value = "{}")]
        data: String,
    },
    /// Send one event to the triggers mapped in the [events] table
    Dispatch {
        event: String,
        #[arg(long, default_value = "{}")]
        data: String,
    },
    /// Send one event to every configured trigger
    Broadcast {
        event: String,
        #[arg(long, default_value = "{}")]
        data: String,
    },
}

/// Parses `--data`, which must be a JSON object.
pub fn parse_event_data(raw: &str) -> Result<EventData> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(EventHubError::InvalidConfigValueError {
            field: "data".to_string(),
            value: other.to_string(),
            reason: "Event data must be a JSON object".to_string(),
        }),
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_config_file("config", &self.config)?;

        match &self.command {
            Command::Check => Ok(()),
            Command::Track { trigger, event, data } => {
                trigger.parse::<crate::domain::model::TriggerType>()?;
                validation::validate_event_name(event)?;
                parse_event_data(data).map(|_| ())
            }
            Command::Dispatch { event, data } | Command::Broadcast { event, data } => {
                validation::validate_event_name(event)?;
                parse_event_data(data).map(|_| ())
            }
        }
    }
}
