pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use config::{BaseConfig, EventHubConfig, GoogleAnalyticsConfig, HttpConfig, MatomoConfig, PostHogConfig};
pub use crate::core::{hub::EventHub, trigger::Trigger};
pub use domain::model::{EventData, TriggerType};
pub use domain::ports::EventTrigger;
pub use utils::error::{EventHubError, Result};
