use crate::config::BaseConfig;
use crate::domain::model::{EventData, TriggerType};
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Backend configuration section carrying the shared enabled/debug switches.
pub trait TriggerConfig: Send + Sync {
    fn base(&self) -> &BaseConfig;
}

/// Wire format of one analytics backend.
#[async_trait]
pub trait Backend: Sized + Send + Sync + 'static {
    type Config: TriggerConfig;

    const TRIGGER: TriggerType;

    /// Checks required fields and captures everything `send_event` needs.
    fn from_config(config: &Self::Config) -> Result<Self>;

    async fn send_event(&self, client: &Client, event_name: &str, data: &EventData) -> Result<()>;
}

/// Object-safe view of an initialized-or-not trigger, used by the hub for routing.
#[async_trait]
pub trait EventTrigger: Send + Sync {
    fn is_initialized(&self) -> bool;

    async fn track(&self, event_name: &str, data: &EventData) -> Result<()>;
}
