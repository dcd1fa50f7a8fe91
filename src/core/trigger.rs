use crate::config::BaseConfig;
use crate::domain::model::EventData;
use crate::domain::ports::{Backend, EventTrigger, TriggerConfig};
use crate::utils::error::{EventHubError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::OnceLock;

/// A backend that passed initialization.
pub struct Prepared<B: Backend> {
    settings: BaseConfig,
    backend: B,
    client: Client,
}

/// Common lifecycle shared by every backend: initialize once, then gate on `enabled`.
pub struct Trigger<B: Backend> {
    state: OnceLock<Prepared<B>>,
}

impl<B: Backend> Default for Trigger<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Trigger<B> {
    pub fn new() -> Self {
        Self {
            state: OnceLock::new(),
        }
    }

    /// Validates `config` without touching this trigger.
    pub fn prepare(config: &B::Config, client: Client) -> Result<Prepared<B>> {
        let backend = B::from_config(config)?;
        Ok(Prepared {
            settings: config.base().clone(),
            backend,
            client,
        })
    }

    pub fn install(&self, prepared: Prepared<B>) -> Result<()> {
        let settings = prepared.settings.clone();
        self.state
            .set(prepared)
            .map_err(|_| EventHubError::AlreadyInitialized)?;

        if settings.debug {
            tracing::info!(
                trigger = %B::TRIGGER,
                enabled = settings.enabled,
                "[{}] Initialized",
                B::TRIGGER.label()
            );
        }
        Ok(())
    }

    pub fn initialize(&self, config: &B::Config, client: Client) -> Result<()> {
        if self.state.get().is_some() {
            return Err(EventHubError::AlreadyInitialized);
        }
        self.install(Self::prepare(config, client)?)
    }
}

#[async_trait]
impl<B: Backend> EventTrigger for Trigger<B> {
    fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    async fn track(&self, event_name: &str, data: &EventData) -> Result<()> {
        let prepared = self
            .state
            .get()
            .ok_or(EventHubError::TriggerNotInitialized { trigger: B::TRIGGER })?;

        if !prepared.settings.enabled {
            if prepared.settings.debug {
                tracing::info!("[{}] Tracking disabled for event: {}", B::TRIGGER.label(), event_name);
            }
            return Ok(());
        }

        match prepared.backend.send_event(&prepared.client, event_name, data).await {
            Ok(()) => {
                if prepared.settings.debug {
                    tracing::info!(
                        event = event_name,
                        fields = data.len(),
                        "[{}] Event sent",
                        B::TRIGGER.label()
                    );
                }
                Ok(())
            }
            Err(e) => {
                if prepared.settings.debug {
                    tracing::error!("[{}] Error tracking event {}: {}", B::TRIGGER.label(), event_name, e);
                }
                Err(e)
            }
        }
    }
}
