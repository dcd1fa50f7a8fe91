use crate::adapters::{GoogleAnalyticsBackend, MatomoBackend, PostHogBackend};
use crate::config::EventHubConfig;
use crate::core::trigger::Trigger;
use crate::domain::model::{EventData, TriggerType};
use crate::domain::ports::EventTrigger;
use crate::utils::error::{EventHubError, Result};
use crate::utils::validation::{validate_event_name, Validate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

static INSTANCE: OnceLock<EventHub> = OnceLock::new();

/// Registry of every supported trigger plus the event routing table.
///
/// The process-wide hub is reached through [`EventHub::instance`]; separate hubs
/// can be created with [`EventHub::new`]. A hub is initialized at most once.
pub struct EventHub {
    matomo: Trigger<MatomoBackend>,
    google_analytics: Trigger<GoogleAnalyticsBackend>,
    posthog: Trigger<PostHogBackend>,
    routes: OnceLock<HashMap<String, Vec<TriggerType>>>,
    init_lock: Mutex<()>,
    initialized: AtomicBool,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            matomo: Trigger::new(),
            google_analytics: Trigger::new(),
            posthog: Trigger::new(),
            routes: OnceLock::new(),
            init_lock: Mutex::new(()),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn instance() -> &'static EventHub {
        INSTANCE.get_or_init(EventHub::new)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Validates `config` and initializes every configured trigger.
    ///
    /// Nothing is installed unless every section is valid, so a failed call can be retried.
    pub fn initialize(&self, config: &EventHubConfig) -> Result<()> {
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_initialized() {
            return Err(EventHubError::AlreadyInitialized);
        }

        config.validate()?;
        let client = config.http.build_client()?;

        let matomo = config
            .matomo
            .as_ref()
            .map(|c| Trigger::<MatomoBackend>::prepare(c, client.clone()))
            .transpose()?;
        let google_analytics = config
            .google_analytics
            .as_ref()
            .map(|c| Trigger::<GoogleAnalyticsBackend>::prepare(c, client.clone()))
            .transpose()?;
        let posthog = config
            .posthog
            .as_ref()
            .map(|c| Trigger::<PostHogBackend>::prepare(c, client.clone()))
            .transpose()?;

        if let Some(prepared) = matomo {
            self.matomo.install(prepared)?;
        }
        if let Some(prepared) = google_analytics {
            self.google_analytics.install(prepared)?;
        }
        if let Some(prepared) = posthog {
            self.posthog.install(prepared)?;
        }
        self.routes
            .set(config.events.clone())
            .map_err(|_| EventHubError::AlreadyInitialized)?;

        self.initialized.store(true, Ordering::Release);
        tracing::info!(
            triggers = ?self.configured_triggers(),
            routes = config.events.len(),
            "EventHub initialized"
        );
        Ok(())
    }

    pub fn trigger(&self, trigger: TriggerType) -> &dyn EventTrigger {
        match trigger {
            TriggerType::Matomo => &self.matomo,
            TriggerType::GoogleAnalytics => &self.google_analytics,
            TriggerType::PostHog => &self.posthog,
        }
    }

    /// Triggers whose configuration section was present at initialization.
    pub fn configured_triggers(&self) -> Vec<TriggerType> {
        TriggerType::ALL
            .into_iter()
            .filter(|t| self.trigger(*t).is_initialized())
            .collect()
    }

    /// Triggers mapped to `event_name` in the routing table.
    pub fn routes_for(&self, event_name: &str) -> Option<&[TriggerType]> {
        self.routes
            .get()
            .and_then(|routes| routes.get(event_name))
            .map(Vec::as_slice)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(EventHubError::NotInitialized)
        }
    }

    pub async fn track(&self, trigger: TriggerType, event_name: &str, data: &EventData) -> Result<()> {
        self.ensure_initialized()?;
        validate_event_name(event_name)?;
        self.trigger(trigger).track(event_name, data).await
    }

    pub async fn track_by_name(&self, trigger: &str, event_name: &str, data: &EventData) -> Result<()> {
        self.ensure_initialized()?;
        let trigger = trigger.parse::<TriggerType>()?;
        self.track(trigger, event_name, data).await
    }

    /// Sends `event_name` to the triggers listed for it in the routing table.
    pub async fn dispatch(&self, event_name: &str, data: &EventData) -> Result<()> {
        self.ensure_initialized()?;
        validate_event_name(event_name)?;

        let targets = self
            .routes_for(event_name)
            .ok_or_else(|| EventHubError::UnknownEvent {
                name: event_name.to_string(),
            })?;
        self.fan_out(event_name, data, targets).await
    }

    /// Sends `event_name` to every configured trigger.
    pub async fn broadcast(&self, event_name: &str, data: &EventData) -> Result<()> {
        self.ensure_initialized()?;
        validate_event_name(event_name)?;

        let targets = self.configured_triggers();
        self.fan_out(event_name, data, &targets).await
    }

    async fn fan_out(&self, event_name: &str, data: &EventData, targets: &[TriggerType]) -> Result<()> {
        tracing::debug!("Dispatching {} to {:?}", event_name, targets);

        let (matomo, google_analytics, posthog) = tokio::join!(
            self.send_if_targeted(TriggerType::Matomo, targets, event_name, data),
            self.send_if_targeted(TriggerType::GoogleAnalytics, targets, event_name, data),
            self.send_if_targeted(TriggerType::PostHog, targets, event_name, data),
        );

        let failures: Vec<(TriggerType, EventHubError)> = [
            (TriggerType::Matomo, matomo),
            (TriggerType::GoogleAnalytics, google_analytics),
            (TriggerType::PostHog, posthog),
        ]
        .into_iter()
        .filter_map(|(trigger, outcome)| match outcome {
            Some(Err(e)) => Some((trigger, e)),
            _ => None,
        })
        .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            tracing::warn!("{} of {} triggers failed for {}", failures.len(), targets.len(), event_name);
            Err(EventHubError::DispatchFailed {
                event: event_name.to_string(),
                failures,
            })
        }
    }

    async fn send_if_targeted(
        &self,
        trigger: TriggerType,
        targets: &[TriggerType],
        event_name: &str,
        data: &EventData,
    ) -> Option<Result<()>> {
        if targets.contains(&trigger) {
            Some(self.trigger(trigger).track(event_name, data).await)
        } else {
            None
        }
    }
}
