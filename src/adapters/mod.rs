// Adapters layer: wire formats of the supported analytics backends.

pub mod google_analytics;
pub mod matomo;
pub mod posthog;

pub use google_analytics::GoogleAnalyticsBackend;
pub use matomo::MatomoBackend;
pub use posthog::PostHogBackend;
