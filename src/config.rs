//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Funnel configuration.
#[derive(Debug, Clone)]
pub struct FunnelConfig {
    /// Origin the backend endpoints are served from.
    pub base_url: String,
    /// Route that terminates the funnel and clears the session.
    pub success_route: String,
    /// Route the checkout form hands off to.
    pub onboarding_route: String,
    /// Route a successful login navigates to.
    pub dashboard_route: String,
    /// Delay between characters when revealing a typed chat message.
    pub reveal_delay: Duration,
    /// How long a missing required field stays flagged.
    pub error_flash: Duration,
    /// Timeout applied to every backend request.
    pub request_timeout: Duration,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            success_route: "/success".to_string(),
            onboarding_route: "/onboarding".to_string(),
            dashboard_route: "/dashboard".to_string(),
            reveal_delay: Duration::from_millis(12),
            error_flash: Duration::from_millis(1200),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl FunnelConfig {
    /// Build a config from `FUNNEL_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("FUNNEL_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(route) = lookup("FUNNEL_SUCCESS_ROUTE") {
            config.success_route = crate::funnel::normalize_path(&route);
        }
        if let Some(ms) = lookup("FUNNEL_REVEAL_DELAY_MS") {
            config.reveal_delay = Duration::from_millis(parse_millis("FUNNEL_REVEAL_DELAY_MS", &ms)?);
        }
        if let Some(ms) = lookup("FUNNEL_ERROR_FLASH_MS") {
            config.error_flash = Duration::from_millis(parse_millis("FUNNEL_ERROR_FLASH_MS", &ms)?);
        }
        if let Some(secs) = lookup("FUNNEL_REQUEST_TIMEOUT_SECS") {
            let secs = secs.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "FUNNEL_REQUEST_TIMEOUT_SECS".to_string(),
                message: e.to_string(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
