//! Coordinator configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::content_filter::{default_factory, SharedFactory};
use crate::error::{GridFilterError, Result};

/// Quiet period after the last edit before filters are re-evaluated
pub const DEFAULT_EVALUATION_DELAY: Duration = Duration::from_millis(500);

/// Longest debounce accepted from settings
pub const MAX_EVALUATION_DELAY: Duration = Duration::from_secs(60);

/// Runtime configuration for a [`FilterCoordinator`](crate::FilterCoordinator)
#[derive(Clone)]
pub struct FilterConfig {
    pub enabled: bool,
    pub evaluation_delay: Duration,
    /// Used by columns registered without their own factory
    pub default_factory: SharedFactory,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            evaluation_delay: DEFAULT_EVALUATION_DELAY,
            default_factory: default_factory(),
        }
    }
}

impl FilterConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_evaluation_delay(mut self, delay: Duration) -> Self {
        self.evaluation_delay = delay;
        self
    }

    pub fn with_default_factory(mut self, factory: SharedFactory) -> Self {
        self.default_factory = factory;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_delay(self.evaluation_delay)
    }
}

impl std::fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterConfig")
            .field("enabled", &self.enabled)
            .field("evaluation_delay", &self.evaluation_delay)
            .field("default_factory", &self.default_factory.name())
            .finish()
    }
}

/// Serializable subset of [`FilterConfig`], as stored in user settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub enabled: bool,
    pub evaluation_delay_ms: u64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            evaluation_delay_ms: DEFAULT_EVALUATION_DELAY.as_millis() as u64,
        }
    }
}

impl FilterSettings {
    /// Parse settings JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        validate_delay(settings.evaluation_delay())?;
        Ok(settings)
    }

    pub fn evaluation_delay(&self) -> Duration {
        Duration::from_millis(self.evaluation_delay_ms)
    }
}

impl From<FilterSettings> for FilterConfig {
    fn from(settings: FilterSettings) -> Self {
        FilterConfig::default()
            .with_enabled(settings.enabled)
            .with_evaluation_delay(settings.evaluation_delay())
    }
}

pub(crate) fn validate_delay(delay: Duration) -> Result<()> {
    if delay > MAX_EVALUATION_DELAY {
        return Err(GridFilterError::Configuration(format!(
            "evaluation delay {:?} exceeds maximum of {:?}",
            delay, MAX_EVALUATION_DELAY
        )));
    }
    Ok(())
}
