//! Shared application state handed to request handlers

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::billing::PressImageLimits;
use crate::config::{AccessConfig, ConfigError};
use crate::rate_limit::{Clock, RateLimiter, SystemClock};

/// Everything a request handler needs to throttle and gate a request
pub struct AppState {
    pub rate_limiter: Arc<RateLimiter>,
    pub config: AccessConfig,
    cleanup_task: Option<JoinHandle<()>>,
}

impl AppState {
    /// Create state from configuration on the system clock
    pub fn new(config: AccessConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AccessConfig, clock: Arc<dyn Clock>) -> Self {
        let mut limiter = RateLimiter::with_clock(clock).with_default_policy(config.default_policy);
        if let Some(max_buckets) = config.max_buckets {
            limiter = limiter.with_capacity_limit(max_buckets);
        }

        for gap in PressImageLimits::discrepancies() {
            warn!(
                tier = %gap.tier,
                enforced = gap.enforced,
                advertised = gap.advertised,
                "Press image limit differs from pricing grid"
            );
        }

        Self {
            rate_limiter: Arc::new(limiter),
            config,
            cleanup_task: None,
        }
    }

    /// Load configuration from the environment and build state
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(AccessConfig::from_env()?))
    }

    /// Start periodic bucket pruning if configured. Must run inside a tokio runtime.
    pub fn start_background_tasks(&mut self) {
        if self.cleanup_task.is_some() {
            return;
        }
        if let Some(period) = self.config.cleanup_interval {
            info!(period_secs = period.as_secs(), "Starting rate limit cleanup task");
            self.cleanup_task = Some(self.rate_limiter.clone().spawn_cleanup_task(period));
        }
    }

    pub fn has_background_tasks(&self) -> bool {
        self.cleanup_task.is_some()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AccessConfig::default())
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Some(task) = self.cleanup_task.take() {
            task.abort();
        }
    }
}
