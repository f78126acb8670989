pub mod billing;
pub mod commands;
pub mod config;
pub mod rate_limit;
mod state;

pub use billing::{
    check_feature, effective_tier, has_feature, is_locked, is_payment_warning,
    is_subscription_active, max_press_images, normalize_tier, AccessCheckResult, Entitlements,
    Feature, FeatureGate, SubscriptionStatus, SubscriptionTier,
};
pub use config::{AccessConfig, ConfigError};
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use state::AppState;

use tracing_subscriber::EnvFilter;

/// Initialize tracing with RUST_LOG env filter
///
/// Default: warn for most crates, info for this one (cleanup summaries visible).
/// Use RUST_LOG=debug for per-request window and denial logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,artist_access=info")),
        )
        .try_init();
}

/// Set up logging, load configuration and start background tasks
///
/// Must be called from within a tokio runtime.
pub fn run() -> Result<AppState, ConfigError> {
    init_tracing();
    let mut state = AppState::from_env()?;
    state.start_background_tasks();
    tracing::info!(
        default_max = state.config.default_policy.max_requests,
        max_buckets = ?state.config.max_buckets,
        "Access core ready"
    );
    Ok(state)
}
