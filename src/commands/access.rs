//! Request guard: throttle first, then check the feature gate

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::billing::{check_feature, AccessCheckResult, FeatureGate, SubscriptionTier};
use crate::rate_limit::{
    request_origin, HeaderSource, KeyScope, RateLimitDecision, RateLimitedAction,
};
use crate::state::AppState;

use super::{Caller, CommandError};

/// Outcome of guarding one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GuardOutcome {
    #[serde(rename = "allowed", rename_all = "camelCase")]
    Allowed {
        effective_tier: SubscriptionTier,
        rate_limit: RateLimitDecision,
    },
    #[serde(rename = "rateLimited", rename_all = "camelCase")]
    RateLimited {
        reset_at: i64,
        retry_after_secs: u64,
    },
    #[serde(rename = "featureLocked", rename_all = "camelCase")]
    FeatureLocked {
        access: AccessCheckResult,
        rate_limit: RateLimitDecision,
    },
}

impl GuardOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Guard a request for `action`
///
/// The rate limit key is built from the action plus whichever of the
/// caller's user id and the request origin the action's `KeyScope` names.
/// A feature gate or a per-account key needs an authenticated caller.
/// A request refused by the feature gate still counts against the limit.
pub fn guard_request<H: HeaderSource + ?Sized>(
    state: &AppState,
    action: RateLimitedAction,
    caller: Option<&Caller>,
    headers: &H,
    gate: impl Into<FeatureGate>,
) -> Result<GuardOutcome, CommandError> {
    let gate = gate.into();
    if caller.is_none() && (gate != FeatureGate::Ungated || action.key_scope() == KeyScope::User)
    {
        return Err(CommandError::Unauthorized);
    }

    let origin = request_origin(headers);
    let key = action.key(caller.map(|c| c.user_id.as_str()), Some(origin.as_str()));
    let decision = state.rate_limiter.check_policy(&key, action.policy());

    if !decision.allowed {
        let retry_after = decision.retry_after(state.rate_limiter.now_ms());
        warn!(
            action = action.prefix(),
            origin = %origin,
            retry_after_secs = retry_after.as_secs(),
            "Request throttled"
        );
        return Ok(GuardOutcome::RateLimited {
            reset_at: decision.reset_at,
            retry_after_secs: retry_after.as_secs(),
        });
    }

    let access = check_feature(
        caller.and_then(Caller::tier),
        caller.and_then(Caller::status),
        gate,
    );
    Ok(match access {
        AccessCheckResult::Allowed { effective_tier } => GuardOutcome::Allowed {
            effective_tier,
            rate_limit: decision,
        },
        denied => GuardOutcome::FeatureLocked {
            access: denied,
            rate_limit: decision,
        },
    })
}
