//! Rate limiting for request handlers
//!
//! Provides fixed window rate limiting keyed by an arbitrary string
//! (typically action + user id + request origin). Each key has its own
//! bucket; the window starts on the first request after the previous
//! window expired. Uses DashMap so the check-and-increment for a key runs
//! under that key's shard lock.
//!
//! Buckets live in process memory only. Running several instances
//! multiplies the effective limit by the instance count.

mod clock;
mod origin;
mod policy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use origin::{request_origin, HeaderSource, UNKNOWN_ORIGIN};
pub use policy::{KeyScope, RateLimitPolicy, RateLimitedAction};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Per-key counter for the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bucket {
    count: u32,
    /// Unix timestamp in ms; the bucket is live while `now <= reset_at`
    reset_at: i64,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the window after this one was counted
    pub remaining: u32,
    /// Unix timestamp in ms when the window resets
    pub reset_at: i64,
}

impl RateLimitDecision {
    /// Time until the window resets, measured from `now_ms`
    pub fn retry_after(&self, now_ms: i64) -> Duration {
        let millis = self.reset_at.saturating_sub(now_ms).max(0);
        Duration::from_millis(millis as u64)
    }
}

/// Fixed window rate limiter using lock-free DashMap
pub struct RateLimiter {
    /// Map of key -> bucket for the current window
    buckets: DashMap<String, Bucket>,
    clock: Arc<dyn Clock>,
    /// Policy used by `check_default`
    default_policy: RateLimitPolicy,
    /// Upper bound on tracked keys; `None` for unbounded
    max_buckets: Option<usize>,
}

impl RateLimiter {
    /// Create a new rate limiter on the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a rate limiter reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            clock,
            default_policy: RateLimitPolicy::DEFAULT,
            max_buckets: None,
        }
    }

    /// Replace the policy used by `check_default`
    pub fn with_default_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Bound the number of tracked keys
    ///
    /// When a new key arrives at capacity, expired buckets are pruned
    /// first, then the buckets closest to their reset are evicted until
    /// the table is down to 90% of capacity.
    pub fn with_capacity_limit(mut self, max_buckets: usize) -> Self {
        self.max_buckets = Some(max_buckets.max(1));
        self
    }

    /// Current time according to this limiter's clock (Unix ms)
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Count a request against `key` and decide whether it may proceed
    ///
    /// # Arguments
    /// * `key` - Identity of the throttled action (e.g. `contact:203.0.113.7`)
    /// * `max_requests` - Requests allowed per window
    /// * `window` - Length of the window, anchored at the first request
    pub fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
        let now = self.clock.now_ms();

        if max_requests == 0 {
            warn!(key = key, "Rate limit with zero allowance, denying");
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: now,
            };
        }

        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let fresh = Bucket {
            count: 1,
            reset_at: now.saturating_add(window_ms),
        };
        let admitted_fresh = RateLimitDecision {
            allowed: true,
            remaining: max_requests - 1,
            reset_at: fresh.reset_at,
        };

        if let Some(max_buckets) = self.max_buckets {
            if self.buckets.len() >= max_buckets && !self.buckets.contains_key(key) {
                self.make_room(now, max_buckets);
            }
        }

        // The entry guard holds the shard lock until this match ends.
        match self.buckets.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                debug!(key = key, reset_at = fresh.reset_at, "Opened rate limit window");
                slot.insert(fresh);
                admitted_fresh
            }
            Entry::Occupied(mut slot) => {
                let bucket = slot.get_mut();

                if bucket.reset_at < now {
                    *bucket = fresh;
                    return admitted_fresh;
                }

                if bucket.count >= max_requests {
                    warn!(
                        key = key,
                        requests = bucket.count,
                        max = max_requests,
                        "Rate limit exceeded"
                    );
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: bucket.reset_at,
                    };
                }

                bucket.count += 1;
                RateLimitDecision {
                    allowed: true,
                    remaining: max_requests - bucket.count,
                    reset_at: bucket.reset_at,
                }
            }
        }
    }

    /// Check against a named policy
    pub fn check_policy(&self, key: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        self.check(key, policy.max_requests, policy.window)
    }

    /// Check with the limiter's default policy (10 per hour unless configured)
    pub fn check_default(&self, key: &str) -> RateLimitDecision {
        self.check_policy(key, self.default_policy)
    }

    /// Remaining requests for a key without counting one
    pub fn remaining(&self, key: &str, max_requests: u32) -> u32 {
        let now = self.clock.now_ms();
        self.buckets
            .get(key)
            .filter(|bucket| bucket.reset_at >= now)
            .map(|bucket| max_requests.saturating_sub(bucket.count))
            .unwrap_or(max_requests)
    }

    /// Remove expired buckets, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        let pruned = self.prune_expired(self.clock.now_ms());
        if pruned > 0 {
            info!(pruned = pruned, remaining = self.buckets.len(), "Pruned rate limit buckets");
        }
        pruned
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Run `cleanup` every `period` until the returned task is aborted
    pub fn spawn_cleanup_task(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.cleanup();
            }
        })
    }

    fn prune_expired(&self, now: i64) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.reset_at >= now);
        before.saturating_sub(self.buckets.len())
    }

    fn make_room(&self, now: i64, max_buckets: usize) {
        self.prune_expired(now);
        let len = self.buckets.len();
        if len < max_buckets {
            return;
        }

        // Evict down to 90% so the next run of new keys skips this scan.
        let target = (max_buckets * 9 / 10).min(max_buckets - 1);
        // Collect before removing: iteration holds shard read locks.
        let mut by_reset: Vec<(i64, String)> = self
            .buckets
            .iter()
            .map(|entry| (entry.value().reset_at, entry.key().clone()))
            .collect();
        let excess = by_reset.len().saturating_sub(target);
        if excess == 0 {
            return;
        }
        by_reset.select_nth_unstable_by_key(excess - 1, |(reset_at, _)| *reset_at);

        for (_, key) in by_reset.into_iter().take(excess) {
            self.buckets.remove(&key);
        }
        debug!(evicted = excess, capacity = max_buckets, "Evicted rate limit buckets at capacity");
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
