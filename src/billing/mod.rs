//! Billing module for subscription tiers and feature entitlements
//!
//! This module handles:
//! - Tier normalization from stored subscription records
//! - Status classification (active / grace period / locked)
//! - Feature gating by minimum tier
//! - Per-tier asset limits

mod entitlements;
mod limits;
mod types;

pub use entitlements::{
    check_feature, effective_tier, has_feature, is_locked, is_payment_warning,
    is_subscription_active, max_press_images, normalize_tier, Entitlements,
};
pub use limits::{
    LimitDiscrepancy, PressImageLimits, ADVERTISED_PRESS_IMAGES, ENFORCED_PRESS_IMAGES,
};
pub use types::{
    AccessCheckResult, AccountBanner, Feature, FeatureGate, StatusClass, SubscriptionStatus,
    SubscriptionTier, UnknownFeature,
};
