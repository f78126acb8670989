//! Tier entitlement resolution
//!
//! Maps a stored tier string and subscription status string to the tier
//! actually granted and to feature access decisions. Every function here
//! is total: malformed input resolves to tier1 or to a locked status.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::limits::ENFORCED_PRESS_IMAGES;
use super::types::{
    AccessCheckResult, AccountBanner, Feature, FeatureGate, StatusClass, SubscriptionTier,
};

/// Normalize any raw tier string to a canonical tier
///
/// Case-insensitive and whitespace-trimmed. Unrecognized input is tier1.
pub fn normalize_tier(raw: Option<&str>) -> SubscriptionTier {
    let Some(raw) = raw else {
        return SubscriptionTier::Tier1;
    };
    match raw.trim().to_lowercase().as_str() {
        "tier2" | "tier ii" | "2" => SubscriptionTier::Tier2,
        "tier3" | "tier iii" | "3" => SubscriptionTier::Tier3,
        _ => SubscriptionTier::Tier1,
    }
}

/// True for `active`, `trialing` and `past_due`
pub fn is_subscription_active(status: Option<&str>) -> bool {
    StatusClass::of(status).grants_access()
}

/// True only for `past_due`
pub fn is_payment_warning(status: Option<&str>) -> bool {
    StatusClass::of(status) == StatusClass::Grace
}

/// True for `canceled`, `inactive`, `incomplete`, missing and unrecognized statuses
pub fn is_locked(status: Option<&str>) -> bool {
    StatusClass::of(status) == StatusClass::Locked
}

/// Tier actually granted: tier1 whenever the subscription does not grant access
pub fn effective_tier(raw_tier: Option<&str>, status: Option<&str>) -> SubscriptionTier {
    if !is_subscription_active(status) {
        return SubscriptionTier::Tier1;
    }
    normalize_tier(raw_tier)
}

/// Check whether the effective tier satisfies a feature gate
pub fn has_feature(
    raw_tier: Option<&str>,
    status: Option<&str>,
    gate: impl Into<FeatureGate>,
) -> bool {
    match gate.into() {
        FeatureGate::Ungated => true,
        FeatureGate::Feature(feature) => {
            effective_tier(raw_tier, status).level() >= feature.min_tier().level()
        }
    }
}

/// Maximum press images for the effective tier
pub fn max_press_images(raw_tier: Option<&str>, status: Option<&str>) -> u32 {
    ENFORCED_PRESS_IMAGES.for_tier(effective_tier(raw_tier, status))
}

/// Check a feature gate, returning upgrade details when denied
pub fn check_feature(
    raw_tier: Option<&str>,
    status: Option<&str>,
    gate: impl Into<FeatureGate>,
) -> AccessCheckResult {
    let gate = gate.into();
    let effective_tier = effective_tier(raw_tier, status);

    let feature = match gate {
        FeatureGate::Ungated => return AccessCheckResult::Allowed { effective_tier },
        FeatureGate::Feature(feature) => feature,
    };

    if has_feature(raw_tier, status, gate) {
        return AccessCheckResult::Allowed { effective_tier };
    }

    let required_tier = feature.min_tier();
    let status_class = StatusClass::of(status);
    debug!(
        feature = %feature,
        effective = %effective_tier,
        required = %required_tier,
        status = ?status_class,
        "Feature access denied"
    );

    AccessCheckResult::Denied {
        feature,
        effective_tier,
        required_tier,
        required_label: required_tier.label().to_string(),
        required_price: required_tier.price().to_string(),
        status: status_class,
    }
}

/// Resolved entitlements for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlements {
    /// Normalized stored tier, before status is applied
    pub stored_tier: SubscriptionTier,
    pub effective_tier: SubscriptionTier,
    pub status: StatusClass,
    pub payment_warning: bool,
    pub locked: bool,
    pub banner: AccountBanner,
    pub max_press_images: u32,
    pub features: Vec<Feature>,
}

impl Entitlements {
    /// Resolve everything an account page or request handler needs in one pass
    pub fn resolve(raw_tier: Option<&str>, status: Option<&str>) -> Self {
        let effective = effective_tier(raw_tier, status);
        let features = Feature::ALL
            .into_iter()
            .filter(|feature| effective >= feature.min_tier())
            .collect();

        Self {
            stored_tier: normalize_tier(raw_tier),
            effective_tier: effective,
            status: StatusClass::of(status),
            payment_warning: is_payment_warning(status),
            locked: is_locked(status),
            banner: AccountBanner::for_status(status),
            max_press_images: max_press_images(raw_tier, status),
            features,
        }
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUSES: [Option<&str>; 7] = [
        Some("active"),
        Some("trialing"),
        Some("past_due"),
        Some("canceled"),
        Some("incomplete"),
        Some("inactive"),
        None,
    ];

    #[test]
    fn test_normalize_tier_spellings() {
        assert_eq!(normalize_tier(Some("Tier II")), SubscriptionTier::Tier2);
        assert_eq!(normalize_tier(Some("  TIER2 ")), SubscriptionTier::Tier2);
        assert_eq!(normalize_tier(Some("2")), SubscriptionTier::Tier2);
        assert_eq!(normalize_tier(Some("tier iii")), SubscriptionTier::Tier3);
        assert_eq!(normalize_tier(Some("3")), SubscriptionTier::Tier3);
        assert_eq!(normalize_tier(Some("tier3")), SubscriptionTier::Tier3);
    }

    #[test]
    fn test_normalize_tier_falls_back_to_tier1() {
        for raw in [None, Some(""), Some("   "), Some("pro"), Some("tier 2"), Some("4")] {
            assert_eq!(normalize_tier(raw), SubscriptionTier::Tier1, "{:?}", raw);
        }
    }

    #[test]
    fn test_normalize_tier_is_idempotent() {
        for raw in ["Tier II", "tier3", "garbage", "", "3", " tier iii "] {
            let once = normalize_tier(Some(raw));
            let twice = normalize_tier(Some(once.to_string().as_str()));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_status_partition() {
        for status in STATUSES {
            let active = is_subscription_active(status);
            let locked = is_locked(status);
            let warning = is_payment_warning(status);

            if status == Some("past_due") {
                assert!(active && warning && !locked);
            } else {
                assert!(active != locked, "{:?}", status);
                assert!(!warning);
            }
        }
    }

    #[test]
    fn test_unknown_status_is_locked() {
        assert!(is_locked(Some("paused")));
        assert!(is_locked(Some("")));
        assert!(is_locked(Some("ACTIVE")));
        assert!(!is_subscription_active(Some("paused")));
    }

    #[test]
    fn test_lapsed_subscription_drops_to_tier1() {
        assert_eq!(
            effective_tier(Some("tier3"), Some("canceled")),
            SubscriptionTier::Tier1
        );
        for status in STATUSES.into_iter().filter(|s| !is_subscription_active(*s)) {
            for raw in ["tier1", "tier2", "tier3", "Tier III"] {
                assert_eq!(effective_tier(Some(raw), status), SubscriptionTier::Tier1);
            }
        }
    }

    #[test]
    fn test_has_feature_is_monotonic_in_tier() {
        for feature in Feature::ALL {
            let levels: Vec<bool> = ["tier1", "tier2", "tier3"]
                .iter()
                .map(|raw| has_feature(Some(*raw), Some("active"), feature))
                .collect();
            for pair in levels.windows(2) {
                assert!(!pair[0] || pair[1], "{} not monotonic", feature);
            }
        }
    }

    #[test]
    fn test_concrete_feature_decisions() {
        assert!(!has_feature(Some("tier2"), Some("active"), Feature::DedicatedAr));
        assert!(has_feature(Some("tier2"), Some("active"), Feature::Analytics));
        assert!(has_feature(Some("tier1"), Some("active"), Feature::PdfDownload));
        assert!(has_feature(Some("tier3"), Some("trialing"), Feature::Support247));
    }

    #[test]
    fn test_ungated_always_allows() {
        assert!(has_feature(None, None, FeatureGate::Ungated));
        assert!(has_feature(Some("tier1"), Some("canceled"), None::<Feature>));
    }

    #[test]
    fn test_max_press_images() {
        assert_eq!(max_press_images(Some("tier3"), Some("past_due")), 10);
        assert_eq!(max_press_images(Some("tier2"), Some("active")), 10);
        assert_eq!(max_press_images(Some("tier1"), Some("active")), 3);
        assert_eq!(max_press_images(Some("tier3"), Some("canceled")), 3);
        assert_eq!(max_press_images(None, None), 3);
    }

    #[test]
    fn test_check_feature_denial_details() {
        let result = check_feature(Some("tier2"), Some("active"), Feature::PdfPremium);
        assert!(!result.is_allowed());
        assert_eq!(result.required_tier(), Some(SubscriptionTier::Tier3));
        match result {
            AccessCheckResult::Denied {
                required_label,
                required_price,
                effective_tier,
                ..
            } => {
                assert_eq!(required_label, "Tier III");
                assert_eq!(required_price, "$139/mo");
                assert_eq!(effective_tier, SubscriptionTier::Tier2);
            }
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[test]
    fn test_check_feature_agrees_with_has_feature() {
        for status in STATUSES {
            for raw in ["tier1", "tier2", "tier3"] {
                for feature in Feature::ALL {
                    assert_eq!(
                        check_feature(Some(raw), status, feature).is_allowed(),
                        has_feature(Some(raw), status, feature)
                    );
                }
            }
        }
    }

    #[test]
    fn test_resolve_past_due_tier3() {
        let resolved = Entitlements::resolve(Some("Tier III"), Some("past_due"));
        assert_eq!(resolved.stored_tier, SubscriptionTier::Tier3);
        assert_eq!(resolved.effective_tier, SubscriptionTier::Tier3);
        assert!(resolved.payment_warning);
        assert!(!resolved.locked);
        assert_eq!(resolved.banner, AccountBanner::PaymentWarning);
        assert_eq!(resolved.features.len(), Feature::ALL.len());
    }

    #[test]
    fn test_resolve_canceled_keeps_stored_tier() {
        let resolved = Entitlements::resolve(Some("tier3"), Some("canceled"));
        assert_eq!(resolved.stored_tier, SubscriptionTier::Tier3);
        assert_eq!(resolved.effective_tier, SubscriptionTier::Tier1);
        assert!(resolved.locked);
        assert_eq!(resolved.features, vec![Feature::PdfDownload]);
        assert!(!resolved.has(Feature::Analytics));
        assert_eq!(resolved.max_press_images, 3);
    }
}
