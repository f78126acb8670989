//! Billing data types

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Subscription tier
///
/// Variants are declared lowest first so the derived ordering matches
/// the tier levels: `Tier1 < Tier2 < Tier3`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Tier1,
    Tier2,
    Tier3,
}

impl SubscriptionTier {
    /// All tiers, lowest first
    pub const ALL: [SubscriptionTier; 3] = [Self::Tier1, Self::Tier2, Self::Tier3];

    /// Numeric level used for minimum-tier comparisons (1-3)
    pub fn level(&self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    /// Label shown on upgrade prompts and pricing tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tier1 => "Tier I",
            Self::Tier2 => "Tier II",
            Self::Tier3 => "Tier III",
        }
    }

    /// Monthly list price
    pub fn price(&self) -> &'static str {
        match self {
            Self::Tier1 => "$39/mo",
            Self::Tier2 => "$89/mo",
            Self::Tier3 => "$139/mo",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tier1 => write!(f, "tier1"),
            Self::Tier2 => write!(f, "tier2"),
            Self::Tier3 => write!(f, "tier3"),
        }
    }
}

/// Subscription status as stored by the payment provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
    Inactive,
}

impl SubscriptionStatus {
    /// Parse a stored status string. Matching is exact; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "trialing" => Some(Self::Trialing),
            "past_due" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            "incomplete" => Some(Self::Incomplete),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way access classification of a subscription status
///
/// `Grace` grants access like `Active` but surfaces a payment warning.
/// Missing and unrecognized statuses are `Locked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusClass {
    Active,
    Grace,
    Locked,
}

impl StatusClass {
    /// Classify a raw status string
    pub fn of(status: Option<&str>) -> Self {
        match status.and_then(SubscriptionStatus::parse) {
            Some(SubscriptionStatus::Active) | Some(SubscriptionStatus::Trialing) => Self::Active,
            Some(SubscriptionStatus::PastDue) => Self::Grace,
            Some(SubscriptionStatus::Canceled)
            | Some(SubscriptionStatus::Incomplete)
            | Some(SubscriptionStatus::Inactive)
            | None => Self::Locked,
        }
    }

    /// Whether this class grants the stored tier
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Active | Self::Grace)
    }
}

/// A capability gated behind a minimum tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// All tiers; quality varies by tier
    PdfDownload,
    /// Up to 10 press images
    PressImagesExtended,
    PriorityReview,
    StrategyCall,
    ArFeedback,
    Analytics,
    DedicatedAr,
    LabelShowcases,
    CustomCampaign,
    /// Branded PDF export
    PdfPremium,
    #[serde(rename = "support_247")]
    Support247,
}

impl Feature {
    pub const ALL: [Feature; 11] = [
        Self::PdfDownload,
        Self::PressImagesExtended,
        Self::PriorityReview,
        Self::StrategyCall,
        Self::ArFeedback,
        Self::Analytics,
        Self::DedicatedAr,
        Self::LabelShowcases,
        Self::CustomCampaign,
        Self::PdfPremium,
        Self::Support247,
    ];

    /// Minimum tier required for this feature.
    ///
    /// This is the only feature-to-tier mapping in the crate; required
    /// levels, labels and prices for upgrade prompts all derive from it.
    pub fn min_tier(&self) -> SubscriptionTier {
        match self {
            Self::PdfDownload => SubscriptionTier::Tier1,
            Self::PressImagesExtended
            | Self::PriorityReview
            | Self::StrategyCall
            | Self::ArFeedback
            | Self::Analytics => SubscriptionTier::Tier2,
            Self::DedicatedAr
            | Self::LabelShowcases
            | Self::CustomCampaign
            | Self::PdfPremium
            | Self::Support247 => SubscriptionTier::Tier3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfDownload => "pdf_download",
            Self::PressImagesExtended => "press_images_extended",
            Self::PriorityReview => "priority_review",
            Self::StrategyCall => "strategy_call",
            Self::ArFeedback => "ar_feedback",
            Self::Analytics => "analytics",
            Self::DedicatedAr => "dedicated_ar",
            Self::LabelShowcases => "label_showcases",
            Self::CustomCampaign => "custom_campaign",
            Self::PdfPremium => "pdf_premium",
            Self::Support247 => "support_247",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a feature name is not one of the known features
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/// What a caller asks to be checked against
///
/// `Ungated` is an explicit "no gating requested" and always grants
/// access, unlike every other path through the resolver which fails closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureGate {
    Ungated,
    Feature(Feature),
}

impl From<Feature> for FeatureGate {
    fn from(feature: Feature) -> Self {
        Self::Feature(feature)
    }
}

impl From<Option<Feature>> for FeatureGate {
    fn from(feature: Option<Feature>) -> Self {
        match feature {
            Some(feature) => Self::Feature(feature),
            None => Self::Ungated,
        }
    }
}

/// Result of a feature access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccessCheckResult {
    #[serde(rename = "allowed", rename_all = "camelCase")]
    Allowed { effective_tier: SubscriptionTier },
    #[serde(rename = "denied", rename_all = "camelCase")]
    Denied {
        feature: Feature,
        effective_tier: SubscriptionTier,
        required_tier: SubscriptionTier,
        required_label: String,
        required_price: String,
        status: StatusClass,
    },
}

impl AccessCheckResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Tier the caller would need, if denied
    pub fn required_tier(&self) -> Option<SubscriptionTier> {
        match self {
            Self::Denied { required_tier, .. } => Some(*required_tier),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccessCheckResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed { effective_tier } => write!(f, "Allowed on {}", effective_tier),
            Self::Denied {
                feature,
                required_label,
                required_price,
                status,
                ..
            } => {
                if *status == StatusClass::Locked {
                    write!(f, "Subscription inactive; {} requires {}", feature, required_label)
                } else {
                    write!(
                        f,
                        "{} requires {} ({})",
                        feature, required_label, required_price
                    )
                }
            }
        }
    }
}

/// Account status banner for billing UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountBanner {
    None,
    /// Payment past due; features still granted during the grace period
    PaymentWarning,
    /// Subscription lapsed; features locked to tier1
    Locked,
}

impl AccountBanner {
    pub fn for_status(status: Option<&str>) -> Self {
        match StatusClass::of(status) {
            StatusClass::Active => Self::None,
            StatusClass::Grace => Self::PaymentWarning,
            StatusClass::Locked => Self::Locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering_matches_levels() {
        assert!(SubscriptionTier::Tier1 < SubscriptionTier::Tier2);
        assert!(SubscriptionTier::Tier2 < SubscriptionTier::Tier3);
        for pair in SubscriptionTier::ALL.windows(2) {
            assert!(pair[0].level() < pair[1].level());
        }
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SubscriptionTier::Tier2).unwrap(),
            "\"tier2\""
        );
        assert_eq!(SubscriptionTier::Tier3.to_string(), "tier3");
    }

    #[test]
    fn test_status_parse_is_exact() {
        assert_eq!(
            SubscriptionStatus::parse("past_due"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(SubscriptionStatus::parse("Active"), None);
        assert_eq!(SubscriptionStatus::parse(" active"), None);
        assert_eq!(SubscriptionStatus::parse(""), None);
    }

    #[test]
    fn test_status_class() {
        assert_eq!(StatusClass::of(Some("active")), StatusClass::Active);
        assert_eq!(StatusClass::of(Some("trialing")), StatusClass::Active);
        assert_eq!(StatusClass::of(Some("past_due")), StatusClass::Grace);
        assert_eq!(StatusClass::of(Some("canceled")), StatusClass::Locked);
        assert_eq!(StatusClass::of(Some("paused")), StatusClass::Locked);
        assert_eq!(StatusClass::of(None), StatusClass::Locked);
    }

    #[test]
    fn test_feature_names_roundtrip_through_serde() {
        for feature in Feature::ALL {
            let json = serde_json::to_string(&feature).unwrap();
            assert_eq!(json, format!("\"{}\"", feature.as_str()));
            assert_eq!(feature.as_str().parse::<Feature>(), Ok(feature));
        }
    }

    #[test]
    fn test_unknown_feature_name() {
        let err = "teleport".parse::<Feature>().unwrap_err();
        assert_eq!(err.to_string(), "unknown feature: teleport");
    }

    #[test]
    fn test_gate_from_option() {
        assert_eq!(FeatureGate::from(None), FeatureGate::Ungated);
        assert_eq!(
            FeatureGate::from(Some(Feature::Analytics)),
            FeatureGate::Feature(Feature::Analytics)
        );
    }

    #[test]
    fn test_denied_result_wire_format() {
        let result = AccessCheckResult::Denied {
            feature: Feature::DedicatedAr,
            effective_tier: SubscriptionTier::Tier2,
            required_tier: SubscriptionTier::Tier3,
            required_label: "Tier III".to_string(),
            required_price: "$139/mo".to_string(),
            status: StatusClass::Active,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "denied");
        assert_eq!(value["feature"], "dedicated_ar");
        assert_eq!(value["requiredTier"], "tier3");
        assert_eq!(value["requiredPrice"], "$139/mo");
        assert_eq!(result.to_string(), "dedicated_ar requires Tier III ($139/mo)");
    }

    #[test]
    fn test_account_banner() {
        assert_eq!(AccountBanner::for_status(Some("active")), AccountBanner::None);
        assert_eq!(
            AccountBanner::for_status(Some("past_due")),
            AccountBanner::PaymentWarning
        );
        assert_eq!(AccountBanner::for_status(None), AccountBanner::Locked);
    }
}
