//! Per-tier asset limits
//!
//! Press image caps are kept in one table per source. The enforced table
//! is what uploads are checked against. The advertised table is what the
//! pricing grid shows customers. They currently disagree on Tier II and
//! are deliberately not merged until product confirms the right number.

use serde::{Deserialize, Serialize};

use super::types::SubscriptionTier;

/// Maximum press images per effective tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressImageLimits {
    pub tier1: u32,
    pub tier2: u32,
    pub tier3: u32,
}

/// Limits enforced on upload
pub const ENFORCED_PRESS_IMAGES: PressImageLimits = PressImageLimits {
    tier1: 3,
    tier2: 10,
    tier3: 10,
};

/// Limits shown on the pricing/feature comparison grid
pub const ADVERTISED_PRESS_IMAGES: PressImageLimits = PressImageLimits {
    tier1: 3,
    tier2: 5,
    tier3: 10,
};

/// A tier whose enforced and advertised limits disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitDiscrepancy {
    pub tier: SubscriptionTier,
    pub enforced: u32,
    pub advertised: u32,
}

impl PressImageLimits {
    /// Get the limit for a tier
    pub fn for_tier(&self, tier: SubscriptionTier) -> u32 {
        match tier {
            SubscriptionTier::Tier1 => self.tier1,
            SubscriptionTier::Tier2 => self.tier2,
            SubscriptionTier::Tier3 => self.tier3,
        }
    }

    /// Tiers where the enforced table and the advertised table differ
    pub fn discrepancies() -> Vec<LimitDiscrepancy> {
        SubscriptionTier::ALL
            .into_iter()
            .filter_map(|tier| {
                let enforced = ENFORCED_PRESS_IMAGES.for_tier(tier);
                let advertised = ADVERTISED_PRESS_IMAGES.for_tier(tier);
                (enforced != advertised).then_some(LimitDiscrepancy {
                    tier,
                    enforced,
                    advertised,
                })
            })
            .collect()
    }
}

impl Default for PressImageLimits {
    fn default() -> Self {
        ENFORCED_PRESS_IMAGES
    }
}
