//! Commands for subscription status and feature access

use crate::billing::{
    check_feature, max_press_images, AccessCheckResult, AccountBanner, Entitlements, Feature,
    FeatureGate,
};

use super::{Caller, CommandError};

/// Get full entitlement info for the account page
pub fn get_subscription_info(caller: &Caller) -> Entitlements {
    Entitlements::resolve(caller.tier(), caller.status())
}

/// Check a feature by name; `None` means no gating was requested
pub fn check_feature_access(
    caller: &Caller,
    feature: Option<&str>,
) -> Result<AccessCheckResult, CommandError> {
    let gate = match feature {
        Some(name) => FeatureGate::Feature(name.parse::<Feature>()?),
        None => FeatureGate::Ungated,
    };
    Ok(check_feature(caller.tier(), caller.status(), gate))
}

/// Which billing banner to show
pub fn account_banner(caller: &Caller) -> AccountBanner {
    AccountBanner::for_status(caller.status())
}

/// Whether one more press image fits under the caller's limit
pub fn can_add_press_image(caller: &Caller, current_count: u32) -> bool {
    current_count < max_press_images(caller.tier(), caller.status())
}
