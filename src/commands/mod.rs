//! Entry points called by request handlers
//!
//! Handlers authenticate the caller, then call into these to throttle
//! the request and check the caller's subscription.

mod access;
mod billing;

pub use access::{guard_request, GuardOutcome};
pub use billing::{
    account_banner, can_add_press_image, check_feature_access, get_subscription_info,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::billing::UnknownFeature;

/// Authenticated caller with the subscription fields from their user record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: String,
    pub email: Option<String>,
    /// Stored tier, as written by the billing webhook
    pub subscription_tier: Option<String>,
    pub subscription_status: Option<String>,
}

impl Caller {
    pub fn tier(&self) -> Option<&str> {
        self.subscription_tier.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.subscription_status.as_deref()
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error(transparent)]
    UnknownFeature(#[from] UnknownFeature),
}
