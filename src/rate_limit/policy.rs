//! Named rate limit policies for throttled actions
//!
//! Call sites share one limiter but each action carries its own
//! allowance, window and key shape. Keys are built as
//! `prefix[:user][:origin]`, with only the parts the action's
//! `KeyScope` names.

use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Allowance per fixed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    /// 10 requests per hour
    pub const DEFAULT: RateLimitPolicy = RateLimitPolicy::new(10, HOUR);

    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which caller identifiers make up an action's bucket key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// Per account, whatever address the request comes from
    User,
    /// Per request address, shared by anonymous and signed-in callers
    Origin,
    UserAndOrigin,
}

impl KeyScope {
    pub fn uses_user(&self) -> bool {
        matches!(self, Self::User | Self::UserAndOrigin)
    }

    pub fn uses_origin(&self) -> bool {
        matches!(self, Self::Origin | Self::UserAndOrigin)
    }
}

/// Throttled actions and their policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitedAction {
    /// Public contact form, keyed by origin
    Contact,
    /// Onboarding intake chat (AI)
    IntakeChat,
    /// Public chat assistant (AI), per minute
    ChatAssistant,
    /// Public chat assistant (AI), per hour
    ChatAssistantHourly,
    StripeCheckout,
    /// AI press kit generation
    EpkGenerate,
    EpkPdf,
    PdfExport,
    PdfRegenerate,
    WelcomeEmail,
    EpkUpdatedEmail,
    AdminApplicationEmail,
    TestEmail,
    EpkPublishedEmail,
    FirstImageEmail,
    ReengagementEmail,
    EpkGuideEmail,
    UpgradeDay7Email,
    ProfileReminderEmail,
    UpgradeLimitEmail,
}

impl RateLimitedAction {
    /// Key prefix identifying the action
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::IntakeChat => "intake-chat",
            Self::ChatAssistant => "chat-assistant",
            Self::ChatAssistantHourly => "chat-assistant-hourly",
            Self::StripeCheckout => "stripe:checkout",
            Self::EpkGenerate => "epk:generate",
            Self::EpkPdf => "epk:pdf",
            Self::PdfExport => "pdf-epk",
            Self::PdfRegenerate => "pdf-regen",
            Self::WelcomeEmail => "email:welcome",
            Self::EpkUpdatedEmail => "email:epk",
            Self::AdminApplicationEmail => "email:admin-application",
            Self::TestEmail => "email:test",
            Self::EpkPublishedEmail => "email:epk-published",
            Self::FirstImageEmail => "email:first-image",
            Self::ReengagementEmail => "email:reengagement",
            Self::EpkGuideEmail => "email:epk-guide",
            Self::UpgradeDay7Email => "email:upgrade-day7",
            Self::ProfileReminderEmail => "email:profile-reminder",
            Self::UpgradeLimitEmail => "email:upgrade-limit",
        }
    }

    /// Allowance for the action
    pub fn policy(&self) -> RateLimitPolicy {
        match self {
            Self::Contact => RateLimitPolicy::new(5, MINUTE),
            Self::IntakeChat | Self::ChatAssistant => RateLimitPolicy::new(30, MINUTE),
            Self::ChatAssistantHourly => RateLimitPolicy::new(100, HOUR),
            // Unconfirmed: the handler passes 86400 as milliseconds (86.4 s).
            // One day is assumed until product confirms.
            Self::EpkGenerate => RateLimitPolicy::new(5, DAY),
            // Unconfirmed: the handler passes 3600 as milliseconds (3.6 s).
            // One hour is assumed, matching the PDF export route.
            Self::EpkPdf => RateLimitPolicy::new(10, HOUR),
            Self::PdfExport => RateLimitPolicy::new(10, HOUR),
            Self::PdfRegenerate => RateLimitPolicy::new(3, HOUR),
            Self::EpkPublishedEmail => RateLimitPolicy::new(1, DAY),
            Self::FirstImageEmail => RateLimitPolicy::new(1, DAY * 365),
            Self::ReengagementEmail => RateLimitPolicy::new(1, DAY * 14),
            Self::EpkGuideEmail | Self::UpgradeDay7Email => RateLimitPolicy::new(1, DAY * 7),
            Self::ProfileReminderEmail => RateLimitPolicy::new(1, DAY * 3),
            Self::UpgradeLimitEmail => RateLimitPolicy::new(2, DAY),
            Self::StripeCheckout
            | Self::WelcomeEmail
            | Self::EpkUpdatedEmail
            | Self::AdminApplicationEmail
            | Self::TestEmail => RateLimitPolicy::DEFAULT,
        }
    }

    /// Identifiers that make up this action's bucket key
    pub fn key_scope(&self) -> KeyScope {
        match self {
            Self::Contact | Self::ChatAssistant | Self::ChatAssistantHourly | Self::TestEmail => {
                KeyScope::Origin
            }
            Self::EpkPublishedEmail
            | Self::FirstImageEmail
            | Self::ReengagementEmail
            | Self::EpkGuideEmail
            | Self::UpgradeDay7Email
            | Self::ProfileReminderEmail
            | Self::UpgradeLimitEmail => KeyScope::User,
            Self::IntakeChat
            | Self::StripeCheckout
            | Self::EpkGenerate
            | Self::EpkPdf
            | Self::PdfExport
            | Self::PdfRegenerate
            | Self::WelcomeEmail
            | Self::EpkUpdatedEmail
            | Self::AdminApplicationEmail => KeyScope::UserAndOrigin,
        }
    }

    /// Build the bucket key from the parts in this action's scope
    ///
    /// Parts outside the scope are ignored even when given.
    pub fn key(&self, user_id: Option<&str>, origin: Option<&str>) -> String {
        let scope = self.key_scope();
        let user_id = user_id.filter(|_| scope.uses_user());
        let origin = origin.filter(|_| scope.uses_origin());

        let mut key = self.prefix().to_string();
        for part in [user_id, origin].into_iter().flatten() {
            key.push(':');
            key.push_str(part);
        }
        key
    }
}
