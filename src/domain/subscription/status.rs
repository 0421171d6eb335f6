//! Subscription status as persisted and as reported by the billing provider.

use serde::{Deserialize, Serialize};

/// Stored subscription status.
///
/// Only `Active` grants entitlement. The remaining provider statuses are kept
/// so a completion event for a non-active subscription is recorded faithfully
/// instead of being coerced to active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    PastDue,
    Trialing,
    Incomplete,
    IncompleteExpired,
    Unpaid,
    Paused,
}

impl SubscriptionStatus {
    /// Column value used in the `subscriptions.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::PastDue => "past_due",
            Self::Trialing => "trialing",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
        }
    }

    /// Parses a stored column value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "cancelled" => Some(Self::Cancelled),
            "past_due" => Some(Self::PastDue),
            "trialing" => Some(Self::Trialing),
            "incomplete" => Some(Self::Incomplete),
            "incomplete_expired" => Some(Self::IncompleteExpired),
            "unpaid" => Some(Self::Unpaid),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }

    /// Maps the provider's status string (Stripe spells it `canceled`).
    ///
    /// Unrecognised values fall back to `Incomplete`, which never entitles.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "canceled" | "cancelled" => Self::Cancelled,
            other => Self::parse(other).unwrap_or(Self::Incomplete),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
