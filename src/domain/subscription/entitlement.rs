//! Read-time entitlement policy.

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::Subscription;

/// Answer to "does this wallet currently have a subscription".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Entitlement {
    Entitled {
        expires_at: Timestamp,
        customer_email: Option<String>,
    },
    Expired,
    None,
}

impl Entitlement {
    /// Evaluates the latest active-status subscription against the clock.
    ///
    /// The stored status is not trusted alone: an `active` row whose period
    /// end has passed (or was never recorded) is reported expired.
    pub fn evaluate(subscription: Option<&Subscription>, now: &Timestamp) -> Self {
        let Some(subscription) = subscription else {
            return Entitlement::None;
        };
        if !subscription.status.is_active() {
            return Entitlement::None;
        }
        match subscription.current_period_end {
            Some(end) if end.is_after(now) => Entitlement::Entitled {
                expires_at: end,
                customer_email: subscription.customer_email.clone(),
            },
            _ => Entitlement::Expired,
        }
    }

    pub fn is_entitled(&self) -> bool {
        matches!(self, Entitlement::Entitled { .. })
    }

    /// Wire label: `active`, `expired` or `none`.
    pub fn status_label(&self) -> &'static str {
        match self {
            Entitlement::Entitled { .. } => "active",
            Entitlement::Expired => "expired",
            Entitlement::None => "none",
        }
    }
}
