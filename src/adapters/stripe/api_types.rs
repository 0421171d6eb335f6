//! Stripe REST API response types.
//!
//! Only the fields needed for reconciliation and checkout are captured.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::subscription::stripe_event::metadata_or_empty;
use crate::domain::subscription::SubscriptionStatus;
use crate::ports::ProviderSubscription;

/// Stripe Subscription object as returned by `GET /v1/subscriptions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer ID owning this subscription.
    #[serde(default)]
    pub customer: Option<String>,

    /// Subscription status.
    pub status: String,

    /// Current period end (Unix timestamp). Newer API versions moved this onto items.
    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: HashMap<String, String>,

    /// Subscription items (price/quantity pairs).
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

/// Subscription items container.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

/// Single subscription item.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub id: String,

    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl StripeSubscription {
    /// Period end from the subscription, falling back to its first item.
    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end
            .or_else(|| self.items.data.first().and_then(|i| i.current_period_end))
    }
}

impl From<StripeSubscription> for ProviderSubscription {
    fn from(sub: StripeSubscription) -> Self {
        let current_period_end = sub.period_end();
        ProviderSubscription {
            status: SubscriptionStatus::from_provider(&sub.status),
            id: sub.id,
            customer_id: sub.customer,
            current_period_end,
            metadata: sub.metadata,
        }
    }
}

/// Stripe Checkout Session as returned by `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    /// Session ID (cs_...).
    pub id: String,

    /// Hosted checkout page.
    #[serde(default)]
    pub url: Option<String>,
}

/// Error envelope Stripe returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}
