//! Stripe webhook event envelope and the payload objects we reconcile.
//!
//! Only fields relevant to reconciliation are captured. Everything else in
//! Stripe's schema is ignored on deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }

    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_str(&self.event_type)
    }
}

/// Event types that drive reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    /// Checkout session completed successfully.
    CheckoutSessionCompleted,
    /// Customer subscription was deleted (cancelled).
    CustomerSubscriptionDeleted,
    /// Any other event type. Acknowledged and ignored.
    Unknown,
}

impl StripeEventType {
    /// Parse event type from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.deleted" => Self::CustomerSubscriptionDeleted,
            _ => Self::Unknown,
        }
    }

    /// Convert to the Stripe event type string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::CustomerSubscriptionDeleted => "customer.subscription.deleted",
            Self::Unknown => "unknown",
        }
    }
}

/// `data.object` of a `checkout.session.completed` event.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutSessionObject {
    /// Checkout session ID (cs_xxx).
    pub id: String,

    /// Subscription created by the session (sub_xxx).
    #[serde(default)]
    pub subscription: Option<String>,

    /// Customer ID (cus_xxx).
    #[serde(default)]
    pub customer: Option<String>,

    /// Email passed when the session was created.
    #[serde(default)]
    pub customer_email: Option<String>,

    /// Details the customer entered at checkout.
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,

    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// Email from the entered customer details, falling back to the prefilled one.
    pub fn email(&self) -> Option<String> {
        self.customer_details
            .as_ref()
            .and_then(|d| d.email.clone())
            .or_else(|| self.customer_email.clone())
            .filter(|e| !e.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: HashMap<String, String>,
}

/// `data.object` of a `customer.subscription.*` event.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionObject {
    /// Subscription ID (sub_xxx).
    pub id: String,

    #[serde(default)]
    pub customer: Option<String>,

    #[serde(default)]
    pub status: Option<String>,
}

/// Treats a `null` metadata map the same as an absent one.
pub(crate) fn metadata_or_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
