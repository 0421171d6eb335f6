//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port for Stripe:
//! - Subscription retrieval for reconciliation
//! - Subscription-mode checkout sessions
//!
//! Webhook signature verification lives in the domain
//! (`crate::domain::subscription::webhook_verifier`) since it needs no I/O.
//!
//! # Security
//!
//! - The secret API key is held as `secrecy::SecretString` and redacted from `Debug`

mod api_types;
mod mock_billing_provider;
mod stripe_adapter;

pub use api_types::{StripeCheckoutSession, StripeSubscription};
pub use mock_billing_provider::{MethodCall, MockBillingProvider};
pub use stripe_adapter::{StripeBillingClient, StripeConfig};
