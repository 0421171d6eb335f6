//! HTTP adapter for subscription endpoints.
//!
//! - `POST /webhook` - Stripe webhook deliveries
//! - `GET /api/subscription-status/:wallet_address` - Entitlement for a wallet
//! - `POST /create-checkout-session` - Start a subscription checkout

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{SubscriptionApiError, SubscriptionAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::subscription_routes;
