//! Adapters - Implementations of port interfaces.
//!
//! - `http` - Axum routes for webhooks, status queries and checkout
//! - `memory` - In-memory subscription store
//! - `postgres` - PostgreSQL subscription store
//! - `stripe` - Stripe billing provider client and mock

pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use memory::InMemorySubscriptionStore;
pub use postgres::PostgresSubscriptionStore;
pub use stripe::{MockBillingProvider, StripeBillingClient, StripeConfig};
