//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionStore` - Subscriptions and their wallet links

mod subscription_store;

pub use subscription_store::PostgresSubscriptionStore;
