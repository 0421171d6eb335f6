//! In-memory adapters for tests and database-free local runs.

mod subscription_store;

pub use subscription_store::InMemorySubscriptionStore;
