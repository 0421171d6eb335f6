//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionStore` - Subscription and wallet link persistence
//! - `BillingProvider` - Subscription lookup and checkout creation

mod billing_provider;
mod subscription_store;

pub use billing_provider::{
    BillingError, BillingErrorCode, BillingProvider, CheckoutRequest, CheckoutSession,
    ProviderSubscription,
};
pub use subscription_store::{CancelOutcome, CreateResult, StoreError, SubscriptionStore};
