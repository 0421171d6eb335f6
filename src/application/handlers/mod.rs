//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod subscription;

pub use subscription::{
    CheckEntitlementHandler, CheckEntitlementQuery, CheckoutSettings, CreateCheckoutCommand,
    CreateCheckoutHandler, ReconcileBillingEventCommand, ReconcileBillingEventHandler,
    ReconcileBillingEventResult, ReconcileTimeouts,
};
