//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (reconciliation, checkout) are kept apart from the
//! entitlement query handler.

pub mod handlers;

pub use handlers::{
    CheckEntitlementHandler, CheckEntitlementQuery, CheckoutSettings, CreateCheckoutCommand,
    CreateCheckoutHandler, ReconcileBillingEventCommand, ReconcileBillingEventHandler,
    ReconcileBillingEventResult, ReconcileTimeouts,
};
