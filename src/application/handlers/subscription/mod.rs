//! Subscription handlers: webhook reconciliation, entitlement queries, checkout.

mod check_entitlement;
mod create_checkout;
mod reconcile_billing_event;

pub use check_entitlement::{CheckEntitlementHandler, CheckEntitlementQuery};
pub use create_checkout::{CheckoutSettings, CreateCheckoutCommand, CreateCheckoutHandler};
pub use reconcile_billing_event::{
    ReconcileBillingEventCommand, ReconcileBillingEventHandler, ReconcileBillingEventResult,
    ReconcileTimeouts,
};
