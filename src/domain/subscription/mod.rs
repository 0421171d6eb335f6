//! Subscription domain: linking billing-provider subscriptions to wallets.
//!
//! Pure types and policies. Persistence and provider access live behind the
//! ports in `crate::ports`.

mod billing_period;
mod entitlement;
mod errors;
mod record;
mod status;
pub mod stripe_event;
mod wallet_resolver;
pub mod webhook_verifier;

pub use billing_period::{resolve_period_end, PeriodEndSource, FALLBACK_PERIOD_DAYS};
pub use entitlement::Entitlement;
pub use errors::{SubscriptionError, VerificationError};
pub use record::{NewSubscription, Subscription, WalletLink};
pub use status::SubscriptionStatus;
pub use stripe_event::{
    CheckoutSessionObject, CustomerDetails, StripeEvent, StripeEventType, SubscriptionObject,
};
pub use wallet_resolver::{
    resolve_wallet, InvalidWallet, ResolvedWallet, WalletSource, WALLET_METADATA_KEY,
};
pub use webhook_verifier::{StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS};
