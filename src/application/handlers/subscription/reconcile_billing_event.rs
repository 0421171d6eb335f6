//! ReconcileBillingEventHandler - drives subscription state from billing webhooks.
//!
//! | Current state | Event                          | Action                        |
//! |---------------|--------------------------------|-------------------------------|
//! | none          | checkout.session.completed     | resolve wallet, create + link |
//! | any           | checkout.session.completed (again) | no-op, existing id returned |
//! | active        | customer.subscription.deleted  | mark cancelled                |
//! | cancelled     | customer.subscription.deleted  | no-op                         |
//! | none          | customer.subscription.deleted  | no-op (logged)                |
//!
//! Any failure aborts before the store is written and is returned so the HTTP
//! layer answers non-2xx and the provider redelivers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::domain::foundation::{SubscriptionId, Timestamp, WalletAddress};
use crate::domain::subscription::{
    resolve_period_end, resolve_wallet, CheckoutSessionObject, NewSubscription, PeriodEndSource,
    StripeEvent, StripeEventType, StripeWebhookVerifier, SubscriptionError, SubscriptionObject,
    VerificationError,
};
use crate::ports::{BillingProvider, CancelOutcome, CreateResult, SubscriptionStore};

/// Command carrying an unverified webhook delivery.
#[derive(Debug, Clone)]
pub struct ReconcileBillingEventCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value, if present.
    pub signature: Option<String>,
}

/// Result of reconciling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileBillingEventResult {
    /// Subscription and primary wallet link were written.
    SubscriptionCreated {
        subscription_id: SubscriptionId,
        stripe_subscription_id: String,
        wallet_address: WalletAddress,
    },
    /// Redelivered completion for a subscription already stored.
    AlreadyReconciled {
        subscription_id: SubscriptionId,
        stripe_subscription_id: String,
    },
    /// Stored subscription now reads `cancelled`.
    SubscriptionCancelled { stripe_subscription_id: String },
    /// Cancellation for a subscription we never stored.
    UnknownSubscription { stripe_subscription_id: String },
    /// Event acknowledged without action.
    Ignored { event_type: String },
}

/// Upper bounds on awaited external calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileTimeouts {
    pub provider: Duration,
    pub store: Duration,
}

impl Default for ReconcileTimeouts {
    fn default() -> Self {
        Self {
            provider: Duration::from_secs(10),
            store: Duration::from_secs(5),
        }
    }
}

/// Awaits `fut` for at most `limit`, classifying both failure kinds.
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, SubscriptionError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<SubscriptionError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(SubscriptionError::timeout(operation)),
    }
}

/// Handler reconciling verified billing events into the subscription store.
pub struct ReconcileBillingEventHandler {
    verifier: Arc<StripeWebhookVerifier>,
    store: Arc<dyn SubscriptionStore>,
    billing: Arc<dyn BillingProvider>,
    timeouts: ReconcileTimeouts,
}

impl ReconcileBillingEventHandler {
    pub fn new(
        verifier: Arc<StripeWebhookVerifier>,
        store: Arc<dyn SubscriptionStore>,
        billing: Arc<dyn BillingProvider>,
    ) -> Self {
        Self {
            verifier,
            store,
            billing,
            timeouts: ReconcileTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ReconcileTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Verifies the delivery, then reconciles it.
    pub async fn handle(
        &self,
        cmd: ReconcileBillingEventCommand,
    ) -> Result<ReconcileBillingEventResult, SubscriptionError> {
        let signature = cmd.signature.as_deref().ok_or_else(|| {
            tracing::warn!("Webhook rejected: missing Stripe-Signature header");
            SubscriptionError::from(VerificationError::MissingHeader)
        })?;

        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, signature)
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook rejected during verification");
                SubscriptionError::from(e)
            })?;

        self.reconcile(event).await
    }

    /// Applies an already-verified event.
    pub async fn reconcile(
        &self,
        event: StripeEvent,
    ) -> Result<ReconcileBillingEventResult, SubscriptionError> {
        let span = tracing::info_span!(
            "reconcile_billing_event",
            event_id = %event.id,
            event_type = %event.event_type,
        );

        async {
            match event.parsed_type() {
                StripeEventType::CheckoutSessionCompleted => {
                    self.handle_checkout_completed(&event).await
                }
                StripeEventType::CustomerSubscriptionDeleted => {
                    self.handle_subscription_deleted(&event).await
                }
                StripeEventType::Unknown => {
                    tracing::debug!("Ignoring unhandled event type");
                    Ok(ReconcileBillingEventResult::Ignored {
                        event_type: event.event_type.clone(),
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn handle_checkout_completed(
        &self,
        event: &StripeEvent,
    ) -> Result<ReconcileBillingEventResult, SubscriptionError> {
        let session: CheckoutSessionObject = event.deserialize_object().map_err(|e| {
            SubscriptionError::malformed(format!("Invalid checkout session object: {}", e))
        })?;

        let Some(stripe_subscription_id) = session.subscription.clone() else {
            tracing::warn!(
                session_id = %session.id,
                "Checkout session has no subscription, ignoring"
            );
            return Ok(ReconcileBillingEventResult::Ignored {
                event_type: event.event_type.clone(),
            });
        };

        let provider_sub = bounded(
            self.timeouts.provider,
            "retrieve_subscription",
            self.billing.retrieve_subscription(&stripe_subscription_id),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                subscription_id = %stripe_subscription_id,
                error = %e,
                "Failed to retrieve subscription from billing provider"
            );
            e
        })?;

        let resolved = resolve_wallet(&provider_sub.metadata, &session).map_err(|e| {
            tracing::warn!(
                subscription_id = %stripe_subscription_id,
                session_id = %session.id,
                wallet_source = %e.location,
                error = %e.reason,
                "Wallet address in metadata is not valid"
            );
            SubscriptionError::invalid_wallet(stripe_subscription_id.clone(), e)
        })?;

        let Some(wallet) = resolved else {
            tracing::warn!(
                subscription_id = %stripe_subscription_id,
                session_id = %session.id,
                "No wallet address in subscription or session metadata"
            );
            return Err(SubscriptionError::missing_wallet(stripe_subscription_id));
        };

        let customer_id = provider_sub
            .customer_id
            .clone()
            .or_else(|| session.customer.clone())
            .ok_or_else(|| {
                SubscriptionError::malformed(format!(
                    "No customer for subscription {}",
                    stripe_subscription_id
                ))
            })?;

        let (period_end, period_source) =
            resolve_period_end(provider_sub.current_period_end, Timestamp::now());
        if period_source == PeriodEndSource::Fallback {
            tracing::warn!(
                subscription_id = %stripe_subscription_id,
                "Provider sent no usable period end, applying fallback period"
            );
        }

        let new_subscription = NewSubscription {
            stripe_customer_id: customer_id,
            stripe_subscription_id: stripe_subscription_id.clone(),
            stripe_session_id: session.id.clone(),
            customer_email: session.email(),
            status: provider_sub.status,
            current_period_end: Some(period_end),
            wallet_address: wallet.address.clone(),
        };

        let created = bounded(
            self.timeouts.store,
            "create_subscription_with_wallet",
            self.store.create_subscription_with_wallet(new_subscription),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                subscription_id = %stripe_subscription_id,
                error = %e,
                "Failed to persist subscription"
            );
            e
        })?;

        match created {
            CreateResult::Inserted(id) => {
                tracing::info!(
                    subscription_id = %stripe_subscription_id,
                    internal_id = %id,
                    wallet_address = %wallet.address,
                    wallet_source = %wallet.source,
                    status = %provider_sub.status,
                    "Subscription created"
                );
                Ok(ReconcileBillingEventResult::SubscriptionCreated {
                    subscription_id: id,
                    stripe_subscription_id,
                    wallet_address: wallet.address,
                })
            }
            CreateResult::AlreadyExists(id) => {
                tracing::info!(
                    subscription_id = %stripe_subscription_id,
                    internal_id = %id,
                    "Subscription already reconciled"
                );
                Ok(ReconcileBillingEventResult::AlreadyReconciled {
                    subscription_id: id,
                    stripe_subscription_id,
                })
            }
        }
    }

    async fn handle_subscription_deleted(
        &self,
        event: &StripeEvent,
    ) -> Result<ReconcileBillingEventResult, SubscriptionError> {
        let subscription: SubscriptionObject = event.deserialize_object().map_err(|e| {
            SubscriptionError::malformed(format!("Invalid subscription object: {}", e))
        })?;

        let outcome = bounded(
            self.timeouts.store,
            "mark_cancelled",
            self.store.mark_cancelled(&subscription.id),
        )
        .await
        .map_err(|e| {
            tracing::error!(
                subscription_id = %subscription.id,
                error = %e,
                "Failed to cancel subscription"
            );
            e
        })?;

        match outcome {
            CancelOutcome::Cancelled => {
                tracing::info!(subscription_id = %subscription.id, "Subscription cancelled");
                Ok(ReconcileBillingEventResult::SubscriptionCancelled {
                    stripe_subscription_id: subscription.id,
                })
            }
            CancelOutcome::NotFound => {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    "Cancellation for unknown subscription, nothing to do"
                );
                Ok(ReconcileBillingEventResult::UnknownSubscription {
                    stripe_subscription_id: subscription.id,
                })
            }
        }
    }
}
