//! CreateCheckoutHandler - starts a subscription checkout for a wallet.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::WalletAddress;
use crate::domain::subscription::SubscriptionError;
use crate::ports::{BillingProvider, CheckoutRequest, CheckoutSession};

use super::reconcile_billing_event::bounded;

/// Command to create a checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub wallet_address: String,
}

/// Product and redirect settings for new checkouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Handler for checkout session creation.
pub struct CreateCheckoutHandler {
    billing: Arc<dyn BillingProvider>,
    settings: CheckoutSettings,
    provider_timeout: Duration,
}

impl CreateCheckoutHandler {
    pub fn new(billing: Arc<dyn BillingProvider>, settings: CheckoutSettings) -> Self {
        Self {
            billing,
            settings,
            provider_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub async fn handle(&self, cmd: CreateCheckoutCommand) -> Result<CheckoutSession, SubscriptionError> {
        let wallet = WalletAddress::new(&cmd.wallet_address)?;

        let request = CheckoutRequest {
            wallet_address: wallet.clone(),
            price_id: self.settings.price_id.clone(),
            success_url: self.settings.success_url.clone(),
            cancel_url: self.settings.cancel_url.clone(),
        };

        let session = bounded(
            self.provider_timeout,
            "create_checkout_session",
            self.billing.create_checkout_session(request),
        )
        .await
        .map_err(|e| {
            tracing::error!(wallet_address = %wallet, error = %e, "Checkout session creation failed");
            e
        })?;

        tracing::info!(
            wallet_address = %wallet,
            session_id = %session.id,
            "Checkout session created"
        );

        Ok(session)
    }
}
