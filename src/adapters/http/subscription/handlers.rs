//! HTTP handlers for subscription endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::subscription::{
    CheckEntitlementHandler, CheckEntitlementQuery, CheckoutSettings, CreateCheckoutCommand,
    CreateCheckoutHandler, ReconcileBillingEventCommand, ReconcileBillingEventHandler,
    ReconcileTimeouts,
};
use crate::domain::foundation::ValidationError;
use crate::domain::subscription::{StripeWebhookVerifier, SubscriptionError};
use crate::ports::{BillingProvider, SubscriptionStore};

use super::dto::{
    CheckoutSessionResponse, CreateCheckoutSessionRequest, ErrorResponse,
    SubscriptionStatusResponse, WebhookAckResponse,
};

/// Header carrying the webhook signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub store: Arc<dyn SubscriptionStore>,
    pub billing: Arc<dyn BillingProvider>,
    pub verifier: Arc<StripeWebhookVerifier>,
    pub checkout_settings: CheckoutSettings,
    pub timeouts: ReconcileTimeouts,
}

impl SubscriptionAppState {
    pub fn reconcile_handler(&self) -> ReconcileBillingEventHandler {
        ReconcileBillingEventHandler::new(
            self.verifier.clone(),
            self.store.clone(),
            self.billing.clone(),
        )
        .with_timeouts(self.timeouts)
    }

    pub fn entitlement_handler(&self) -> CheckEntitlementHandler {
        CheckEntitlementHandler::new(self.store.clone()).with_query_timeout(self.timeouts.store)
    }

    pub fn checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.billing.clone(), self.checkout_settings.clone())
            .with_provider_timeout(self.timeouts.provider)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhook - Reconcile a Stripe webhook delivery
///
/// The body is taken as raw bytes; the signature covers the exact payload.
pub async fn handle_stripe_webhook(
    State(state): State<SubscriptionAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = ReconcileBillingEventCommand {
        payload: body.to_vec(),
        signature,
    };

    state.reconcile_handler().handle(cmd).await?;

    Ok(Json(WebhookAckResponse::received()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Status Query
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscription-status/:wallet_address - Entitlement for a wallet
pub async fn get_subscription_status(
    State(state): State<SubscriptionAppState>,
    Path(wallet_address): Path<String>,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let query = CheckEntitlementQuery { wallet_address };

    let entitlement = state
        .entitlement_handler()
        .handle(query)
        .await
        .map_err(|e| SubscriptionApiError::concealed(e, "Failed to fetch subscription status"))?;

    Ok(Json(SubscriptionStatusResponse::from(entitlement)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout
// ════════════════════════════════════════════════════════════════════════════════

/// POST /create-checkout-session - Start a subscription checkout for a wallet
///
/// An empty or unparseable body is treated as a missing wallet address.
pub async fn create_checkout_session(
    State(state): State<SubscriptionAppState>,
    body: Bytes,
) -> Result<impl IntoResponse, SubscriptionApiError> {
    let request: CreateCheckoutSessionRequest = if body.is_empty() {
        CreateCheckoutSessionRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            SubscriptionError::from(ValidationError::invalid_format(
                "walletAddress",
                e.to_string(),
            ))
        })?
    };

    let wallet_address = request
        .wallet_address
        .ok_or_else(|| SubscriptionError::from(ValidationError::empty_field("walletAddress")))?;

    let session = state
        .checkout_handler()
        .handle(CreateCheckoutCommand { wallet_address })
        .await
        .map_err(|e| SubscriptionApiError::concealed(e, "Failed to create checkout session"))?;

    Ok(Json(CheckoutSessionResponse::from(session)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub enum SubscriptionApiError {
    /// Reported with the error's own status and message.
    Domain(SubscriptionError),
    /// Server-side failure reported to end users as a generic 500.
    Internal(&'static str),
}

impl SubscriptionApiError {
    /// Keeps client errors intact and hides server-side detail.
    pub fn concealed(err: SubscriptionError, message: &'static str) -> Self {
        if err.status_code().is_server_error() {
            Self::Internal(message)
        } else {
            Self::Domain(err)
        }
    }
}

impl From<SubscriptionError> for SubscriptionApiError {
    fn from(err: SubscriptionError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            Self::Domain(err) => (err.status_code(), ErrorResponse::new(err.code(), err.to_string())),
            Self::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", message),
            ),
        };
        (status, Json(body)).into_response()
    }
}
