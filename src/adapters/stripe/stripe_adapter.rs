//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port over Stripe's REST API using
//! form-encoded requests and basic auth with the secret key.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_request_timeout(Duration::from_secs(10));
//! let client = StripeBillingClient::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::subscription::WALLET_METADATA_KEY;
use crate::ports::{
    BillingError, BillingErrorCode, BillingProvider, CheckoutRequest, CheckoutSession,
    ProviderSubscription,
};

use super::api_types::{StripeCheckoutSession, StripeErrorResponse, StripeSubscription};

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    /// Per-request timeout enforced by the HTTP client.
    request_timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Stripe billing client.
pub struct StripeBillingClient {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingClient {
    pub fn new(config: StripeConfig) -> Result<Self, BillingError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BillingError::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn parse_error(response: reqwest::Response) -> BillingError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        map_error_response(status, &body)
    }
}

/// Form parameters for a subscription-mode checkout session.
///
/// The wallet goes into both the session and the subscription metadata so it
/// survives onto the subscription object fetched during reconciliation.
pub(crate) fn checkout_params(request: &CheckoutRequest) -> Vec<(String, String)> {
    let wallet = request.wallet_address.as_str().to_string();
    vec![
        ("mode".to_string(), "subscription".to_string()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (format!("metadata[{}]", WALLET_METADATA_KEY), wallet.clone()),
        (
            format!("subscription_data[metadata][{}]", WALLET_METADATA_KEY),
            wallet,
        ),
    ]
}

/// Maps a non-2xx Stripe response to a classified error.
pub(crate) fn map_error_response(status: StatusCode, body: &str) -> BillingError {
    let parsed = serde_json::from_str::<StripeErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|p| p.error.message.clone())
        .unwrap_or_else(|| format!("Stripe API error ({})", status));

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BillingErrorCode::AuthenticationError,
        StatusCode::NOT_FOUND => BillingErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => BillingErrorCode::RateLimitExceeded,
        s if s.is_server_error() => BillingErrorCode::ProviderError,
        s if s.is_client_error() => BillingErrorCode::InvalidRequest,
        _ => BillingErrorCode::Unknown,
    };

    let err = BillingError::new(code, message);
    match parsed.and_then(|p| p.error.code) {
        Some(provider_code) => err.with_provider_code(provider_code),
        None => err,
    }
}

fn request_error(e: reqwest::Error) -> BillingError {
    if e.is_timeout() {
        BillingError::network(format!("Stripe request timed out: {}", e))
    } else {
        BillingError::network(e.to_string())
    }
}

#[async_trait]
impl BillingProvider for StripeBillingClient {
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.config.api_base_url, subscription_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        let stripe_sub: StripeSubscription = response.json().await.map_err(|e| {
            BillingError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        tracing::debug!(
            subscription_id = %stripe_sub.id,
            status = %stripe_sub.status,
            "Retrieved Stripe subscription"
        );

        Ok(stripe_sub.into())
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let params = checkout_params(&request);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            BillingError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let url = session
            .url
            .ok_or_else(|| BillingError::provider("Checkout session has no URL"))?;

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}
