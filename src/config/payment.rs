//! Payment configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Recurring price sold through checkout
    pub stripe_price_id: String,

    /// Where Stripe sends the customer after a completed checkout
    pub success_url: String,

    /// Where Stripe sends the customer after an abandoned checkout
    pub cancel_url: String,

    /// Stripe REST API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Accepted age of a webhook signature timestamp in seconds
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,

    /// Upper bound on a single Stripe API call in seconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Validate payment configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if self.stripe_price_id.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_PRICE_ID"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") && !self.stripe_api_key.starts_with("rk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.stripe_price_id.starts_with("price_") {
            return Err(ValidationError::InvalidStripePriceId);
        }

        validate_redirect("payment.success_url", &self.success_url, environment)?;
        validate_redirect("payment.cancel_url", &self.cancel_url, environment)?;

        if self.webhook_tolerance_secs <= 0 {
            return Err(ValidationError::InvalidTimeout("payment.webhook_tolerance_secs"));
        }
        if self.provider_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("payment.provider_timeout_secs"));
        }

        Ok(())
    }
}

fn validate_redirect(
    field: &'static str,
    url: &str,
    environment: &Environment,
) -> Result<(), ValidationError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::InvalidRedirectUrl(field));
    }
    if *environment == Environment::Production && !url.starts_with("https://") {
        return Err(ValidationError::RedirectMustBeHttps);
    }
    Ok(())
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: String::new(),
            stripe_webhook_secret: String::new(),
            stripe_price_id: String::new(),
            success_url: String::new(),
            cancel_url: String::new(),
            api_base_url: default_api_base_url(),
            webhook_tolerance_secs: default_webhook_tolerance(),
            provider_timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_webhook_tolerance() -> i64 {
    300
}

fn default_provider_timeout() -> u64 {
    10
}
