//! Mock billing provider for testing.
//!
//! Configurable in-process implementation of `BillingProvider`. Supports:
//! - Pre-configured subscriptions
//! - Error injection per method
//! - Artificial latency for timeout tests
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    BillingError, BillingProvider, CheckoutRequest, CheckoutSession, ProviderSubscription,
};

/// Mock billing provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockBillingProvider::new();
/// mock.add_subscription(ProviderSubscription { id: "sub_1".into(), ... });
/// mock.set_method_error("retrieve_subscription", BillingError::network("down"));
/// ```
#[derive(Default, Clone)]
pub struct MockBillingProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Subscriptions returned by `retrieve_subscription`, keyed by ID.
    subscriptions: HashMap<String, ProviderSubscription>,

    /// Errors keyed by method name.
    method_errors: HashMap<String, BillingError>,

    /// Delay applied before every call.
    latency: Option<Duration>,

    /// Checkout requests received.
    checkout_requests: Vec<CheckoutRequest>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Add a subscription to the "provider".
    pub fn add_subscription(&self, subscription: ProviderSubscription) {
        let id = subscription.id.clone();
        self.state().subscriptions.insert(id, subscription);
    }

    /// Make a specific method fail until cleared.
    pub fn set_method_error(&self, method: &str, error: BillingError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = Some(latency);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Assertions
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn checkout_requests(&self) -> Vec<CheckoutRequest> {
        self.state().checkout_requests.clone()
    }

    /// Records the call and returns (configured error, latency).
    fn begin(&self, method: &str, args: Vec<String>) -> (Option<BillingError>, Option<Duration>) {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
        (state.method_errors.get(method).cloned(), state.latency)
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, BillingError> {
        let (error, latency) = self.begin("retrieve_subscription", vec![subscription_id.to_string()]);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = error {
            return Err(error);
        }

        self.state()
            .subscriptions
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| BillingError::not_found("Subscription"))
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let (error, latency) = self.begin(
            "create_checkout_session",
            vec![request.wallet_address.to_string()],
        );
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = error {
            return Err(error);
        }

        let mut state = self.state();
        let id = format!("cs_mock_{}", state.checkout_requests.len() + 1);
        state.checkout_requests.push(request);

        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{}", id),
            id,
        })
    }
}
