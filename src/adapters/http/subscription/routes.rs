//! Axum router configuration for subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_checkout_session, get_subscription_status, handle_stripe_webhook, SubscriptionAppState,
};

/// Create the subscription router.
///
/// # Routes
/// - `POST /webhook` - Stripe webhook deliveries (signature verified, no auth)
/// - `GET /api/subscription-status/:wallet_address` - Entitlement for a wallet
/// - `POST /create-checkout-session` - Start a checkout for a wallet
pub fn subscription_routes() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/webhook", post(handle_stripe_webhook))
        .route(
            "/api/subscription-status/:wallet_address",
            get(get_subscription_status),
        )
        .route("/create-checkout-session", post(create_checkout_session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::adapters::stripe::MockBillingProvider;
    use crate::application::handlers::subscription::{CheckoutSettings, ReconcileTimeouts};
    use crate::domain::foundation::{Timestamp, WalletAddress};
    use crate::domain::subscription::webhook_verifier::sign_payload;
    use crate::domain::subscription::{
        NewSubscription, StripeWebhookVerifier, SubscriptionStatus,
    };
    use crate::ports::{BillingError, ProviderSubscription, StoreError, SubscriptionStore};

    const SECRET: &str = "whsec_routes_test";

    struct Harness {
        store: Arc<InMemorySubscriptionStore>,
        billing: MockBillingProvider,
        app: Router,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let billing = MockBillingProvider::new();
        let state = SubscriptionAppState {
            store: store.clone(),
            billing: Arc::new(billing.clone()),
            verifier: Arc::new(StripeWebhookVerifier::new(SECRET)),
            checkout_settings: CheckoutSettings {
                price_id: "price_123".to_string(),
                success_url: "https://app/success".to_string(),
                cancel_url: "https://app/cancel".to_string(),
            },
            timeouts: ReconcileTimeouts::default(),
        };
        Harness {
            store,
            billing,
            app: subscription_routes().with_state(state),
        }
    }

    fn webhook_request(payload: &[u8], signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("Content-Type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header("Stripe-Signature", signature);
        }
        builder.body(Body::from(payload.to_vec())).unwrap()
    }

    fn signature_for(payload: &[u8]) -> String {
        let now = Timestamp::now().as_unix_secs();
        format!("t={},v1={}", now, sign_payload(SECRET, now, payload).unwrap())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn checkout_payload() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": 1_700_000_000,
            "data": {"object": {
                "id": "cs_1",
                "subscription": "sub_1",
                "customer": "cus_1",
                "customer_details": {"email": "a@b.com"},
                "metadata": {}
            }}
        }))
        .unwrap()
    }

    fn active_subscription(period_end: Timestamp) -> NewSubscription {
        NewSubscription {
            stripe_customer_id: "cus_1".to_string(),
            stripe_subscription_id: "sub_1".to_string(),
            stripe_session_id: "cs_1".to_string(),
            customer_email: Some("a@b.com".to_string()),
            status: SubscriptionStatus::Active,
            current_period_end: Some(period_end),
            wallet_address: WalletAddress::new("0xABC").unwrap(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn webhook_without_signature_is_bad_request() {
        let h = harness();

        let response = h
            .app
            .oneshot(webhook_request(&checkout_payload(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.store.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn webhook_with_bad_signature_is_bad_request() {
        let h = harness();
        let payload = checkout_payload();
        let now = Timestamp::now().as_unix_secs();
        let signature = format!(
            "t={},v1={}",
            now,
            sign_payload("whsec_wrong", now, &payload).unwrap()
        );

        let response = h
            .app
            .oneshot(webhook_request(&payload, Some(signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "AUTHENTICATION_FAILED");
        assert!(h.billing.calls().is_empty());
    }

    #[tokio::test]
    async fn signed_checkout_is_acknowledged() {
        let h = harness();
        h.billing.add_subscription(ProviderSubscription {
            id: "sub_1".to_string(),
            customer_id: Some("cus_1".to_string()),
            status: SubscriptionStatus::Active,
            current_period_end: Some(Timestamp::now().add_days(30).as_unix_secs()),
            metadata: HashMap::from([("wallet_address".to_string(), "0xABC".to_string())]),
        });
        let payload = checkout_payload();

        let response = h
            .app
            .oneshot(webhook_request(&payload, Some(signature_for(&payload))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!({"received": true}));
        assert_eq!(h.store.subscriptions().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged() {
        let h = harness();
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_2",
            "type": "invoice.paid",
            "data": {"object": {"id": "in_1"}}
        }))
        .unwrap();

        let response = h
            .app
            .oneshot(webhook_request(&payload, Some(signature_for(&payload))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["received"], true);
    }

    #[tokio::test]
    async fn checkout_without_wallet_is_not_acknowledged() {
        let h = harness();
        h.billing.add_subscription(ProviderSubscription {
            id: "sub_1".to_string(),
            customer_id: Some("cus_1".to_string()),
            status: SubscriptionStatus::Active,
            current_period_end: None,
            metadata: HashMap::new(),
        });
        let payload = checkout_payload();

        let response = h
            .app
            .oneshot(webhook_request(&payload, Some(signature_for(&payload))))
            .await
            .unwrap();

        assert!(!response.status().is_success());
        assert!(h.store.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn provider_outage_is_server_error() {
        let h = harness();
        h.billing.set_method_error(
            "retrieve_subscription",
            BillingError::network("connection reset"),
        );
        let payload = checkout_payload();

        let response = h
            .app
            .oneshot(webhook_request(&payload, Some(signature_for(&payload))))
            .await
            .unwrap();

        assert!(response.status().is_server_error());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Status Query
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn status_for_unknown_wallet_is_none() {
        let h = harness();

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/subscription-status/0xNOBODY")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"hasSubscription": false, "status": "none"})
        );
    }

    #[tokio::test]
    async fn status_for_current_subscription_is_active() {
        let h = harness();
        let end = Timestamp::now().add_days(10);
        h.store
            .create_subscription_with_wallet(active_subscription(end))
            .await
            .unwrap();

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/subscription-status/0xABC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["hasSubscription"], true);
        assert_eq!(body["status"], "active");
        assert_eq!(body["expiresAt"], end.to_rfc3339());
        assert_eq!(body["customerEmail"], "a@b.com");
    }

    #[tokio::test]
    async fn status_for_lapsed_subscription_is_expired() {
        let h = harness();
        h.store
            .create_subscription_with_wallet(active_subscription(Timestamp::now().add_days(-1)))
            .await
            .unwrap();

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/subscription-status/0xABC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            body_json(response).await,
            serde_json::json!({"hasSubscription": false, "status": "expired"})
        );
    }

    #[tokio::test]
    async fn status_store_failure_is_generic_500() {
        let h = harness();
        h.store
            .fail_reads_with(Some(StoreError::database("connection refused")))
            .await;

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/subscription-status/0xABC")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to fetch subscription status");
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Checkout
    // ════════════════════════════════════════════════════════════════════════════

    fn checkout_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/create-checkout-session")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn checkout_returns_session() {
        let h = harness();

        let response = h
            .app
            .oneshot(checkout_request(r#"{"walletAddress":"0xABC"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["id"].as_str().unwrap().starts_with("cs_mock_"));
        assert!(body["url"].is_string());
        assert_eq!(h.billing.checkout_requests()[0].wallet_address.as_str(), "0xABC");
    }

    #[tokio::test]
    async fn checkout_without_wallet_is_bad_request() {
        let h = harness();

        let response = h.app.oneshot(checkout_request("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert!(h.billing.calls().is_empty());
    }

    #[tokio::test]
    async fn checkout_with_blank_wallet_is_bad_request() {
        let h = harness();

        let response = h
            .app
            .oneshot(checkout_request(r#"{"walletAddress":"  "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn checkout_with_empty_body_is_bad_request() {
        let h = harness();

        let response = h.app.oneshot(checkout_request("")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn checkout_provider_failure_is_generic_500() {
        let h = harness();
        h.billing.set_method_error(
            "create_checkout_session",
            BillingError::provider("stripe unavailable"),
        );

        let response = h
            .app
            .oneshot(checkout_request(r#"{"walletAddress":"0xABC"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Failed to create checkout session"
        );
    }
}
