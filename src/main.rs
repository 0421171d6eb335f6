//! Wallet Subscriptions server
//!
//! Receives Stripe webhooks, keeps wallet-linked subscriptions in PostgreSQL
//! and serves entitlement and checkout endpoints.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wallet_subscriptions::adapters::http::{build_router, SubscriptionAppState};
use wallet_subscriptions::adapters::{PostgresSubscriptionStore, StripeBillingClient, StripeConfig};
use wallet_subscriptions::application::{CheckoutSettings, ReconcileTimeouts};
use wallet_subscriptions::config::{AppConfig, ServerConfig};
use wallet_subscriptions::domain::subscription::StripeWebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    config.validate().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Starting wallet-subscriptions"
    );

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            e
        })?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    let billing = StripeBillingClient::new(
        StripeConfig::new(config.payment.stripe_api_key.clone())
            .with_base_url(config.payment.api_base_url.clone())
            .with_request_timeout(config.payment.provider_timeout()),
    )?;

    let verifier = StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone())
        .with_tolerance(config.payment.webhook_tolerance_secs);

    let state = SubscriptionAppState {
        store: Arc::new(PostgresSubscriptionStore::new(db_pool.clone())),
        billing: Arc::new(billing),
        verifier: Arc::new(verifier),
        checkout_settings: CheckoutSettings {
            price_id: config.payment.stripe_price_id.clone(),
            success_url: config.payment.success_url.clone(),
            cancel_url: config.payment.cancel_url.clone(),
        },
        timeouts: ReconcileTimeouts {
            provider: config.payment.provider_timeout(),
            store: config.database.query_timeout(),
        },
    };

    let router = build_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize tracing; `RUST_LOG` wins over the configured level.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
