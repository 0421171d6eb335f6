//! HTTP adapters - REST API implementations.
//!
//! `build_router` assembles the subscription routes with the cross-cutting
//! tower-http layers (tracing, request timeout, CORS).

pub mod subscription;

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use subscription::{subscription_routes, SubscriptionApiError, SubscriptionAppState};

/// Build the application router with middleware layers applied.
pub fn build_router(state: SubscriptionAppState, server: &ServerConfig) -> Router {
    subscription_routes()
        .layer(build_cors_layer(&server.cors_origins_list()))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build a CorsLayer from configured origins.
///
/// An empty list allows no cross-origin callers; a single `*` allows any.
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.len() == 1 && origins[0] == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    layer.allow_origin(origins)
}
