//! Wallet Subscriptions - recurring Stripe subscriptions linked to wallet addresses
//!
//! Verifies Stripe webhooks, reconciles checkout and cancellation events into
//! a subscription store keyed by wallet address, and answers entitlement
//! queries for wallets.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
