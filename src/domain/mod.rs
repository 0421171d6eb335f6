//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `subscription` - Subscription lifecycle, wallet linkage and entitlement

pub mod foundation;
pub mod subscription;
