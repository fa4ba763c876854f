//! Common types module for the pickup ordering system.
//!
//! This module defines the core data types and structures used throughout
//! the service. It provides a centralized location for shared types
//! to ensure consistency between the engine, storage and HTTP layers.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Catalog types for menu products.
pub mod catalog;
/// Order types including line item snapshots and the fulfillment status.
pub mod order;
/// Implementation registry trait for pluggable backends.
pub mod registry;
/// Aggregated reporting types for the admin dashboards.
pub mod report;
/// Secure string wrapper for signing keys and similar secrets.
pub mod secret_string;
/// Storage types for managing persistent data.
pub mod storage;
/// User accounts and roles.
pub mod user;
/// Utility functions for money and display formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use catalog::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use report::*;
pub use secret_string::SecretString;
pub use storage::*;
pub use user::*;
pub use utils::{round_money, truncate_id};
pub use validation::*;
