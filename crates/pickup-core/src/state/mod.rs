//! State management for orders.
//!
//! This module provides the state machine that validates and persists order
//! status changes.

pub mod order;

pub use order::OrderStateMachine;
pub use pickup_config::TransitionPolicy;
