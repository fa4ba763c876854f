//! Utility functions for the engine.

pub mod token;

pub use token::generate_pickup_token;
