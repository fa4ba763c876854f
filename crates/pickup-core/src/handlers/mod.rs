//! Handlers for the engine's business operations.
//!
//! Each handler covers one area: accounts and sessions, the product catalog,
//! the order workflow, and the admin reports.

pub mod account;
pub mod catalog;
pub mod order;
pub mod reporting;

pub use account::AccountHandler;
pub use catalog::CatalogHandler;
pub use order::OrderHandler;
pub use reporting::ReportingHandler;
