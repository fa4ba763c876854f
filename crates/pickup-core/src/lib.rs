//! Core engine for the pickup ordering service.
//!
//! The engine owns the storage handle and the credential services and exposes
//! the business operations through four handlers: accounts, catalog, orders
//! and reporting. Every operation takes the caller's [`Identity`] explicitly,
//! so authorization is decided here and not in the HTTP layer.

use pickup_auth::{AuthError, Identity, PasswordService, SessionIssuer};
use pickup_config::Config;
use pickup_storage::{StorageError, StorageService};
use pickup_types::{OrderStatus, UnknownStatus};
use std::sync::Arc;
use thiserror::Error;

pub mod builder;
pub mod handlers;
pub mod state;
pub mod utils;

pub use builder::{BuilderError, PickupBuilder, PickupFactories};
pub use handlers::{AccountHandler, CatalogHandler, OrderHandler, ReportingHandler};
pub use state::{OrderStateMachine, TransitionPolicy};

/// Errors returned by engine operations.
///
/// Each variant corresponds to one kind of failure a caller can react to; the
/// HTTP layer maps them onto status codes one to one.
#[derive(Debug, Error)]
pub enum EngineError {
	/// Required input is missing or malformed.
	#[error("{0}")]
	Validation(String),
	/// A uniqueness constraint would be violated.
	#[error("{0}")]
	Conflict(String),
	/// Unknown phone or wrong password. Deliberately a single signal.
	#[error("Invalid credentials")]
	InvalidCredentials,
	/// No usable session credential.
	#[error("Authentication required: {0}")]
	Unauthenticated(String),
	/// The caller is authenticated but not allowed to do this.
	#[error("{0}")]
	Forbidden(String),
	/// The named record does not exist.
	#[error("{0} not found")]
	NotFound(String),
	/// The order payload was rejected.
	#[error("{0}")]
	InvalidOrder(String),
	/// The status label is not one of the known four.
	#[error(transparent)]
	InvalidStatus(#[from] UnknownStatus),
	/// The transition policy does not allow this status change.
	#[error("Cannot move order from '{from}' to '{to}'")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	/// The persistence collaborator failed.
	#[error("Storage error: {0}")]
	Storage(String),
	/// Password hashing or a background task failed.
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<StorageError> for EngineError {
	fn from(err: StorageError) -> Self {
		EngineError::Storage(err.to_string())
	}
}

impl From<AuthError> for EngineError {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::MissingToken
			| AuthError::MalformedToken(_)
			| AuthError::InvalidSignature
			| AuthError::Expired => EngineError::Unauthenticated(err.to_string()),
			AuthError::Forbidden { required } => {
				EngineError::Forbidden(format!("{} access required", capitalize(required.as_str())))
			},
			AuthError::InvalidKey(_) | AuthError::Hashing(_) => {
				EngineError::Internal(err.to_string())
			},
		}
	}
}

impl From<validator::ValidationErrors> for EngineError {
	fn from(errors: validator::ValidationErrors) -> Self {
		let mut messages: Vec<String> = errors
			.field_errors()
			.into_iter()
			.flat_map(|(field, errs)| {
				errs.iter().map(move |e| match &e.message {
					Some(message) => message.to_string(),
					None => format!("{} is invalid", field),
				})
			})
			.collect();
		messages.sort();
		EngineError::Validation(messages.join(", "))
	}
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// The pickup engine.
///
/// Cheap to share behind an `Arc`; every handler only holds `Arc`s and
/// immutable settings, so concurrent requests never contend on the engine
/// itself.
pub struct PickupEngine {
	config: Config,
	storage: Arc<StorageService>,
	accounts: AccountHandler,
	catalog: CatalogHandler,
	orders: OrderHandler,
	reporting: ReportingHandler,
}

impl PickupEngine {
	/// Wires the handlers around an already constructed storage service.
	pub fn new(config: Config, storage: Arc<StorageService>) -> Result<Self, EngineError> {
		let passwords = PasswordService::new(&config.auth.argon2)?;
		let sessions = SessionIssuer::from_config(&config.auth);
		let state_machine = Arc::new(OrderStateMachine::new(
			storage.clone(),
			config.orders.transition_policy,
		));

		Ok(Self {
			accounts: AccountHandler::new(storage.clone(), passwords, sessions),
			catalog: CatalogHandler::new(storage.clone()),
			orders: OrderHandler::new(
				storage.clone(),
				state_machine,
				config.orders.token_length,
			),
			reporting: ReportingHandler::new(storage.clone()),
			storage,
			config,
		})
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn accounts(&self) -> &AccountHandler {
		&self.accounts
	}

	pub fn catalog(&self) -> &CatalogHandler {
		&self.catalog
	}

	pub fn orders(&self) -> &OrderHandler {
		&self.orders
	}

	pub fn reporting(&self) -> &ReportingHandler {
		&self.reporting
	}

	/// Shorthand for [`AccountHandler::authenticate`].
	pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, EngineError> {
		self.accounts.authenticate(authorization)
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use pickup_types::Role;

	#[test]
	fn test_auth_errors_map_to_engine_errors() {
		assert!(matches!(
			EngineError::from(AuthError::Expired),
			EngineError::Unauthenticated(_)
		));
		assert!(matches!(
			EngineError::from(AuthError::MissingToken),
			EngineError::Unauthenticated(_)
		));

		let forbidden = EngineError::from(AuthError::Forbidden {
			required: Role::Admin,
		});
		assert_eq!(forbidden.to_string(), "Admin access required");

		assert!(matches!(
			EngineError::from(AuthError::Hashing("boom".into())),
			EngineError::Internal(_)
		));
	}

	#[test]
	fn test_unknown_status_converts() {
		let err: EngineError = "shipped".parse::<OrderStatus>().unwrap_err().into();
		assert!(matches!(err, EngineError::InvalidStatus(_)));
		assert_eq!(err.to_string(), "Unknown order status: shipped");
	}
}
