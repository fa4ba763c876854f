//! Credential and session handling for the pickup ordering service.
//!
//! Passwords are stored as argon2id hashes. Sessions are stateless signed
//! tokens carrying the caller's id and role, so checking a request never
//! touches storage.

use pickup_types::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod password;
pub mod session;

pub use password::PasswordService;
pub use session::SessionIssuer;

/// Errors that can occur while hashing passwords or checking sessions.
#[derive(Debug, Error)]
pub enum AuthError {
	/// No bearer credential was supplied.
	#[error("Missing bearer token")]
	MissingToken,
	/// The credential is not a well-formed session token.
	#[error("Malformed token: {0}")]
	MalformedToken(String),
	/// The token signature does not match its contents.
	#[error("Invalid token signature")]
	InvalidSignature,
	/// The token was valid once but its lifetime has passed.
	#[error("Token expired")]
	Expired,
	/// The caller is authenticated but lacks the required role.
	#[error("Requires role '{required}'")]
	Forbidden { required: Role },
	/// The signing key could not be used.
	#[error("Invalid signing key: {0}")]
	InvalidKey(String),
	/// Password hashing failed or a stored hash could not be parsed.
	#[error("Password hashing error: {0}")]
	Hashing(String),
}

/// The authenticated caller of an operation, as carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	pub user_id: Uuid,
	pub role: Role,
	pub name: Option<String>,
}

impl Identity {
	pub fn new(user_id: Uuid, role: Role) -> Self {
		Self {
			user_id,
			role,
			name: None,
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}

	/// Checks that the caller holds `role`.
	///
	/// Every admin-only operation goes through this one check.
	pub fn require_role(&self, role: Role) -> Result<(), AuthError> {
		if self.role == role {
			Ok(())
		} else {
			Err(AuthError::Forbidden { required: role })
		}
	}
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
	let value = header.ok_or(AuthError::MissingToken)?;
	let (scheme, token) = value
		.trim()
		.split_once(' ')
		.ok_or_else(|| AuthError::MalformedToken("expected 'Bearer <token>'".into()))?;

	if !scheme.eq_ignore_ascii_case("bearer") {
		return Err(AuthError::MalformedToken(format!(
			"unsupported scheme '{}'",
			scheme
		)));
	}

	let token = token.trim();
	if token.is_empty() {
		return Err(AuthError::MissingToken);
	}
	Ok(token)
}
