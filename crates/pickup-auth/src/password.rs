//! Password hashing with argon2id.

use crate::AuthError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use pickup_config::Argon2Config;
use std::sync::Arc;
use uuid::Uuid;

/// Hashes and verifies passwords with a fixed set of cost parameters.
///
/// Cheap to clone, so it can be moved into a blocking task.
#[derive(Debug, Clone)]
pub struct PasswordService {
	params: Params,
	/// Hash of a random password under `params`, checked for unknown accounts.
	decoy_hash: Arc<str>,
}

impl PasswordService {
	pub fn new(config: &Argon2Config) -> Result<Self, AuthError> {
		let params = Params::new(
			config.memory_kib,
			config.iterations,
			config.parallelism,
			None,
		)
		.map_err(|e| AuthError::Hashing(e.to_string()))?;

		let mut service = Self {
			params,
			decoy_hash: Arc::from(""),
		};
		service.decoy_hash = service.hash(&Uuid::new_v4().to_string())?.into();
		Ok(service)
	}

	fn argon2(&self) -> Argon2<'static> {
		Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
	}

	/// Hashes a password into a PHC string with a fresh 16-byte salt.
	pub fn hash(&self, password: &str) -> Result<String, AuthError> {
		let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
			.map_err(|e| AuthError::Hashing(e.to_string()))?;

		self.argon2()
			.hash_password(password.as_bytes(), &salt)
			.map(|hash| hash.to_string())
			.map_err(|e| AuthError::Hashing(e.to_string()))
	}

	/// Checks a password against a stored PHC string.
	///
	/// Costs are read from the stored hash, so hashes made under older
	/// parameters keep verifying.
	pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
		let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hashing(e.to_string()))?;

		match self.argon2().verify_password(password.as_bytes(), &parsed) {
			Ok(()) => Ok(true),
			Err(argon2::password_hash::Error::Password) => Ok(false),
			Err(e) => Err(AuthError::Hashing(e.to_string())),
		}
	}

	/// Runs a full verification that never succeeds.
	///
	/// Used when no account matches, so that the failure takes as long as a
	/// wrong password for an existing account.
	pub fn verify_decoy(&self, password: &str) -> Result<bool, AuthError> {
		self.verify(password, &self.decoy_hash).map(|_| false)
	}
}
