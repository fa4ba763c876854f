//! Account handler for registration, login and session checks.

use crate::EngineError;
use chrono::Utc;
use pickup_auth::{Identity, PasswordService, SessionIssuer};
use pickup_storage::{StorageError, StorageService};
use pickup_types::{
	AuthResponse, LoginRequest, PublicUser, RegisterRequest, Role, StorageKey, User,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

const DUPLICATE_USER: &str = "User with this email or phone already exists";

/// Handler for user accounts and session credentials.
pub struct AccountHandler {
	storage: Arc<StorageService>,
	passwords: PasswordService,
	sessions: SessionIssuer,
}

impl AccountHandler {
	pub fn new(
		storage: Arc<StorageService>,
		passwords: PasswordService,
		sessions: SessionIssuer,
	) -> Self {
		Self {
			storage,
			passwords,
			sessions,
		}
	}

	/// Creates a customer account and returns it with a fresh session token.
	///
	/// Phone and email are claimed atomically before the user record is
	/// written, so two concurrent registrations can never both succeed.
	#[instrument(skip_all)]
	pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, EngineError> {
		let request = RegisterRequest {
			name: request.name.trim().to_string(),
			email: request.email.trim().to_string(),
			phone: request.phone.trim().to_string(),
			password: request.password,
		};
		request.validate()?;
		if request.password.trim().is_empty() {
			return Err(EngineError::Validation("Password is required".into()));
		}

		let passwords = self.passwords.clone();
		let password = request.password;
		let password_hash = tokio::task::spawn_blocking(move || passwords.hash(&password))
			.await
			.map_err(|e| EngineError::Internal(e.to_string()))??;

		let user = User {
			id: Uuid::new_v4(),
			name: request.name,
			email: request.email,
			phone: request.phone,
			password_hash,
			role: Role::Customer,
			created_at: Utc::now(),
		};

		self.claim_identifiers(&user).await?;

		if let Err(e) = self
			.storage
			.store(StorageKey::Users.as_str(), &user.id.to_string(), &user)
			.await
		{
			self.release_identifiers(&user).await;
			return Err(e.into());
		}

		tracing::info!(user_id = %user.id, "Registered user");

		let token = self
			.sessions
			.issue(&Identity::new(user.id, user.role), Utc::now())?;
		Ok(AuthResponse {
			user: PublicUser::from(user),
			token,
		})
	}

	/// Checks a phone and password pair and returns a session token.
	///
	/// An unknown phone and a wrong password produce the same error.
	#[instrument(skip_all)]
	pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, EngineError> {
		let phone = request.phone.trim();
		if phone.is_empty() || request.password.is_empty() {
			return Err(EngineError::Validation(
				"Phone and password are required".into(),
			));
		}

		let user = self.find_by_phone(phone).await?;

		// Unknown phones still run one verification, so both failures take equally long.
		let passwords = self.passwords.clone();
		let password = request.password;
		let stored = user.as_ref().map(|user| user.password_hash.clone());
		let matches = tokio::task::spawn_blocking(move || match stored {
			Some(stored) => passwords.verify(&password, &stored),
			None => passwords.verify_decoy(&password),
		})
		.await
		.map_err(|e| EngineError::Internal(e.to_string()))??;

		let user = match user {
			Some(user) if matches => user,
			Some(user) => {
				tracing::debug!(user_id = %user.id, "Login with wrong password");
				return Err(EngineError::InvalidCredentials);
			},
			None => {
				tracing::debug!("Login for unknown phone");
				return Err(EngineError::InvalidCredentials);
			},
		};

		let identity = Identity::new(user.id, user.role).with_name(user.name.clone());
		let token = self.sessions.issue(&identity, Utc::now())?;

		tracing::info!(user_id = %user.id, "User logged in");
		Ok(AuthResponse {
			user: PublicUser::from(user),
			token,
		})
	}

	/// Verifies the `Authorization` header value of a request.
	///
	/// Purely local: the token is checked against the signing key and its
	/// expiry, storage is never consulted.
	pub fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, EngineError> {
		Ok(self.sessions.authenticate(authorization, Utc::now())?)
	}

	/// Grants the admin role to the user registered with `phone`.
	pub async fn promote(&self, phone: &str) -> Result<PublicUser, EngineError> {
		let mut user = self
			.find_by_phone(phone.trim())
			.await?
			.ok_or_else(|| EngineError::NotFound("User".into()))?;

		user.role = Role::Admin;
		self.storage
			.update(StorageKey::Users.as_str(), &user.id.to_string(), &user)
			.await?;

		tracing::info!(user_id = %user.id, "Promoted user to admin");
		Ok(PublicUser::from(user))
	}

	async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, EngineError> {
		let Some(user_id) = self
			.storage
			.find::<Uuid>(StorageKey::UsersByPhone.as_str(), phone)
			.await?
		else {
			return Ok(None);
		};

		match self
			.storage
			.retrieve::<User>(StorageKey::Users.as_str(), &user_id.to_string())
			.await
		{
			Ok(user) => Ok(Some(user)),
			// A claim without a record belongs to a registration that is
			// still in flight or was abandoned.
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	async fn claim_identifiers(&self, user: &User) -> Result<(), EngineError> {
		if !self
			.storage
			.claim(StorageKey::UsersByPhone.as_str(), &user.phone, &user.id)
			.await?
		{
			return Err(EngineError::Conflict(DUPLICATE_USER.into()));
		}

		let email_claimed = self
			.storage
			.claim(StorageKey::UsersByEmail.as_str(), &user.email, &user.id)
			.await;

		match email_claimed {
			Ok(true) => Ok(()),
			Ok(false) => {
				self.release(StorageKey::UsersByPhone, &user.phone).await;
				Err(EngineError::Conflict(DUPLICATE_USER.into()))
			},
			Err(e) => {
				self.release(StorageKey::UsersByPhone, &user.phone).await;
				Err(e.into())
			},
		}
	}

	async fn release_identifiers(&self, user: &User) {
		self.release(StorageKey::UsersByPhone, &user.phone).await;
		self.release(StorageKey::UsersByEmail, &user.email).await;
	}

	async fn release(&self, key: StorageKey, id: &str) {
		if let Err(e) = self.storage.remove(key.as_str(), id).await {
			tracing::warn!(namespace = key.as_str(), error = %e, "Failed to release claim");
		}
	}
}
