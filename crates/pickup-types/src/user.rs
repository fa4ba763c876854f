//! User account types.
//!
//! A user is identified by a unique phone number (the login key) and a unique
//! email. The password hash never leaves the server: everything returned over
//! the API goes through [`PublicUser`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Authorization level embedded in the session credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	/// Regular customer placing orders.
	#[default]
	#[serde(alias = "user")]
	Customer,
	/// Staff member managing the catalog and order pipeline.
	Admin,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::Customer => "customer",
			Role::Admin => "admin",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"customer" | "user" => Ok(Role::Customer),
			"admin" => Ok(Role::Admin),
			other => Err(format!("unknown role '{}'", other)),
		}
	}
}

/// Stored user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	pub id: Uuid,
	pub name: String,
	pub email: String,
	pub phone: String,
	/// Argon2 PHC string.
	pub password_hash: String,
	#[serde(default)]
	pub role: Role,
	pub created_at: DateTime<Utc>,
}

/// User as exposed over the API, without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
	pub id: Uuid,
	pub name: String,
	pub email: String,
	pub phone: String,
	pub role: Role,
	pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			name: user.name.clone(),
			email: user.email.clone(),
			phone: user.phone.clone(),
			role: user.role,
			created_at: user.created_at,
		}
	}
}

impl From<User> for PublicUser {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			name: user.name,
			email: user.email,
			phone: user.phone,
			role: user.role,
			created_at: user.created_at,
		}
	}
}

/// Customer listing entry for the admin users view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
	#[serde(flatten)]
	pub user: PublicUser,
	pub order_count: usize,
}
