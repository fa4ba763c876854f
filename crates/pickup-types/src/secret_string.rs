//! Secure string type for handling sensitive configuration values.
//!
//! `SecretString` wraps the session signing key (and any other secret read
//! from configuration) so it is zeroed on drop and never shows up in logs,
//! debug output or serialized configuration dumps.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// A string that zeroes its memory on drop and redacts itself when printed.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	/// Creates a new SecretString from a regular string.
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret string as a string slice.
	///
	/// The returned value must not be logged or stored.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Exposes the secret as raw bytes, e.g. for use as an HMAC key.
	pub fn as_bytes(&self) -> &[u8] {
		self.0.as_bytes()
	}

	/// Returns the length of the secret string.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if the secret string is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString(***REDACTED***)")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "***REDACTED***")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

// Serialized configuration never carries the secret itself.
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str("***REDACTED***")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_secret_is_redacted_in_output() {
		let secret = SecretString::from("session-signing-key");

		assert_eq!(format!("{:?}", secret), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", secret), "***REDACTED***");
		assert_eq!(
			serde_json::to_string(&secret).unwrap(),
			"\"***REDACTED***\""
		);
	}

	#[test]
	fn test_secret_exposes_bytes() {
		let secret = SecretString::from("k3y");
		assert_eq!(secret.expose_secret(), "k3y");
		assert_eq!(secret.as_bytes(), b"k3y");
		assert_eq!(secret.len(), 3);
		assert!(!secret.is_empty());
	}

	#[test]
	fn test_secret_deserializes_plain_string() {
		let secret: SecretString = serde_json::from_str("\"from-config\"").unwrap();
		assert_eq!(secret, SecretString::from("from-config"));
	}
}
