//! Signed session tokens.
//!
//! Tokens use the compact JWT layout with HS256, so any JWT library can read
//! them: `base64url(header).base64url(claims).base64url(signature)`.

use crate::{bearer_token, AuthError, Identity};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use pickup_config::AuthConfig;
use pickup_types::{Role, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
	alg: String,
	typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
	id: Uuid,
	role: Role,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	name: Option<String>,
	iat: i64,
	exp: i64,
}

/// Issues and checks session tokens signed with the configured secret.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
	secret: SecretString,
	ttl: Duration,
}

impl SessionIssuer {
	pub fn new(secret: SecretString, ttl: Duration) -> Self {
		Self { secret, ttl }
	}

	pub fn from_config(config: &AuthConfig) -> Self {
		Self::new(
			config.jwt_secret.clone(),
			Duration::days(i64::from(config.session_ttl_days)),
		)
	}

	/// Issues a token for `identity`, valid from `now` for the configured lifetime.
	pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, AuthError> {
		let header = Header {
			alg: ALGORITHM.to_string(),
			typ: "JWT".to_string(),
		};
		let claims = Claims {
			id: identity.user_id,
			role: identity.role,
			name: identity.name.clone(),
			iat: now.timestamp(),
			exp: (now + self.ttl).timestamp(),
		};

		let signing_input = format!("{}.{}", encode_part(&header)?, encode_part(&claims)?);
		let signature = self.mac(&signing_input)?.finalize().into_bytes();

		Ok(format!(
			"{}.{}",
			signing_input,
			URL_SAFE_NO_PAD.encode(signature)
		))
	}

	/// Verifies a token and returns the identity it carries.
	pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
		let mut parts = token.split('.');
		let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
			(parts.next(), parts.next(), parts.next(), parts.next())
		else {
			return Err(AuthError::MalformedToken("expected three segments".into()));
		};

		let header: Header = decode_part(header_b64)?;
		if header.alg != ALGORITHM {
			return Err(AuthError::MalformedToken(format!(
				"unsupported algorithm '{}'",
				header.alg
			)));
		}

		let signature = URL_SAFE_NO_PAD
			.decode(signature_b64)
			.map_err(|e| AuthError::MalformedToken(e.to_string()))?;
		let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
		self.mac(signing_input)?
			.verify_slice(&signature)
			.map_err(|_| AuthError::InvalidSignature)?;

		let claims: Claims = decode_part(claims_b64)?;
		if claims.exp <= now.timestamp() {
			return Err(AuthError::Expired);
		}

		Ok(Identity {
			user_id: claims.id,
			role: claims.role,
			name: claims.name,
		})
	}

	/// Verifies the bearer credential from an `Authorization` header value.
	pub fn authenticate(
		&self,
		authorization: Option<&str>,
		now: DateTime<Utc>,
	) -> Result<Identity, AuthError> {
		let token = bearer_token(authorization)?;
		self.verify(token, now).inspect_err(|e| {
			tracing::debug!(error = %e, "Rejected session token");
		})
	}

	fn mac(&self, signing_input: &str) -> Result<HmacSha256, AuthError> {
		let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
			.map_err(|e| AuthError::InvalidKey(e.to_string()))?;
		mac.update(signing_input.as_bytes());
		Ok(mac)
	}
}

fn encode_part<T: Serialize>(value: &T) -> Result<String, AuthError> {
	let json = serde_json::to_vec(value).map_err(|e| AuthError::MalformedToken(e.to_string()))?;
	Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_part<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, AuthError> {
	let bytes = URL_SAFE_NO_PAD
		.decode(segment)
		.map_err(|e| AuthError::MalformedToken(e.to_string()))?;
	serde_json::from_slice(&bytes).map_err(|e| AuthError::MalformedToken(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	fn issuer() -> SessionIssuer {
		SessionIssuer::new(
			SecretString::from("unit-test-signing-secret"),
			Duration::days(7),
		)
	}

	fn at(day: u32) -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
	}

	#[test]
	fn test_issue_and_verify() {
		let identity = Identity::new(Uuid::new_v4(), Role::Admin).with_name("Asha");
		let token = issuer().issue(&identity, at(1)).unwrap();

		assert_eq!(token.split('.').count(), 3);
		assert_eq!(issuer().verify(&token, at(2)).unwrap(), identity);
	}

	#[test]
	fn test_header_is_standard_jwt() {
		let token = issuer()
			.issue(&Identity::new(Uuid::new_v4(), Role::Customer), at(1))
			.unwrap();
		let header = token.split('.').next().unwrap();
		let decoded = URL_SAFE_NO_PAD.decode(header).unwrap();
		let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
		assert_eq!(json["alg"], "HS256");
		assert_eq!(json["typ"], "JWT");
	}

	#[test]
	fn test_expired_token_rejected() {
		let token = issuer()
			.issue(&Identity::new(Uuid::new_v4(), Role::Customer), at(1))
			.unwrap();

		assert!(issuer().verify(&token, at(7)).is_ok());
		assert!(matches!(
			issuer().verify(&token, at(8)),
			Err(AuthError::Expired)
		));
	}

	#[test]
	fn test_tampered_claims_rejected() {
		let token = issuer()
			.issue(&Identity::new(Uuid::new_v4(), Role::Customer), at(1))
			.unwrap();
		let parts: Vec<&str> = token.split('.').collect();

		let forged_claims = serde_json::json!({
			"id": Uuid::new_v4(),
			"role": "admin",
			"iat": at(1).timestamp(),
			"exp": at(20).timestamp(),
		});
		let forged = format!(
			"{}.{}.{}",
			parts[0],
			URL_SAFE_NO_PAD.encode(forged_claims.to_string()),
			parts[2]
		);

		assert!(matches!(
			issuer().verify(&forged, at(2)),
			Err(AuthError::InvalidSignature)
		));
	}

	#[test]
	fn test_other_secret_rejected() {
		let token = issuer()
			.issue(&Identity::new(Uuid::new_v4(), Role::Customer), at(1))
			.unwrap();
		let other = SessionIssuer::new(SecretString::from("another-secret"), Duration::days(7));

		assert!(matches!(
			other.verify(&token, at(2)),
			Err(AuthError::InvalidSignature)
		));
	}

	#[test]
	fn test_garbage_rejected() {
		assert!(matches!(
			issuer().verify("not-a-token", at(1)),
			Err(AuthError::MalformedToken(_))
		));
		assert!(matches!(
			issuer().verify("a.b.c.d", at(1)),
			Err(AuthError::MalformedToken(_))
		));
	}

	#[test]
	fn test_authenticate_header() {
		let identity = Identity::new(Uuid::new_v4(), Role::Customer);
		let token = issuer().issue(&identity, at(1)).unwrap();
		let header = format!("Bearer {}", token);

		assert_eq!(
			issuer().authenticate(Some(&header), at(1)).unwrap(),
			identity
		);
		assert!(matches!(
			issuer().authenticate(None, at(1)),
			Err(AuthError::MissingToken)
		));
	}
}
