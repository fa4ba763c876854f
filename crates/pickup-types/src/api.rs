//! API types for the pickup HTTP API.
//!
//! This module defines the request and response bodies of the `/api`
//! endpoints and the structured error type every handler returns.

use crate::{LineItem, PublicUser};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
	#[validate(length(min = 1, message = "Name is required"))]
	#[serde(default)]
	pub name: String,
	#[validate(length(min = 1, message = "Email is required"))]
	#[serde(default)]
	pub email: String,
	#[validate(length(min = 1, message = "Phone is required"))]
	#[serde(default)]
	pub phone: String,
	#[validate(length(min = 1, message = "Password is required"))]
	#[serde(default)]
	pub password: String,
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
	#[validate(length(min = 1, message = "Phone is required"))]
	#[serde(default)]
	pub phone: String,
	#[validate(length(min = 1, message = "Password is required"))]
	#[serde(default)]
	pub password: String,
}

/// Response of both auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
	pub user: PublicUser,
	/// Signed session credential, sent back as `Authorization: Bearer <token>`.
	pub token: String,
}

/// Request body for `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
	#[serde(default)]
	pub items: Vec<LineItem>,
	/// Total computed by the client; checked against the server-side sum.
	#[serde(with = "rust_decimal::serde::float")]
	pub total: Decimal,
	pub user_id: Uuid,
}

/// Request body for `PUT /api/admin/orders/{id}/status`.
///
/// The status is kept as a raw label so unknown values reach the engine and
/// are reported as an invalid status rather than a body decoding failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
	pub status: String,
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
	pub message: String,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional diagnostic context, only populated outside production.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed input, conflicts and domain rule violations (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Missing, malformed or expired session credential (401)
	Unauthorized { error_type: String, message: String },
	/// Authenticated but not permitted (403)
	Forbidden { error_type: String, message: String },
	/// Missing resource (404)
	NotFound { error_type: String, message: String },
	/// Storage or unexpected failure (500)
	InternalServerError {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Unauthorized { .. } => 401,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			}
			| APIError::InternalServerError {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::Unauthorized {
				error_type,
				message,
			}
			| APIError::Forbidden {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}

	/// Drops diagnostic details, used when running in production mode.
	pub fn without_details(self) -> Self {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				..
			} => APIError::BadRequest {
				error_type,
				message,
				details: None,
			},
			APIError::InternalServerError {
				error_type,
				message,
				..
			} => APIError::InternalServerError {
				error_type,
				message,
				details: None,
			},
			other => other,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::Unauthorized { message, .. } => write!(f, "Unauthorized: {}", message),
			APIError::Forbidden { message, .. } => write!(f, "Forbidden: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}
