//! Route handlers for the pickup HTTP API.
//!
//! Handlers are thin: they extract the caller and the body, call into the
//! engine and translate [`EngineError`] into [`APIError`]. Authorization is
//! decided by the engine, never here.

use crate::server::AppState;
use axum::{
	extract::{FromRequest, FromRequestParts, Path, Request},
	http::header::AUTHORIZATION,
	http::request::Parts,
	Json,
};
use pickup_auth::Identity;
use pickup_core::EngineError;
use pickup_types::{
	APIError, LoginRequest, PlaceOrderRequest, ProductInput, RegisterRequest, UpdateStatusRequest,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

pub mod admin;
pub mod auth;
pub mod orders;
pub mod products;

/// The authenticated caller of a request.
///
/// Extracting it verifies the bearer credential; requests without a valid
/// one are rejected with 401 before the handler runs.
pub struct Caller(pub Identity);

impl FromRequestParts<AppState> for Caller {
	type Rejection = APIError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		let authorization = parts
			.headers
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok());

		state
			.engine
			.authenticate(authorization)
			.map(Caller)
			.map_err(|e| state.error(e))
	}
}

/// A JSON request body the engine accepts.
///
/// Bodies that fail to decode are reported through the same error mapping
/// as engine failures, so clients always get a JSON error with status 400.
pub trait RequestBody: DeserializeOwned + Send {
	/// Error reported when the body cannot be decoded.
	fn rejected(reason: String) -> EngineError {
		EngineError::Validation(reason)
	}
}

impl RequestBody for RegisterRequest {}
impl RequestBody for LoginRequest {}
impl RequestBody for ProductInput {}
impl RequestBody for UpdateStatusRequest {}

impl RequestBody for PlaceOrderRequest {
	fn rejected(reason: String) -> EngineError {
		EngineError::InvalidOrder(reason)
	}
}

/// Decoded JSON body of a request.
pub struct Body<T>(pub T);

impl<T: RequestBody> FromRequest<AppState> for Body<T> {
	type Rejection = APIError;

	async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
		match Json::<T>::from_request(req, state).await {
			Ok(Json(value)) => Ok(Body(value)),
			Err(rejection) => Err(state.error(T::rejected(rejection.body_text()))),
		}
	}
}

/// Resource id taken from the request path.
pub struct ResourceId(pub Uuid);

impl FromRequestParts<AppState> for ResourceId {
	type Rejection = APIError;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &AppState,
	) -> Result<Self, Self::Rejection> {
		Path::<Uuid>::from_request_parts(parts, state)
			.await
			.map(|Path(id)| ResourceId(id))
			.map_err(|rejection| state.error(EngineError::Validation(rejection.body_text())))
	}
}

/// Maps an engine failure onto its HTTP representation.
///
/// Storage and internal failures get a generic message; the underlying cause
/// travels in `details`, which the caller strips in production.
pub fn to_api_error(err: EngineError) -> APIError {
	match err {
		EngineError::Validation(message) => bad_request("VALIDATION_ERROR", message),
		EngineError::Conflict(message) => bad_request("CONFLICT", message),
		EngineError::InvalidCredentials => bad_request("INVALID_CREDENTIALS", err.to_string()),
		EngineError::InvalidOrder(message) => bad_request("INVALID_ORDER", message),
		EngineError::InvalidStatus(_) => bad_request("INVALID_STATUS", err.to_string()),
		EngineError::InvalidTransition { from, to } => APIError::BadRequest {
			error_type: "INVALID_TRANSITION".to_string(),
			message: err.to_string(),
			details: Some(json!({ "from": from, "to": to })),
		},
		EngineError::Unauthenticated(_) => APIError::Unauthorized {
			error_type: "UNAUTHENTICATED".to_string(),
			message: err.to_string(),
		},
		EngineError::Forbidden(message) => APIError::Forbidden {
			error_type: "FORBIDDEN".to_string(),
			message,
		},
		EngineError::NotFound(_) => APIError::NotFound {
			error_type: "NOT_FOUND".to_string(),
			message: err.to_string(),
		},
		EngineError::Storage(cause) => APIError::InternalServerError {
			error_type: "STORAGE_ERROR".to_string(),
			message: "The request could not be completed".to_string(),
			details: Some(json!({ "cause": cause })),
		},
		EngineError::Internal(cause) => APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message: "Internal server error".to_string(),
			details: Some(json!({ "cause": cause })),
		},
	}
}

fn bad_request(error_type: &str, message: String) -> APIError {
	APIError::BadRequest {
		error_type: error_type.to_string(),
		message,
		details: None,
	}
}
