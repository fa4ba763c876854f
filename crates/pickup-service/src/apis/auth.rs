//! Registration and login endpoints.

use crate::apis::Body;
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use pickup_types::{APIError, AuthResponse, LoginRequest, RegisterRequest};

/// Handles POST /api/auth/register requests.
pub async fn handle_register(
	State(state): State<AppState>,
	Body(request): Body<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), APIError> {
	match state.engine.accounts().register(request).await {
		Ok(response) => Ok((StatusCode::CREATED, Json(response))),
		Err(e) => Err(state.error(e)),
	}
}

/// Handles POST /api/auth/login requests.
pub async fn handle_login(
	State(state): State<AppState>,
	Body(request): Body<LoginRequest>,
) -> Result<Json<AuthResponse>, APIError> {
	state
		.engine
		.accounts()
		.login(request)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}
