//! Catalog endpoints. Reads are public, writes need an admin credential.

use crate::apis::{Body, Caller, ResourceId};
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use pickup_types::{APIError, MessageResponse, Product, ProductInput};

/// Handles GET /api/products requests.
pub async fn handle_list_products(
	State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, APIError> {
	state
		.engine
		.catalog()
		.list_products()
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}

/// Handles GET /api/products/{id} requests.
pub async fn handle_get_product(
	ResourceId(id): ResourceId,
	State(state): State<AppState>,
) -> Result<Json<Product>, APIError> {
	state
		.engine
		.catalog()
		.get_product(id)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}

/// Handles POST /api/products requests.
pub async fn handle_create_product(
	State(state): State<AppState>,
	Caller(identity): Caller,
	Body(input): Body<ProductInput>,
) -> Result<(StatusCode, Json<Product>), APIError> {
	match state.engine.catalog().create_product(&identity, input).await {
		Ok(product) => Ok((StatusCode::CREATED, Json(product))),
		Err(e) => Err(state.error(e)),
	}
}

/// Handles PUT /api/products/{id} requests.
pub async fn handle_update_product(
	ResourceId(id): ResourceId,
	State(state): State<AppState>,
	Caller(identity): Caller,
	Body(input): Body<ProductInput>,
) -> Result<Json<Product>, APIError> {
	state
		.engine
		.catalog()
		.update_product(&identity, id, input)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}

/// Handles DELETE /api/products/{id} requests.
pub async fn handle_delete_product(
	ResourceId(id): ResourceId,
	State(state): State<AppState>,
	Caller(identity): Caller,
) -> Result<Json<MessageResponse>, APIError> {
	state
		.engine
		.catalog()
		.delete_product(&identity, id)
		.await
		.map_err(|e| state.error(e))?;

	Ok(Json(MessageResponse {
		message: "Product deleted successfully".to_string(),
	}))
}
