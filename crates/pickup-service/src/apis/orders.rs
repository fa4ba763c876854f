//! Customer order endpoints.

use crate::apis::{Body, Caller, ResourceId};
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use pickup_types::{APIError, Order, OrderWithOwner, PlaceOrderRequest};

/// Handles POST /api/orders requests.
///
/// Responds 201 with the stored order, including its pickup token.
pub async fn handle_place_order(
	State(state): State<AppState>,
	Caller(identity): Caller,
	Body(request): Body<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	match state.engine.orders().place_order(&identity, request).await {
		Ok(order) => Ok((StatusCode::CREATED, Json(order))),
		Err(e) => {
			tracing::warn!(user_id = %identity.user_id, "Order placement failed: {}", e);
			Err(state.error(e))
		},
	}
}

/// Handles GET /api/orders/user requests.
pub async fn handle_list_user_orders(
	State(state): State<AppState>,
	Caller(identity): Caller,
) -> Result<Json<Vec<Order>>, APIError> {
	state
		.engine
		.orders()
		.list_orders_for_user(&identity)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}

/// Handles GET /api/orders/{id} requests.
pub async fn handle_get_order(
	ResourceId(id): ResourceId,
	State(state): State<AppState>,
	Caller(identity): Caller,
) -> Result<Json<OrderWithOwner>, APIError> {
	state
		.engine
		.orders()
		.get_order(&identity, id)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}
