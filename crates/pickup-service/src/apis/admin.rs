//! Admin endpoints: order fulfillment and reporting.

use crate::apis::{Body, Caller, ResourceId};
use crate::server::AppState;
use axum::{extract::State, response::Json};
use chrono::Utc;
use pickup_types::{
	APIError, Dashboard, Financials, Order, OrderWithOwner, UpdateStatusRequest, UserSummary,
};

/// Handles GET /api/admin/orders requests.
pub async fn handle_list_orders(
	State(state): State<AppState>,
	Caller(identity): Caller,
) -> Result<Json<Vec<OrderWithOwner>>, APIError> {
	state
		.engine
		.orders()
		.list_all_orders(&identity)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}

/// Handles PUT /api/admin/orders/{id}/status requests.
pub async fn handle_update_status(
	ResourceId(id): ResourceId,
	State(state): State<AppState>,
	Caller(identity): Caller,
	Body(request): Body<UpdateStatusRequest>,
) -> Result<Json<Order>, APIError> {
	match state
		.engine
		.orders()
		.set_status(&identity, id, &request.status)
		.await
	{
		Ok(order) => Ok(Json(order)),
		Err(e) => {
			tracing::warn!(order_id = %id, status = %request.status, "Status update failed: {}", e);
			Err(state.error(e))
		},
	}
}

/// Handles GET /api/admin/dashboard requests.
pub async fn handle_dashboard(
	State(state): State<AppState>,
	Caller(identity): Caller,
) -> Result<Json<Dashboard>, APIError> {
	state
		.engine
		.reporting()
		.dashboard(&identity)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}

/// Handles GET /api/admin/financials requests.
pub async fn handle_financials(
	State(state): State<AppState>,
	Caller(identity): Caller,
) -> Result<Json<Financials>, APIError> {
	state
		.engine
		.reporting()
		.financials(&identity, Utc::now())
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}

/// Handles GET /api/admin/users requests.
pub async fn handle_list_users(
	State(state): State<AppState>,
	Caller(identity): Caller,
) -> Result<Json<Vec<UserSummary>>, APIError> {
	state
		.engine
		.reporting()
		.list_users(&identity)
		.await
		.map(Json)
		.map_err(|e| state.error(e))
}
