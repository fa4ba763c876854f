//! HTTP server for the pickup API.
//!
//! Builds the axum router over a shared [`PickupEngine`] and serves it until
//! Ctrl+C is received.

use crate::apis::{admin, auth, orders, products, to_api_error};
use axum::{
	extract::DefaultBodyLimit,
	http::{HeaderName, HeaderValue, Method},
	response::Json,
	routing::{get, post, put},
	Router,
};
use pickup_config::{ApiConfig, CorsConfig};
use pickup_core::{EngineError, PickupEngine};
use pickup_types::APIError;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, Any, CorsLayer},
	trace::TraceLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the engine processing every request.
	pub engine: Arc<PickupEngine>,
	/// Whether error responses keep their diagnostic details.
	pub expose_error_details: bool,
}

impl AppState {
	pub fn new(engine: Arc<PickupEngine>, expose_error_details: bool) -> Self {
		Self {
			engine,
			expose_error_details,
		}
	}

	/// Converts an engine failure into the response sent to the client.
	pub fn error(&self, err: EngineError) -> APIError {
		match &err {
			EngineError::Storage(_) | EngineError::Internal(_) => {
				tracing::error!(error = %err, "Request failed");
			},
			_ => tracing::debug!(error = %err, "Request rejected"),
		}

		let api_error = to_api_error(err);
		if self.expose_error_details {
			api_error
		} else {
			api_error.without_details()
		}
	}
}

/// Builds the router with every `/api` route plus `/health`.
pub fn build_router(state: AppState, api_config: &ApiConfig) -> Router {
	let api = Router::new()
		.route("/auth/register", post(auth::handle_register))
		.route("/auth/login", post(auth::handle_login))
		.route(
			"/products",
			get(products::handle_list_products).post(products::handle_create_product),
		)
		.route(
			"/products/{id}",
			get(products::handle_get_product)
				.put(products::handle_update_product)
				.delete(products::handle_delete_product),
		)
		.route("/orders", post(orders::handle_place_order))
		.route("/orders/user", get(orders::handle_list_user_orders))
		.route("/orders/{id}", get(orders::handle_get_order))
		.route("/admin/orders", get(admin::handle_list_orders))
		.route("/admin/orders/{id}/status", put(admin::handle_update_status))
		.route("/admin/dashboard", get(admin::handle_dashboard))
		.route("/admin/financials", get(admin::handle_financials))
		.route("/admin/users", get(admin::handle_list_users));

	Router::new()
		.route("/health", get(handle_health))
		.nest("/api", api)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api_config.cors.as_ref()))
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<PickupEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let state = AppState::new(engine, api_config.expose_error_details);
	let app = build_router(state, &api_config);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Pickup API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal");
		return;
	}
	tracing::info!("Shutdown signal received");
}

/// Handles GET /health requests.
async fn handle_health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

/// Builds the CORS layer. Without a `[api.cors]` section every origin is
/// allowed, matching a development setup with the web client on another port.
fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	let Some(cors) = cors else {
		return CorsLayer::permissive();
	};

	let mut layer = CorsLayer::new();

	layer = if cors.allowed_origins.iter().any(|origin| origin == "*") {
		layer.allow_origin(Any)
	} else {
		let origins: Vec<HeaderValue> = cors
			.allowed_origins
			.iter()
			.filter_map(|origin| parse_or_warn(origin, "origin", |s| s.parse().ok()))
			.collect();
		layer.allow_origin(AllowOrigin::list(origins))
	};

	layer = if cors.allowed_methods.iter().any(|method| method == "*") {
		layer.allow_methods(Any)
	} else {
		let methods: Vec<Method> = cors
			.allowed_methods
			.iter()
			.filter_map(|method| {
				parse_or_warn(method, "method", |s| s.to_uppercase().parse().ok())
			})
			.collect();
		layer.allow_methods(methods)
	};

	if cors.allowed_headers.iter().any(|header| header == "*") {
		layer.allow_headers(Any)
	} else {
		let headers: Vec<HeaderName> = cors
			.allowed_headers
			.iter()
			.filter_map(|header| parse_or_warn(header, "header", |s| s.parse().ok()))
			.collect();
		layer.allow_headers(headers)
	}
}

fn parse_or_warn<T>(value: &str, kind: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
	let parsed = parse(value);
	if parsed.is_none() {
		tracing::warn!(kind = %kind, value = %value, "Ignoring invalid CORS entry");
	}
	parsed
}
