//! Order handler for placement, retrieval and status changes.
//!
//! Placement re-derives the total from the submitted line items and refuses
//! payloads whose declared total disagrees by a cent or more. The unit prices
//! themselves are taken from the cart as sent.

use crate::state::OrderStateMachine;
use crate::utils::generate_pickup_token;
use crate::EngineError;
use chrono::Utc;
use pickup_auth::Identity;
use pickup_storage::StorageService;
use pickup_types::{
	round_money, truncate_id, Order, OrderStatus, OrderWithOwner, OwnerSummary, PlaceOrderRequest,
	Role, StorageKey, User,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Largest accepted gap between the declared and the computed total.
const TOTAL_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Handler for the order workflow.
pub struct OrderHandler {
	storage: Arc<StorageService>,
	state_machine: Arc<OrderStateMachine>,
	token_length: usize,
}

impl OrderHandler {
	pub fn new(
		storage: Arc<StorageService>,
		state_machine: Arc<OrderStateMachine>,
		token_length: usize,
	) -> Self {
		Self {
			storage,
			state_machine,
			token_length,
		}
	}

	/// Validates a cart and persists it as a pending order.
	///
	/// The order is returned only once it has been written.
	#[instrument(skip_all, fields(user_id = %identity.user_id))]
	pub async fn place_order(
		&self,
		identity: &Identity,
		request: PlaceOrderRequest,
	) -> Result<Order, EngineError> {
		if request.user_id != identity.user_id {
			tracing::warn!(requested = %request.user_id, "Order placed for another user");
			return Err(EngineError::Forbidden("Unauthorized order creation".into()));
		}

		if request.items.is_empty() {
			return Err(EngineError::InvalidOrder(
				"Order must contain at least one item".into(),
			));
		}
		if request
			.items
			.iter()
			.any(|item| item.quantity == 0 || item.unit_price < Decimal::ZERO)
		{
			return Err(EngineError::InvalidOrder(
				"Items need a positive quantity and a non-negative price".into(),
			));
		}

		let computed = request
			.items
			.iter()
			.try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.subtotal()?))
			.ok_or_else(|| EngineError::InvalidOrder("Order total is too large".into()))?;
		let gap = computed
			.checked_sub(request.total)
			.ok_or_else(|| EngineError::InvalidOrder("Order total is too large".into()))?;
		if gap.abs() >= TOTAL_TOLERANCE {
			tracing::warn!(
				declared = %request.total,
				computed = %computed,
				"Order total mismatch"
			);
			return Err(EngineError::InvalidOrder(
				"Order total does not match item prices".into(),
			));
		}

		let order = Order {
			id: Uuid::new_v4(),
			user_id: identity.user_id,
			items: request.items,
			total: round_money(computed),
			status: OrderStatus::Pending,
			token: generate_pickup_token(self.token_length),
			created_at: Utc::now(),
		};

		self.state_machine.store_order(&order).await?;

		tracing::info!(
			order_id = %truncate_id(&order.id.to_string()),
			token = %order.token,
			total = %order.total,
			"Order placed"
		);
		Ok(order)
	}

	/// Loads one order with its owner. Visible to the owner and to admins.
	pub async fn get_order(
		&self,
		identity: &Identity,
		order_id: Uuid,
	) -> Result<OrderWithOwner, EngineError> {
		let order = self.state_machine.get_order(order_id).await?;

		if !identity.is_admin() && order.user_id != identity.user_id {
			return Err(EngineError::Forbidden(
				"Not authorized to view this order".into(),
			));
		}

		let user = self
			.storage
			.find::<User>(StorageKey::Users.as_str(), &order.user_id.to_string())
			.await?
			.map(|user| OwnerSummary {
				name: user.name,
				phone: user.phone,
			});

		Ok(OrderWithOwner { order, user })
	}

	/// Lists the caller's own orders, newest first.
	pub async fn list_orders_for_user(&self, identity: &Identity) -> Result<Vec<Order>, EngineError> {
		let mut orders: Vec<Order> = self
			.storage
			.list::<Order>(StorageKey::Orders.as_str())
			.await?
			.into_iter()
			.filter(|order| order.user_id == identity.user_id)
			.collect();
		sort_newest_first(&mut orders);
		Ok(orders)
	}

	/// Lists every order with its owner, newest first. Admin only.
	pub async fn list_all_orders(
		&self,
		identity: &Identity,
	) -> Result<Vec<OrderWithOwner>, EngineError> {
		identity.require_role(Role::Admin)?;
		load_orders_with_owners(&self.storage).await
	}

	/// Sets the status of an order. Admin only.
	///
	/// The label is checked before the order is looked up, so an unknown
	/// label is reported even for a missing order.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order_id.to_string())))]
	pub async fn set_status(
		&self,
		identity: &Identity,
		order_id: Uuid,
		label: &str,
	) -> Result<Order, EngineError> {
		identity.require_role(Role::Admin)?;
		let status: OrderStatus = label.parse()?;
		self.state_machine
			.transition_order_status(order_id, status)
			.await
	}
}

fn sort_newest_first(orders: &mut [Order]) {
	orders.sort_by(|a, b| {
		b.created_at
			.cmp(&a.created_at)
			.then_with(|| b.id.cmp(&a.id))
	});
}

/// Loads all orders joined with their owners, newest first.
pub(crate) async fn load_orders_with_owners(
	storage: &StorageService,
) -> Result<Vec<OrderWithOwner>, EngineError> {
	let mut orders: Vec<Order> = storage.list(StorageKey::Orders.as_str()).await?;
	sort_newest_first(&mut orders);

	let owners: HashMap<Uuid, OwnerSummary> = storage
		.list::<User>(StorageKey::Users.as_str())
		.await?
		.into_iter()
		.map(|user| {
			(
				user.id,
				OwnerSummary {
					name: user.name,
					phone: user.phone,
				},
			)
		})
		.collect();

	Ok(orders
		.into_iter()
		.map(|order| {
			let user = owners.get(&order.user_id).cloned();
			OrderWithOwner { order, user }
		})
		.collect())
}
