//! Order state machine implementation.
//!
//! Under the linear policy orders move one step at a time through
//! Pending -> Preparing -> Ready -> Completed. The permissive policy accepts
//! any known status, matching how the storefront behaved before transitions
//! were enforced.

use crate::EngineError;
use once_cell::sync::Lazy;
use pickup_config::TransitionPolicy;
use pickup_storage::{StorageError, StorageService};
use pickup_types::{truncate_id, Order, OrderStatus, StorageKey};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Manages order status transitions and persistence.
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
	policy: TransitionPolicy,
}

impl OrderStateMachine {
	pub fn new(storage: Arc<StorageService>, policy: TransitionPolicy) -> Self {
		Self { storage, policy }
	}

	/// Loads an order, mapping a missing record to `NotFound`.
	pub async fn get_order(&self, order_id: Uuid) -> Result<Order, EngineError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), &order_id.to_string())
			.await
			.map_err(|e| match e {
				StorageError::NotFound => EngineError::NotFound("Order".into()),
				other => other.into(),
			})
	}

	/// Stores a new order.
	pub async fn store_order(&self, order: &Order) -> Result<(), EngineError> {
		self.storage
			.store(StorageKey::Orders.as_str(), &order.id.to_string(), order)
			.await?;
		Ok(())
	}

	/// Transitions an order to a new status with validation.
	///
	/// Only `status` changes. Two concurrent transitions of the same order
	/// race, and the later write wins.
	pub async fn transition_order_status(
		&self,
		order_id: Uuid,
		new_status: OrderStatus,
	) -> Result<Order, EngineError> {
		let mut order = self.get_order(order_id).await?;

		if !self.is_valid_transition(order.status, new_status) {
			return Err(EngineError::InvalidTransition {
				from: order.status,
				to: new_status,
			});
		}

		let previous = order.status;
		order.status = new_status;

		self.storage
			.update(StorageKey::Orders.as_str(), &order_id.to_string(), &order)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => EngineError::NotFound("Order".into()),
				other => other.into(),
			})?;

		tracing::info!(
			order_id = %truncate_id(&order_id.to_string()),
			from = %previous,
			to = %new_status,
			"Order status updated"
		);

		Ok(order)
	}

	/// Checks if a state transition is allowed under the configured policy.
	pub fn is_valid_transition(&self, from: OrderStatus, to: OrderStatus) -> bool {
		// Static transition table - each state maps to allowed next states
		static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
			let mut m = HashMap::new();
			m.insert(
				OrderStatus::Pending,
				HashSet::from([OrderStatus::Preparing]),
			);
			m.insert(OrderStatus::Preparing, HashSet::from([OrderStatus::Ready]));
			m.insert(OrderStatus::Ready, HashSet::from([OrderStatus::Completed]));
			m.insert(OrderStatus::Completed, HashSet::new()); // terminal
			m
		});

		match self.policy {
			TransitionPolicy::Permissive => true,
			TransitionPolicy::Linear => TRANSITIONS
				.get(&from)
				.is_some_and(|set| set.contains(&to)),
		}
	}
}
