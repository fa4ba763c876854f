//! Order types for the pickup system.
//!
//! This module defines the placed order, its embedded line item snapshot and
//! the fulfillment status that staff advance from `pending` to `completed`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// One cart entry copied into the order at creation time.
///
/// Field names on the wire follow the cart payload sent by the web client
/// (`id`, `price`), which is why they differ from the Rust names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
	/// Identity of the product this entry was copied from.
	#[serde(rename = "id", alias = "product_id")]
	pub product_id: Uuid,
	pub name: String,
	/// Unit price at the time the order was placed.
	#[serde(
		rename = "price",
		alias = "unit_price",
		with = "rust_decimal::serde::float"
	)]
	pub unit_price: Decimal,
	pub quantity: u32,
	#[serde(default)]
	pub image_url: Option<String>,
}

impl LineItem {
	/// Returns `unit_price * quantity`, or `None` if it does not fit a `Decimal`.
	pub fn subtotal(&self) -> Option<Decimal> {
		self.unit_price.checked_mul(Decimal::from(self.quantity))
	}
}

/// Fulfillment status of an order.
///
/// The variants are declared in pipeline order, so `Ord` follows the
/// sequence `pending < preparing < ready < completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// Order was placed and is waiting for the kitchen.
	Pending,
	/// Kitchen is working on the order.
	Preparing,
	/// Order is waiting at the counter for pickup.
	Ready,
	/// Order was handed over to the customer.
	Completed,
}

/// Error returned when a status label is not one of the known four.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
	/// Returns the wire label of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "pending",
			OrderStatus::Preparing => "preparing",
			OrderStatus::Ready => "ready",
			OrderStatus::Completed => "completed",
		}
	}

	/// Returns an iterator over all statuses in pipeline order.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Pending,
			Self::Preparing,
			Self::Ready,
			Self::Completed,
		]
		.into_iter()
	}

	/// Returns the status that directly follows this one, if any.
	pub fn next(&self) -> Option<Self> {
		match self {
			OrderStatus::Pending => Some(OrderStatus::Preparing),
			OrderStatus::Preparing => Some(OrderStatus::Ready),
			OrderStatus::Ready => Some(OrderStatus::Completed),
			OrderStatus::Completed => None,
		}
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = UnknownStatus;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"preparing" => Ok(Self::Preparing),
			"ready" => Ok(Self::Ready),
			"completed" => Ok(Self::Completed),
			other => Err(UnknownStatus(other.to_string())),
		}
	}
}

/// A placed cart.
///
/// Everything but `status` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: Uuid,
	/// Owning user.
	pub user_id: Uuid,
	/// Snapshot of the cart at placement time.
	pub items: Vec<LineItem>,
	/// Server-computed total, rounded to two decimal places.
	#[serde(with = "rust_decimal::serde::float")]
	pub total: Decimal,
	/// Current fulfillment status.
	pub status: OrderStatus,
	/// Short code shown to the customer and staff at handoff.
	pub token: String,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
}

/// Minimal owner identity attached to orders shown to staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
	pub name: String,
	pub phone: String,
}

/// Order joined with its owner for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWithOwner {
	#[serde(flatten)]
	pub order: Order,
	/// `None` when the owning user record is missing.
	pub user: Option<OwnerSummary>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_order_follows_pipeline() {
		let statuses: Vec<_> = OrderStatus::all().collect();
		let mut sorted = statuses.clone();
		sorted.sort();
		assert_eq!(statuses, sorted);
		assert_eq!(OrderStatus::Pending.next(), Some(OrderStatus::Preparing));
		assert_eq!(OrderStatus::Completed.next(), None);
	}

	#[test]
	fn test_status_labels() {
		for status in OrderStatus::all() {
			assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
			assert_eq!(
				serde_json::to_string(&status).unwrap(),
				format!("\"{}\"", status)
			);
		}

		let err = "cancelled".parse::<OrderStatus>().unwrap_err();
		assert_eq!(err, UnknownStatus("cancelled".into()));
		assert!("Pending".parse::<OrderStatus>().is_err());
	}

	#[test]
	fn test_line_item_accepts_cart_payload() {
		let item: LineItem = serde_json::from_str(
			r#"{
				"id": "6f2c9a1e-4a0b-4d8e-9c47-1f0d6c2b8a11",
				"name": "Paneer Wrap",
				"price": 10,
				"quantity": 2,
				"image_url": null
			}"#,
		)
		.unwrap();

		assert_eq!(item.unit_price, Decimal::new(10, 0));
		assert_eq!(item.subtotal(), Some(Decimal::new(20, 0)));

		let overflowing = LineItem {
			unit_price: Decimal::MAX,
			..item
		};
		assert_eq!(overflowing.subtotal(), None);
	}

	#[test]
	fn test_order_with_owner_flattens() {
		let order = Order {
			id: Uuid::new_v4(),
			user_id: Uuid::new_v4(),
			items: vec![],
			total: Decimal::new(2500, 2),
			status: OrderStatus::Ready,
			token: "AB12CD".into(),
			created_at: Utc::now(),
		};
		let joined = OrderWithOwner {
			order,
			user: Some(OwnerSummary {
				name: "Ada".into(),
				phone: "5550001".into(),
			}),
		};

		let json = serde_json::to_value(&joined).unwrap();
		assert_eq!(json["status"], "ready");
		assert_eq!(json["token"], "AB12CD");
		assert_eq!(json["total"], 25.0);
		assert_eq!(json["user"]["name"], "Ada");
	}
}
