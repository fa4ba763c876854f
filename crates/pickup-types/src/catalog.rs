//! Menu product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A catalog entry. Orders copy a snapshot of it at creation time, so edits
/// here never alter historical orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	pub id: Uuid,
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(with = "rust_decimal::serde::float")]
	pub price: Decimal,
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub image_url: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// Request body for creating or replacing a product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductInput {
	#[validate(length(min = 1, message = "Product name is required"))]
	pub name: String,
	#[serde(default)]
	pub description: String,
	#[serde(with = "rust_decimal::serde::float")]
	pub price: Decimal,
	#[serde(default)]
	pub category: String,
	#[serde(default)]
	pub image_url: Option<String>,
}

impl Product {
	/// Builds a new product from validated input.
	pub fn from_input(input: ProductInput) -> Self {
		Self {
			id: Uuid::new_v4(),
			name: input.name,
			description: input.description,
			price: input.price,
			category: input.category,
			image_url: input.image_url,
			created_at: Utc::now(),
		}
	}

	/// Replaces every editable field, keeping identity and creation time.
	pub fn apply(&mut self, input: ProductInput) {
		self.name = input.name;
		self.description = input.description;
		self.price = input.price;
		self.category = input.category;
		self.image_url = input.image_url;
	}
}
