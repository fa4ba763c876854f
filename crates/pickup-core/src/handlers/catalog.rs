//! Catalog handler for the product menu.

use crate::EngineError;
use pickup_auth::Identity;
use pickup_storage::{StorageError, StorageService};
use pickup_types::{Product, ProductInput, Role, StorageKey};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Handler for reading and managing catalog products.
///
/// Reads are public; writes require the admin role.
pub struct CatalogHandler {
	storage: Arc<StorageService>,
}

impl CatalogHandler {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Lists all products sorted by name.
	pub async fn list_products(&self) -> Result<Vec<Product>, EngineError> {
		let mut products: Vec<Product> = self.storage.list(StorageKey::Products.as_str()).await?;
		products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
		Ok(products)
	}

	pub async fn get_product(&self, id: Uuid) -> Result<Product, EngineError> {
		self.storage
			.retrieve(StorageKey::Products.as_str(), &id.to_string())
			.await
			.map_err(not_found)
	}

	pub async fn create_product(
		&self,
		identity: &Identity,
		input: ProductInput,
	) -> Result<Product, EngineError> {
		identity.require_role(Role::Admin)?;
		let input = validate(input)?;

		let product = Product::from_input(input);
		self.storage
			.store(
				StorageKey::Products.as_str(),
				&product.id.to_string(),
				&product,
			)
			.await?;

		tracing::info!(product_id = %product.id, name = %product.name, "Created product");
		Ok(product)
	}

	pub async fn update_product(
		&self,
		identity: &Identity,
		id: Uuid,
		input: ProductInput,
	) -> Result<Product, EngineError> {
		identity.require_role(Role::Admin)?;
		let input = validate(input)?;

		let mut product = self.get_product(id).await?;
		product.apply(input);
		self.storage
			.update(StorageKey::Products.as_str(), &id.to_string(), &product)
			.await
			.map_err(not_found)?;

		tracing::info!(product_id = %id, "Updated product");
		Ok(product)
	}

	/// Deletes a product. Orders keep their own snapshot, so history is unaffected.
	pub async fn delete_product(&self, identity: &Identity, id: Uuid) -> Result<(), EngineError> {
		identity.require_role(Role::Admin)?;

		if !self
			.storage
			.exists(StorageKey::Products.as_str(), &id.to_string())
			.await?
		{
			return Err(EngineError::NotFound("Product".into()));
		}

		self.storage
			.remove(StorageKey::Products.as_str(), &id.to_string())
			.await?;

		tracing::info!(product_id = %id, "Deleted product");
		Ok(())
	}
}

fn validate(input: ProductInput) -> Result<ProductInput, EngineError> {
	let input = ProductInput {
		name: input.name.trim().to_string(),
		..input
	};
	input.validate()?;
	if input.price < Decimal::ZERO {
		return Err(EngineError::Validation(
			"Price cannot be negative".into(),
		));
	}
	Ok(input)
}

fn not_found(err: StorageError) -> EngineError {
	match err {
		StorageError::NotFound => EngineError::NotFound("Product".into()),
		other => other.into(),
	}
}
