//! # Catalog
//!
//! Categories and products, the storage contract shared by the backends, and
//! the [`Catalog`] facade that keeps image blobs in step with the products
//! that own them.
//!
//! - `json_store`: two JSON documents with persisted id counters
//! - `pg_store`: PostgreSQL tables with cascading foreign keys
//! - `service`: store + image store side effects (cascade image cleanup)
//! - `validation`: text and price rules applied by flows and backends alike

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod errors;
pub mod json_store;
pub mod pg_store;
pub mod service;
pub mod validation;

pub use errors::CatalogError;
pub use json_store::JsonCatalogStore;
pub use pg_store::PgCatalogStore;
pub use service::{Catalog, ImageOutcome, Photo, ProductDraft};

/// A named grouping that owns a set of products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A sellable catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_id: i64,
    /// Path of the stored image blob, absent when the product has no image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Fields supplied when creating a product
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_id: i64,
    pub image_path: Option<String>,
}

impl NewProduct {
    /// Re-validates the fields, returning a copy with trimmed text
    pub fn validated(&self) -> Result<NewProduct, CatalogError> {
        Ok(NewProduct {
            name: validation::validate_text(&self.name)?,
            description: validation::validate_text(&self.description)?,
            price: validation::check_price(self.price)?,
            category_id: self.category_id,
            image_path: self.image_path.clone(),
        })
    }
}

/// Storage contract for the catalog.
///
/// Backends are interchangeable; ordering is always by id (creation order).
/// Writes to the same entity from two sessions are last-write-wins.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;

    async fn get_category(&self, id: i64) -> Result<Option<Category>, CatalogError>;

    async fn add_category(&self, name: &str) -> Result<i64, CatalogError>;

    /// Returns `false` when the category does not exist
    async fn update_category(&self, id: i64, name: &str) -> Result<bool, CatalogError>;

    /// Deletes the category and every product referencing it.
    ///
    /// Returns the image paths of the removed products, or `None` when the
    /// category does not exist.
    async fn delete_category(&self, id: i64) -> Result<Option<Vec<String>>, CatalogError>;

    async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;

    async fn list_products_by_category(&self, category_id: i64)
        -> Result<Vec<Product>, CatalogError>;

    async fn get_product(&self, id: i64) -> Result<Option<Product>, CatalogError>;

    /// Fails with [`CatalogError::CategoryNotFound`] for an unknown category
    async fn add_product(&self, product: NewProduct) -> Result<i64, CatalogError>;

    /// Replaces name, description and price; no merging is done here
    async fn update_product(
        &self,
        id: i64,
        name: &str,
        description: &str,
        price: f64,
    ) -> Result<bool, CatalogError>;

    async fn update_product_image(
        &self,
        id: i64,
        image_path: Option<&str>,
    ) -> Result<bool, CatalogError>;

    async fn delete_product(&self, id: i64) -> Result<bool, CatalogError>;
}
