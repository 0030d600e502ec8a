//! Catalog facade: the store plus the image blobs its products own.

use std::sync::Arc;
use tracing::{error, info};

use super::{CatalogError, CatalogStore, Category, NewProduct, Product};
use crate::image_store::ImageStore;

/// Photo bytes uploaded by the admin
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub bytes: Vec<u8>,
    pub extension: String,
}

/// Buffered fields of a product that is about to be created
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub category_id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

/// What happened to the photo attached to a create/replace request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// No photo was supplied
    None,
    /// The photo was stored and linked to the product
    Saved,
    /// Storing the photo failed; the product was kept without it
    Failed,
}

/// Catalog store coupled with the image store
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    images: ImageStore,
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>, images: ImageStore) -> Self {
        Self { store, images }
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.store.list_categories().await
    }

    pub async fn get_category(&self, id: i64) -> Result<Option<Category>, CatalogError> {
        self.store.get_category(id).await
    }

    pub async fn add_category(&self, name: &str) -> Result<i64, CatalogError> {
        self.store.add_category(name).await
    }

    pub async fn update_category(&self, id: i64, name: &str) -> Result<bool, CatalogError> {
        self.store.update_category(id, name).await
    }

    /// Deletes the category, its products, and the image blobs of those products
    pub async fn delete_category(&self, id: i64) -> Result<bool, CatalogError> {
        let images = match self.store.delete_category(id).await? {
            Some(images) => images,
            None => return Ok(false),
        };

        for path in &images {
            self.images.delete(path).await;
        }

        Ok(true)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.store.list_products().await
    }

    pub async fn list_products_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Product>, CatalogError> {
        self.store.list_products_by_category(category_id).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        self.store.get_product(id).await
    }

    pub async fn update_product(
        &self,
        id: i64,
        name: &str,
        description: &str,
        price: f64,
    ) -> Result<bool, CatalogError> {
        self.store.update_product(id, name, description, price).await
    }

    /// Deletes the product and its image blob
    pub async fn delete_product(&self, id: i64) -> Result<bool, CatalogError> {
        let product = match self.store.get_product(id).await? {
            Some(product) => product,
            None => return Ok(false),
        };

        if !self.store.delete_product(id).await? {
            return Ok(false);
        }

        if let Some(path) = product.image_path.as_deref() {
            self.images.delete(path).await;
        }

        Ok(true)
    }

    /// Creates a product, storing the photo first when one is supplied.
    ///
    /// A photo that cannot be stored never blocks the product itself.
    pub async fn create_product(
        &self,
        draft: ProductDraft,
        photo: Option<Photo>,
    ) -> Result<(i64, ImageOutcome), CatalogError> {
        let (image_path, outcome) = match photo {
            Some(photo) => match self.store_photo(&photo).await {
                Some(path) => (Some(path), ImageOutcome::Saved),
                None => (None, ImageOutcome::Failed),
            },
            None => (None, ImageOutcome::None),
        };

        let new_product = NewProduct {
            name: draft.name,
            description: draft.description,
            price: draft.price,
            category_id: draft.category_id,
            image_path: image_path.clone(),
        };

        match self.store.add_product(new_product).await {
            Ok(id) => Ok((id, outcome)),
            Err(e) => {
                if let Some(path) = image_path.as_deref() {
                    self.images.delete(path).await;
                }
                Err(e)
            }
        }
    }

    /// Replaces the product image.
    ///
    /// Returns `Ok(None)` when the product does not exist.
    pub async fn replace_image(
        &self,
        product_id: i64,
        photo: Photo,
    ) -> Result<Option<ImageOutcome>, CatalogError> {
        let product = match self.store.get_product(product_id).await? {
            Some(product) => product,
            None => return Ok(None),
        };

        let path = match self.store_photo(&photo).await {
            Some(path) => path,
            None => return Ok(Some(ImageOutcome::Failed)),
        };

        match self.store.update_product_image(product_id, Some(&path)).await {
            Ok(true) => {}
            Ok(false) => {
                self.images.delete(&path).await;
                return Ok(None);
            }
            Err(e) => {
                self.images.delete(&path).await;
                return Err(e);
            }
        }

        if let Some(old_path) = product.image_path.as_deref() {
            self.images.delete(old_path).await;
        }

        info!(product_id, "Product image replaced");
        Ok(Some(ImageOutcome::Saved))
    }

    /// Unlinks and deletes the product image.
    ///
    /// Returns `Ok(None)` when the product does not exist and `Ok(Some(false))`
    /// when it had no image.
    pub async fn remove_image(&self, product_id: i64) -> Result<Option<bool>, CatalogError> {
        let product = match self.store.get_product(product_id).await? {
            Some(product) => product,
            None => return Ok(None),
        };

        let path = match product.image_path {
            Some(path) => path,
            None => return Ok(Some(false)),
        };

        if !self.store.update_product_image(product_id, None).await? {
            return Ok(None);
        }

        self.images.delete(&path).await;
        Ok(Some(true))
    }

    /// Full copy of the catalog, for before/after comparisons
    pub async fn snapshot(&self) -> Result<(Vec<Category>, Vec<Product>), CatalogError> {
        Ok((
            self.store.list_categories().await?,
            self.store.list_products().await?,
        ))
    }

    async fn store_photo(&self, photo: &Photo) -> Option<String> {
        match self.images.save(&photo.bytes, &photo.extension).await {
            Ok(image_id) => Some(self.images.path_for(&image_id, &photo.extension)),
            Err(e) => {
                error!(error = %e, "Failed to save product image, continuing without it");
                None
            }
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

