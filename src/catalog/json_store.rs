//! File-backed catalog store.
//!
//! Keeps the whole catalog in memory and rewrites the two JSON documents on
//! every write. A write is applied to a copy of the data, persisted, and only
//! then made visible, so a failed persist leaves the store untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::validation::{check_price, validate_text};
use super::{CatalogError, CatalogStore, Category, NewProduct, Product};

fn first_id() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategoriesDocument {
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default = "first_id")]
    next_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductsDocument {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default = "first_id")]
    next_id: i64,
}

impl Default for CategoriesDocument {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            next_id: first_id(),
        }
    }
}

impl Default for ProductsDocument {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            next_id: first_id(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CatalogData {
    categories: CategoriesDocument,
    products: ProductsDocument,
}

/// Which documents a write touched
#[derive(Debug, Clone, Copy)]
enum Touched {
    Categories,
    Products,
    Both,
}

/// Catalog store persisted as `categories.json` / `products.json` style documents
pub struct JsonCatalogStore {
    categories_path: PathBuf,
    products_path: PathBuf,
    data: Mutex<CatalogData>,
}

impl JsonCatalogStore {
    /// Opens the store, creating empty documents for missing files.
    ///
    /// A document that exists but cannot be decoded is an error.
    pub async fn open(
        categories_path: impl Into<PathBuf>,
        products_path: impl Into<PathBuf>,
    ) -> Result<Self, CatalogError> {
        let categories_path = categories_path.into();
        let products_path = products_path.into();

        let mut categories: CategoriesDocument = load_document(&categories_path).await?;
        let mut products: ProductsDocument = load_document(&products_path).await?;

        // Counters never hand out an id that is already taken
        if let Some(max_id) = categories.categories.iter().map(|c| c.id).max() {
            categories.next_id = categories.next_id.max(max_id + 1);
        }
        if let Some(max_id) = products.products.iter().map(|p| p.id).max() {
            products.next_id = products.next_id.max(max_id + 1);
        }

        let data = CatalogData {
            categories,
            products,
        };

        let store = Self {
            categories_path,
            products_path,
            data: Mutex::new(data.clone()),
        };
        store.persist(&data, Touched::Both).await?;

        info!(
            categories = data.categories.categories.len(),
            products = data.products.products.len(),
            "JSON catalog loaded"
        );

        Ok(store)
    }

    async fn persist(&self, data: &CatalogData, touched: Touched) -> Result<(), CatalogError> {
        // Products first: a failure between the two writes leaves no orphans behind
        if matches!(touched, Touched::Products | Touched::Both) {
            write_document(&self.products_path, &data.products).await?;
        }
        if matches!(touched, Touched::Categories | Touched::Both) {
            write_document(&self.categories_path, &data.categories).await?;
        }
        Ok(())
    }

    /// Runs `change` against a copy of the data and commits it once persisted
    async fn write<T>(
        &self,
        touched: Touched,
        change: impl FnOnce(&mut CatalogData) -> Result<(T, bool), CatalogError>,
    ) -> Result<T, CatalogError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();

        let (result, modified) = change(&mut next)?;
        if modified {
            self.persist(&next, touched).await?;
            *data = next;
        }

        Ok(result)
    }
}

async fn load_document<T>(path: &Path) -> Result<T, CatalogError>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!(path = %path.display(), "Reading catalog document");
            Ok(serde_json::from_slice(&bytes)?)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "Catalog document missing, starting empty");
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let bytes = serde_json::to_vec_pretty(document)?;
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    tokio::fs::write(&temp_path, bytes).await?;
    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

#[async_trait]
impl CatalogStore for JsonCatalogStore {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let data = self.data.lock().await;
        let mut categories = data.categories.categories.clone();
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, CatalogError> {
        let data = self.data.lock().await;
        Ok(data.categories.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn add_category(&self, name: &str) -> Result<i64, CatalogError> {
        let name = validate_text(name)?;

        let id = self
            .write(Touched::Categories, |data| {
                let id = data.categories.next_id;
                data.categories.categories.push(Category { id, name });
                data.categories.next_id += 1;
                Ok((id, true))
            })
            .await?;

        info!(category_id = id, "Category created");
        Ok(id)
    }

    async fn update_category(&self, id: i64, name: &str) -> Result<bool, CatalogError> {
        let name = validate_text(name)?;

        self.write(Touched::Categories, |data| {
            match data.categories.categories.iter_mut().find(|c| c.id == id) {
                Some(category) => {
                    category.name = name;
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
        .await
    }

    async fn delete_category(&self, id: i64) -> Result<Option<Vec<String>>, CatalogError> {
        let removed = self
            .write(Touched::Both, |data| {
                let before = data.categories.categories.len();
                data.categories.categories.retain(|c| c.id != id);
                if data.categories.categories.len() == before {
                    return Ok((None, false));
                }

                let (gone, kept): (Vec<Product>, Vec<Product>) = data
                    .products
                    .products
                    .drain(..)
                    .partition(|p| p.category_id == id);
                data.products.products = kept;

                let images: Vec<String> = gone.into_iter().filter_map(|p| p.image_path).collect();
                Ok((Some(images), true))
            })
            .await?;

        if let Some(images) = &removed {
            info!(category_id = id, images = images.len(), "Category deleted with its products");
        }
        Ok(removed)
    }

    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let data = self.data.lock().await;
        let mut products = data.products.products.clone();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn list_products_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Product>, CatalogError> {
        let data = self.data.lock().await;
        let mut products: Vec<Product> = data
            .products
            .products
            .iter()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let data = self.data.lock().await;
        Ok(data.products.products.iter().find(|p| p.id == id).cloned())
    }

    async fn add_product(&self, product: NewProduct) -> Result<i64, CatalogError> {
        let product = product.validated()?;

        let id = self
            .write(Touched::Products, |data| {
                if !data
                    .categories
                    .categories
                    .iter()
                    .any(|c| c.id == product.category_id)
                {
                    return Err(CatalogError::CategoryNotFound(product.category_id));
                }

                let id = data.products.next_id;
                data.products.products.push(Product {
                    id,
                    name: product.name,
                    description: product.description,
                    price: product.price,
                    category_id: product.category_id,
                    image_path: product.image_path,
                });
                data.products.next_id += 1;
                Ok((id, true))
            })
            .await?;

        info!(product_id = id, "Product created");
        Ok(id)
    }

    async fn update_product(
        &self,
        id: i64,
        name: &str,
        description: &str,
        price: f64,
    ) -> Result<bool, CatalogError> {
        let name = validate_text(name)?;
        let description = validate_text(description)?;
        let price = check_price(price)?;

        self.write(Touched::Products, |data| {
            match data.products.products.iter_mut().find(|p| p.id == id) {
                Some(product) => {
                    product.name = name;
                    product.description = description;
                    product.price = price;
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
        .await
    }

    async fn update_product_image(
        &self,
        id: i64,
        image_path: Option<&str>,
    ) -> Result<bool, CatalogError> {
        let image_path = image_path.map(str::to_string);

        self.write(Touched::Products, |data| {
            match data.products.products.iter_mut().find(|p| p.id == id) {
                Some(product) => {
                    product.image_path = image_path;
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
        .await
    }

    async fn delete_product(&self, id: i64) -> Result<bool, CatalogError> {
        self.write(Touched::Products, |data| {
            let before = data.products.products.len();
            data.products.products.retain(|p| p.id != id);
            let deleted = data.products.products.len() < before;
            Ok((deleted, deleted))
        })
        .await
    }
}
