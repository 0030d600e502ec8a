//! PostgreSQL catalog store.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use super::validation::{check_price, validate_text};
use super::{CatalogError, CatalogStore, Category, NewProduct, Product};

/// SQLSTATE for foreign key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Catalog store backed by the `categories` and `products` tables
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and makes sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        let pool = PgPool::connect(database_url).await?;
        init_schema(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Initialize the database schema
pub async fn init_schema(pool: &PgPool) -> Result<(), CatalogError> {
    info!("Initializing catalog schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS categories (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            price DOUBLE PRECISION NOT NULL,
            category_id BIGINT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            image_path TEXT
        )",
    )
    .execute(pool)
    .await?;

    // Databases created before images were supported lack the column
    sqlx::query("ALTER TABLE products ADD COLUMN IF NOT EXISTS image_path TEXT")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category_id ON products(category_id)")
        .execute(pool)
        .await?;

    info!("Catalog schema initialized successfully");
    Ok(())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == FOREIGN_KEY_VIOLATION)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>, CatalogError> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    async fn add_category(&self, name: &str) -> Result<i64, CatalogError> {
        let name = validate_text(name)?;

        let id: i64 = sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(&name)
            .fetch_one(&self.pool)
            .await?;

        info!(category_id = id, "Category created");
        Ok(id)
    }

    async fn update_category(&self, id: i64, name: &str) -> Result<bool, CatalogError> {
        let name = validate_text(name)?;

        let result = sqlx::query("UPDATE categories SET name = $1 WHERE id = $2")
            .bind(&name)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_category(&self, id: i64) -> Result<Option<Vec<String>>, CatalogError> {
        let mut tx = self.pool.begin().await?;

        // The row lock holds off product inserts referencing this category
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let images: Vec<Option<String>> =
            sqlx::query_scalar("DELETE FROM products WHERE category_id = $1 RETURNING image_path")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        let images: Vec<String> = images.into_iter().flatten().collect();
        info!(category_id = id, images = images.len(), "Category deleted with its products");
        Ok(Some(images))
    }

    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, category_id, image_path
             FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn list_products_by_category(
        &self,
        category_id: i64,
    ) -> Result<Vec<Product>, CatalogError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, category_id, image_path
             FROM products WHERE category_id = $1 ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn get_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, category_id, image_path
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn add_product(&self, product: NewProduct) -> Result<i64, CatalogError> {
        let product = product.validated()?;

        let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
            "INSERT INTO products (name, description, price, category_id, image_path)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category_id)
        .bind(product.image_path.as_deref())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => {
                info!(product_id = id, "Product created");
                Ok(id)
            }
            Err(e) if is_foreign_key_violation(&e) => {
                debug!(category_id = product.category_id, "Product insert rejected by foreign key");
                Err(CatalogError::CategoryNotFound(product.category_id))
            }
            Err(e) => Err(e.into()),
        }
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

        let result =
            sqlx::query("UPDATE products SET name = $1, description = $2, price = $3 WHERE id = $4")
                .bind(&name)
                .bind(&description)
                .bind(price)
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_product_image(
        &self,
        id: i64,
        image_path: Option<&str>,
    ) -> Result<bool, CatalogError> {
        let result = sqlx::query("UPDATE products SET image_path = $1 WHERE id = $2")
            .bind(image_path)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: i64) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
