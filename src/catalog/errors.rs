//! # Catalog Error Types
//!
//! Errors returned by catalog store backends and the catalog facade.

use thiserror::Error;

use super::validation::ValidationError;

/// Errors produced by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected at the store boundary
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A product referenced a category that does not exist
    #[error("category {0} does not exist")]
    CategoryNotFound(i64),

    /// Relational backend failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File backend read/write failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File backend document could not be encoded or decoded
    #[error("catalog document error: {0}")]
    Document(#[from] serde_json::Error),
}
