//! Error types for catalog loading and lookup

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Class \"{0}\" not mapped")]
    UnknownClass(String),

    #[error("Duplicate catalog entry: {0}")]
    DuplicateClass(String),

    #[error("Invalid catalog data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
