use async_trait::async_trait;
use thiserror::Error;

use storefront_core::domain::catalog::CatalogEntry;

pub mod catalog;
pub mod memory;

pub use catalog::SqlCatalogRepository;
pub use memory::InMemoryCatalogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read access to the shop catalog. Implementations return entries in a
/// stable order so rendered snapshots are reproducible.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, RepositoryError>;
    async fn save(&self, entry: CatalogEntry) -> Result<(), RepositoryError>;
}
