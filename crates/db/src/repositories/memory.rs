use tokio::sync::RwLock;

use storefront_core::domain::catalog::CatalogEntry;

use super::{CatalogRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    entries: RwLock<Vec<CatalogEntry>>,
}

impl InMemoryCatalogRepository {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries: RwLock::new(entries) }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.clone())
    }

    async fn save(&self, entry: CatalogEntry) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }
}
