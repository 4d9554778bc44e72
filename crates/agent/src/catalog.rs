use std::sync::Arc;

use storefront_core::domain::catalog::CatalogEntry;
use storefront_db::repositories::CatalogRepository;
use tracing::warn;

pub const EMPTY_CATALOG_TEXT: &str = "There are currently no products available in the shop.";
pub const CATALOG_UNAVAILABLE_TEXT: &str = "The product catalog is currently unavailable.";

/// Renders the current catalog as conversational context for the model.
#[derive(Clone)]
pub struct CatalogReader {
    repository: Arc<dyn CatalogRepository>,
    currency: String,
}

impl CatalogReader {
    pub fn new(repository: Arc<dyn CatalogRepository>, currency: impl Into<String>) -> Self {
        Self { repository, currency: currency.into() }
    }

    /// Never fails: a repository error degrades to a fixed placeholder so the
    /// assistant can still answer.
    pub async fn render_catalog(&self) -> String {
        match self.repository.list_entries().await {
            Ok(entries) => render_entries(&entries, &self.currency),
            Err(error) => {
                warn!(
                    event_name = "assistant.catalog.unavailable",
                    error = %error,
                    "catalog read failed, continuing with placeholder context"
                );
                CATALOG_UNAVAILABLE_TEXT.to_string()
            }
        }
    }
}

pub fn render_entries(entries: &[CatalogEntry], currency: &str) -> String {
    if entries.is_empty() {
        return EMPTY_CATALOG_TEXT.to_string();
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push("Available products:".to_string());
    lines.extend(entries.iter().map(|entry| render_line(entry, currency)));
    lines.join("\n")
}

fn render_line(entry: &CatalogEntry, currency: &str) -> String {
    let mut line =
        format!("- {}: {:.2} {}, {} in stock", entry.name, entry.price, currency, entry.stock_count);
    // Collapsed so a multi-line description still renders as one entry line.
    let description = entry
        .description
        .as_deref()
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    if !description.is_empty() {
        line.push_str(&format!(" ({description})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use storefront_core::domain::catalog::CatalogEntry;
    use storefront_db::repositories::{
        CatalogRepository, InMemoryCatalogRepository, RepositoryError,
    };

    use super::{render_entries, CatalogReader, CATALOG_UNAVAILABLE_TEXT, EMPTY_CATALOG_TEXT};

    struct BrokenRepository;

    #[async_trait]
    impl CatalogRepository for BrokenRepository {
        async fn list_entries(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
            Err(RepositoryError::Decode("product table is missing".to_string()))
        }

        async fn save(&self, _entry: CatalogEntry) -> Result<(), RepositoryError> {
            Err(RepositoryError::Decode("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn empty_catalog_renders_fixed_sentence() {
        let reader = CatalogReader::new(Arc::new(InMemoryCatalogRepository::default()), "EUR");
        assert_eq!(reader.render_catalog().await, EMPTY_CATALOG_TEXT);
    }

    #[tokio::test]
    async fn repository_failure_degrades_to_placeholder() {
        let reader = CatalogReader::new(Arc::new(BrokenRepository), "EUR");
        assert_eq!(reader.render_catalog().await, CATALOG_UNAVAILABLE_TEXT);
    }

    #[tokio::test]
    async fn rendering_twice_is_identical() {
        let repository = InMemoryCatalogRepository::new(vec![
            CatalogEntry::new("Wireless Mouse", Decimal::new(2999, 2), 5),
            CatalogEntry::new("USB-C Hub", Decimal::new(1950, 2), 12),
        ]);
        let reader = CatalogReader::new(Arc::new(repository), "EUR");

        assert_eq!(reader.render_catalog().await, reader.render_catalog().await);
    }

    #[test]
    fn one_line_per_entry_with_name_price_and_stock() {
        let entries = vec![
            CatalogEntry::new("Wireless Mouse", Decimal::new(2999, 2), 5),
            CatalogEntry::new("Mechanical Keyboard", Decimal::new(89, 0), 0)
                .with_description("Brown switches"),
            CatalogEntry::new("Cable", Decimal::new(5, 0), 1).with_description("  "),
        ];

        let rendered = render_entries(&entries, "EUR");

        assert_eq!(
            rendered,
            "Available products:\n\
             - Wireless Mouse: 29.99 EUR, 5 in stock\n\
             - Mechanical Keyboard: 89.00 EUR, 0 in stock (Brown switches)\n\
             - Cable: 5.00 EUR, 1 in stock"
        );
    }

    #[test]
    fn multi_line_description_stays_on_one_line() {
        let entries = vec![CatalogEntry::new("USB-C Hub", Decimal::new(1950, 2), 12)
            .with_description("4 ports\n  HDMI output\r\n\tpower delivery")];

        let rendered = render_entries(&entries, "EUR");

        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.ends_with("12 in stock (4 ports HDMI output power delivery)"));
    }
}
