use rust_decimal::Decimal;
use storefront_core::domain::catalog::CatalogEntry;

use crate::connection::DbPool;
use crate::repositories::{CatalogRepository, RepositoryError, SqlCatalogRepository};

/// Demo catalog used by `storefront seed` and the end-to-end tests.
const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Wireless Mouse",
        price_cents: 2999,
        stock: 5,
        description: Some("2.4 GHz receiver, silent clicks"),
    },
    SeedProduct {
        name: "Mechanical Keyboard",
        price_cents: 8900,
        stock: 3,
        description: Some("Hot-swappable brown switches"),
    },
    SeedProduct { name: "USB-C Hub", price_cents: 1950, stock: 12, description: None },
    SeedProduct {
        name: "27\" Monitor",
        price_cents: 21900,
        stock: 0,
        description: Some("1440p IPS panel"),
    },
];

struct SeedProduct {
    name: &'static str,
    price_cents: i64,
    stock: u32,
    description: Option<&'static str>,
}

impl SeedProduct {
    fn entry(&self) -> CatalogEntry {
        let entry = CatalogEntry::new(self.name, Decimal::new(self.price_cents, 2), self.stock);
        match self.description {
            Some(description) => entry.with_description(description),
            None => entry,
        }
    }
}

pub struct DemoCatalog;

impl DemoCatalog {
    pub fn entries() -> Vec<CatalogEntry> {
        SEED_PRODUCTS.iter().map(SeedProduct::entry).collect()
    }

    /// Upserts the demo products. Running it twice leaves the same rows.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let repository = SqlCatalogRepository::new(pool.clone());
        for product in SEED_PRODUCTS {
            repository.save(product.entry()).await?;
        }

        Ok(SeedResult {
            products_seeded: SEED_PRODUCTS.iter().map(|product| product.name.to_string()).collect(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for product in SEED_PRODUCTS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product WHERE name = ?1 AND price = ?2 AND stock = ?3)",
            )
            .bind(product.name)
            .bind(Decimal::new(product.price_cents, 2).to_string())
            .bind(i64::from(product.stock))
            .fetch_one(pool)
            .await?;
            checks.push((product.name, present == 1));
        }

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { all_present, checks })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        for product in SEED_PRODUCTS {
            sqlx::query("DELETE FROM product WHERE name = ?1")
                .bind(product.name)
                .execute(pool)
                .await?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub products_seeded: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::DemoCatalog;
    use crate::repositories::{CatalogRepository, SqlCatalogRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn load_is_idempotent_and_verifiable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let first = DemoCatalog::load(&pool).await.expect("first load");
        let second = DemoCatalog::load(&pool).await.expect("second load");
        assert_eq!(first.products_seeded, second.products_seeded);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product").fetch_one(&pool).await.expect("count");
        assert_eq!(count, DemoCatalog::entries().len() as i64);

        let verification = DemoCatalog::verify(&pool).await.expect("verify");
        assert!(verification.all_present, "checks: {:?}", verification.checks);
    }

    #[tokio::test]
    async fn demo_catalog_contains_wireless_mouse() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoCatalog::load(&pool).await.expect("load");

        let entries = SqlCatalogRepository::new(pool).list_entries().await.expect("list");
        let mouse = entries.iter().find(|entry| entry.name == "Wireless Mouse").expect("mouse");
        assert_eq!(mouse.price, Decimal::new(2999, 2));
        assert_eq!(mouse.stock_count, 5);
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoCatalog::load(&pool).await.expect("load");
        DemoCatalog::clean(&pool).await.expect("clean");

        let verification = DemoCatalog::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
    }
}
