use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;
use storefront_core::domain::catalog::CatalogEntry;

use super::{CatalogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn list_entries(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let rows =
            sqlx::query("SELECT name, price, stock, description FROM product ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(decode_entry).collect()
    }

    async fn save(&self, entry: CatalogEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (name, price, stock, description, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                price = excluded.price,
                stock = excluded.stock,
                description = excluded.description",
        )
        .bind(&entry.name)
        .bind(entry.price.to_string())
        .bind(i64::from(entry.stock_count))
        .bind(entry.description.as_deref())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn decode_entry(row: &sqlx::sqlite::SqliteRow) -> Result<CatalogEntry, RepositoryError> {
    let name: String = row.try_get("name")?;
    let raw_price: String = row.try_get("price")?;
    let raw_stock: i64 = row.try_get("stock")?;
    let description: Option<String> = row.try_get("description")?;

    let price = Decimal::from_str(raw_price.trim()).map_err(|error| {
        RepositoryError::Decode(format!("invalid price `{raw_price}` for product `{name}`: {error}"))
    })?;
    let stock_count = u32::try_from(raw_stock).map_err(|_| {
        RepositoryError::Decode(format!("invalid stock `{raw_stock}` for product `{name}`"))
    })?;

    Ok(CatalogEntry { name, price, stock_count, description })
}
