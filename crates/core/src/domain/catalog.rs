use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub price: Decimal,
    pub stock_count: u32,
    pub description: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, price: Decimal, stock_count: u32) -> Self {
        Self { name: name.into(), price, stock_count, description: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn in_stock(&self) -> bool {
        self.stock_count > 0
    }
}
