use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{StorageResult, ValidationError};
use crate::types::EntityKind;

use super::{Entity, default_true, require_non_blank};

fn default_stock() -> u32 {
    10
}

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
    pub author_id: u64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_stock")]
    pub quantity_in_stock: u32,
    #[serde(default)]
    pub quantity_sold: u32,
    #[serde(default)]
    pub category_ids: Vec<u64>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub dimensions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default)]
    pub binding_type: String,
    /// Image locations. Uploading and serving images is out of scope.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl Book {
    /// A book with the given title and author and every other field at its
    /// default.
    pub fn new(title: impl Into<String>, author_id: u64) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            price: Decimal::ZERO,
            author_id,
            active: true,
            quantity_in_stock: default_stock(),
            quantity_sold: 0,
            category_ids: Vec::new(),
            publisher: String::new(),
            publication_year: None,
            weight: None,
            dimensions: String::new(),
            pages: None,
            binding_type: String::new(),
            image_urls: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    pub fn with_stock(mut self, quantity_in_stock: u32) -> Self {
        self.quantity_in_stock = quantity_in_stock;
        self
    }

    pub fn with_categories(mut self, category_ids: impl IntoIterator<Item = u64>) -> Self {
        self.category_ids = category_ids.into_iter().collect();
        self
    }

    /// Moves `quantity` units from stock to sold.
    pub fn record_sale(&mut self, book_id: u64, quantity: u32) -> StorageResult<()> {
        if quantity > self.quantity_in_stock {
            return Err(ValidationError::InsufficientStock {
                book_id,
                requested: quantity,
                available: self.quantity_in_stock,
            }
            .into());
        }
        self.quantity_in_stock -= quantity;
        self.quantity_sold = self.quantity_sold.saturating_add(quantity);
        Ok(())
    }

    /// Moves `quantity` units from sold back to stock.
    pub fn return_sale(&mut self, quantity: u32) {
        self.quantity_sold = self.quantity_sold.saturating_sub(quantity);
        self.quantity_in_stock = self.quantity_in_stock.saturating_add(quantity);
    }
}

impl Entity for Book {
    const KIND: EntityKind = EntityKind::Book;

    fn validate(&self) -> StorageResult<()> {
        require_non_blank("title", &self.title)?;
        if self.price.is_sign_negative() {
            return Err(ValidationError::InvalidState {
                message: format!("price cannot be negative: {}", self.price),
            }
            .into());
        }
        Ok(())
    }
}
