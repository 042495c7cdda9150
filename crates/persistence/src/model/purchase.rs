use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::types::EntityKind;

use super::Entity;

/// One line of a user's order: a quantity of one book at the price it had
/// when bought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub user_id: u64,
    pub book_id: u64,
    pub quantity: u32,
    /// Unit price captured at purchase time.
    pub book_price: Decimal,
    /// The transaction this purchase has been checked out in, if any.
    #[serde(default)]
    pub transaction_id: Option<u64>,
}

impl Purchase {
    pub fn new(user_id: u64, book_id: u64, quantity: u32, book_price: Decimal) -> Self {
        Self {
            user_id,
            book_id,
            quantity,
            book_price,
            transaction_id: None,
        }
    }

    /// `quantity * book_price`.
    pub fn subtotal(&self) -> Decimal {
        self.book_price * Decimal::from(self.quantity)
    }

    /// Returns true once the purchase belongs to a transaction.
    pub fn is_checked_out(&self) -> bool {
        self.transaction_id.is_some()
    }
}

impl Entity for Purchase {
    const KIND: EntityKind = EntityKind::Purchase;

    fn validate(&self) -> StorageResult<()> {
        if self.quantity == 0 {
            return Err(StorageError::invalid_parameter(
                "quantity",
                "0",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal() {
        let purchase = Purchase::new(1, 2, 3, Decimal::new(1250, 2));
        assert_eq!(purchase.subtotal(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_zero_quantity_is_invalid() {
        assert!(Purchase::new(1, 2, 0, Decimal::ONE).validate().is_err());
    }

    #[test]
    fn test_transaction_id_defaults_to_none() {
        let purchase: Purchase = serde_json::from_str(
            r#"{"user_id": 1, "book_id": 2, "quantity": 1, "book_price": "9.99"}"#,
        )
        .unwrap();
        assert!(!purchase.is_checked_out());
    }
}
