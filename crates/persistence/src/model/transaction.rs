use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::types::EntityKind;

use super::Entity;

/// Processing status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Approved => "approved",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "approved" => Ok(TransactionStatus::Approved),
            "rejected" => Ok(TransactionStatus::Rejected),
            "completed" => Ok(TransactionStatus::Completed),
            _ => Err(StorageError::invalid_parameter(
                "status",
                s,
                "expected one of pending, approved, rejected, completed",
            )),
        }
    }
}

/// A checkout of one or more purchases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: u64,
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: TransactionStatus,
    pub transaction_time: DateTime<Utc>,
    #[serde(default)]
    pub purchase_ids: Vec<u64>,
}

impl Transaction {
    /// A pending transaction stamped with the current time.
    pub fn pending(user_id: u64, total_amount: Decimal, purchase_ids: Vec<u64>) -> Self {
        Self {
            user_id,
            total_amount,
            status: TransactionStatus::Pending,
            transaction_time: Utc::now(),
            purchase_ids,
        }
    }
}

impl Entity for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "Approved".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Approved
        );
        assert!("shipped".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let value = serde_json::to_value(TransactionStatus::Completed).unwrap();
        assert_eq!(value, "completed");
    }

    #[test]
    fn test_pending() {
        let tx = Transaction::pending(4, Decimal::new(2000, 2), vec![1, 2]);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.purchase_ids, vec![1, 2]);
    }
}
