use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::core::{AtomicWrites, WriteOp};
use crate::error::{StorageError, StorageResult, ValidationError};
use crate::model::{Entity, Purchase, Transaction, TransactionStatus};
use crate::paginator::paginate_and_search;
use crate::query::{EntityQuery, Filter};
use crate::types::{Paginated, ParamSource, StoredEntity};

use super::{Catalog, first_record};

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    /// Checks out purchases into a new pending transaction.
    ///
    /// The total is the sum of `quantity * book_price` over the purchases.
    /// The transaction row and the `transaction_id` of every purchase are
    /// written in one batch.
    ///
    /// # Errors
    ///
    /// * `ValidationError::InvalidParameter` if `purchase_ids` is empty or
    ///   repeats an id
    /// * `ResourceError::NotFound` if a purchase does not exist or belongs
    ///   to another user
    /// * `ValidationError::InvalidState` if a purchase is already checked out
    pub async fn create_transaction(
        &self,
        user_id: u64,
        purchase_ids: &[u64],
    ) -> StorageResult<StoredEntity<Transaction>> {
        if purchase_ids.is_empty() {
            return Err(StorageError::invalid_parameter(
                "purchase_ids",
                "",
                "at least one purchase is required",
            ));
        }
        let mut seen = BTreeSet::new();
        if let Some(repeated) = purchase_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(StorageError::invalid_parameter(
                "purchase_ids",
                repeated.to_string(),
                "listed more than once",
            ));
        }

        self.active_user(user_id).await?;

        let mut purchases = Vec::with_capacity(purchase_ids.len());
        for &id in purchase_ids {
            let purchase = self.load_owned::<Purchase>(user_id, id).await?;
            if let Some(transaction_id) = purchase.data().transaction_id {
                return Err(ValidationError::InvalidState {
                    message: format!(
                        "purchase {} is already part of transaction {}",
                        id, transaction_id
                    ),
                }
                .into());
            }
            purchases.push(purchase);
        }

        let total: Decimal = purchases.iter().map(|p| p.data().subtotal()).sum();
        let transaction = Transaction::pending(user_id, total, purchase_ids.to_vec());

        let mut ops = vec![WriteOp::create(
            Transaction::KIND,
            self.code_assignment::<Transaction>(),
            serde_json::to_value(&transaction)?,
        )];
        for purchase in &purchases {
            ops.push(
                WriteOp::update(
                    Purchase::KIND,
                    purchase.id(),
                    purchase.version(),
                    serde_json::to_value(purchase.data())?,
                )
                .linking("transaction_id", 0),
            );
        }

        let created = first_record(self.storage.apply_batch(ops).await?)?;
        tracing::info!(
            user_id,
            transaction_id = created.id(),
            purchases = purchase_ids.len(),
            total = %total,
            "Transaction created"
        );
        created.into_typed()
    }

    pub async fn list_user_transactions<P>(
        &self,
        user_id: u64,
        params: &P,
    ) -> StorageResult<Paginated<StoredEntity<Transaction>>>
    where
        P: ParamSource + ?Sized,
    {
        let preset = EntityQuery::new(Transaction::KIND).filter(Filter::eq("user_id", user_id));
        paginate_and_search(
            &*self.storage,
            params,
            EntityQuery::new(Transaction::KIND),
            Some(preset),
        )
        .await
    }

    /// Lists every transaction, for administrators.
    pub async fn list_all_transactions<P>(
        &self,
        params: &P,
    ) -> StorageResult<Paginated<StoredEntity<Transaction>>>
    where
        P: ParamSource + ?Sized,
    {
        paginate_and_search(&*self.storage, params, EntityQuery::new(Transaction::KIND), None).await
    }

    pub async fn update_transaction_status(
        &self,
        id: u64,
        status: TransactionStatus,
    ) -> StorageResult<StoredEntity<Transaction>> {
        let current = self.load::<Transaction>(id).await?;
        let mut transaction = current.data().clone();
        transaction.status = status;

        let updated = self.replace(&current, &transaction).await?;
        tracing::info!(id, status = %status, "Transaction status changed");
        Ok(updated)
    }

    /// Soft-deletes a transaction and detaches its purchases in one batch.
    pub async fn delete_transaction(&self, user_id: u64, id: u64) -> StorageResult<()> {
        let current = self.load_owned::<Transaction>(user_id, id).await?;

        let mut ops = Vec::new();
        for &purchase_id in &current.data().purchase_ids {
            let Some(record) = self.storage.read(Purchase::KIND, purchase_id).await? else {
                continue;
            };
            let purchase = record.into_typed::<Purchase>()?;
            if purchase.data().transaction_id != Some(id) {
                continue;
            }
            let mut detached = purchase.data().clone();
            detached.transaction_id = None;
            ops.push(WriteOp::update(
                Purchase::KIND,
                purchase.id(),
                purchase.version(),
                serde_json::to_value(&detached)?,
            ));
        }
        ops.push(WriteOp::delete(Transaction::KIND, current.id(), current.version()));

        self.storage.apply_batch(ops).await?;
        tracing::info!(user_id, id, "Deleted transaction");
        Ok(())
    }
}
