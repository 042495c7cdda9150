use crate::core::{AtomicWrites, WriteOp};
use crate::error::{StorageError, StorageResult, ValidationError};
use crate::model::{Book, Entity, Purchase};
use crate::paginator::paginate_and_search;
use crate::query::{EntityQuery, Filter};
use crate::types::{Paginated, ParamSource, StoredEntity};

use super::{Catalog, first_record};

fn check_quantity(quantity: u32) -> StorageResult<()> {
    if quantity == 0 {
        return Err(StorageError::invalid_parameter(
            "quantity",
            "0",
            "must be at least 1",
        ));
    }
    Ok(())
}

fn check_not_checked_out(purchase: &StoredEntity<Purchase>) -> StorageResult<()> {
    match purchase.data().transaction_id {
        Some(transaction_id) => Err(ValidationError::InvalidState {
            message: format!(
                "purchase {} is part of transaction {}",
                purchase.id(),
                transaction_id
            ),
        }
        .into()),
        None => Ok(()),
    }
}

impl<S> Catalog<S>
where
    S: AtomicWrites + ?Sized,
{
    /// Buys `quantity` copies of a book.
    ///
    /// The purchase row and the book's stock change are written in one
    /// batch. The book update carries the version read here, so a
    /// concurrent sale of the same book fails with a version conflict
    /// instead of overselling.
    ///
    /// # Errors
    ///
    /// * `ValidationError::InvalidParameter` if `quantity` is 0
    /// * `ValidationError::InvalidReference` if the user or book is inactive
    /// * `ValidationError::InsufficientStock` if stock is short
    /// * `ConcurrencyError::VersionConflict` if the book changed meanwhile
    pub async fn buy_book(
        &self,
        user_id: u64,
        book_id: u64,
        quantity: u32,
    ) -> StorageResult<StoredEntity<Purchase>> {
        check_quantity(quantity)?;
        self.active_user(user_id).await?;

        let book = self.load::<Book>(book_id).await?;
        if !book.data().active {
            return Err(ValidationError::InvalidReference {
                field: "book_id".to_string(),
                message: format!("book {} is not available", book_id),
            }
            .into());
        }

        let mut sold = book.data().clone();
        sold.record_sale(book_id, quantity)?;

        let purchase = Purchase::new(user_id, book_id, quantity, book.data().price);
        purchase.validate()?;

        let ops = vec![
            WriteOp::create(
                Purchase::KIND,
                self.code_assignment::<Purchase>(),
                serde_json::to_value(&purchase)?,
            ),
            WriteOp::update(Book::KIND, book.id(), book.version(), serde_json::to_value(&sold)?),
        ];
        let created = first_record(self.storage.apply_batch(ops).await?)?;

        tracing::info!(user_id, book_id, quantity, purchase_id = created.id(), "Book purchased");
        created.into_typed()
    }

    /// Lists the purchases of one user.
    pub async fn list_user_purchases<P>(
        &self,
        user_id: u64,
        params: &P,
    ) -> StorageResult<Paginated<StoredEntity<Purchase>>>
    where
        P: ParamSource + ?Sized,
    {
        let preset = EntityQuery::new(Purchase::KIND).filter(Filter::eq("user_id", user_id));
        paginate_and_search(
            &*self.storage,
            params,
            EntityQuery::new(Purchase::KIND),
            Some(preset),
        )
        .await
    }

    /// Changes the quantity of a purchase that is not checked out yet and
    /// moves the difference between the book's stock and sold counts.
    pub async fn update_purchase(
        &self,
        user_id: u64,
        purchase_id: u64,
        quantity: u32,
    ) -> StorageResult<StoredEntity<Purchase>> {
        check_quantity(quantity)?;
        let current = self.load_owned::<Purchase>(user_id, purchase_id).await?;
        check_not_checked_out(&current)?;

        let previous = current.data().quantity;
        let mut purchase = current.data().clone();
        purchase.quantity = quantity;

        let mut ops = vec![WriteOp::update(
            Purchase::KIND,
            current.id(),
            current.version(),
            serde_json::to_value(&purchase)?,
        )];

        if quantity != previous {
            if let Some(record) = self.storage.read(Book::KIND, purchase.book_id).await? {
                let book = record.into_typed::<Book>()?;
                let mut adjusted = book.data().clone();
                if quantity > previous {
                    adjusted.record_sale(book.id(), quantity - previous)?;
                } else {
                    adjusted.return_sale(previous - quantity);
                }
                ops.push(WriteOp::update(
                    Book::KIND,
                    book.id(),
                    book.version(),
                    serde_json::to_value(&adjusted)?,
                ));
            }
        }

        first_record(self.storage.apply_batch(ops).await?)?.into_typed()
    }

    /// Soft-deletes a purchase that is not checked out and returns its
    /// copies to stock.
    pub async fn delete_purchase(&self, user_id: u64, purchase_id: u64) -> StorageResult<()> {
        let current = self.load_owned::<Purchase>(user_id, purchase_id).await?;
        check_not_checked_out(&current)?;

        let mut ops = vec![WriteOp::delete(Purchase::KIND, current.id(), current.version())];
        if let Some(record) = self.storage.read(Book::KIND, current.data().book_id).await? {
            let book = record.into_typed::<Book>()?;
            let mut restocked = book.data().clone();
            restocked.return_sale(current.data().quantity);
            ops.push(WriteOp::update(
                Book::KIND,
                book.id(),
                book.version(),
                serde_json::to_value(&restocked)?,
            ));
        }

        self.storage.apply_batch(ops).await?;
        tracing::info!(user_id, purchase_id, "Deleted purchase");
        Ok(())
    }
}
