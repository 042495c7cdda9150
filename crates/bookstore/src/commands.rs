//! Runs a parsed [`Command`] against a catalog.
//!
//! Every command returns its result as JSON; the binary prints it.

use bookstore_persistence::Catalog;
use bookstore_persistence::backends::sqlite::SCHEMA_VERSION;
use bookstore_persistence::core::AtomicWrites;
use bookstore_persistence::model::{Author, Book, Category};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::cli::{
    AuthorCommand, BookCommand, CategoryCommand, Command, FavoriteCommand, NewBookArgs,
    PurchaseCommand, TransactionCommand, UserCommand,
};

fn to_json<T: Serialize>(value: T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn deleted(kind: &str, id: u64) -> Value {
    json!({ "deleted": { "kind": kind, "id": id } })
}

/// Executes one command.
///
/// # Errors
///
/// Returns the catalog's error unchanged, wrapped in [`anyhow::Error`].
pub async fn run<S>(catalog: &Catalog<S>, command: Command) -> anyhow::Result<Value>
where
    S: AtomicWrites + ?Sized,
{
    debug!(?command, "Running command");

    match command {
        Command::Init => Ok(json!({ "schema_version": SCHEMA_VERSION })),
        Command::Authors(cmd) => run_authors(catalog, cmd).await,
        Command::Books(cmd) => run_books(catalog, cmd).await,
        Command::Categories(cmd) => run_categories(catalog, cmd).await,
        Command::Users(UserCommand::Add { username }) => {
            to_json(catalog.create_user(&username).await?)
        }
        Command::Buy {
            user,
            book,
            quantity,
        } => to_json(catalog.buy_book(user, book, quantity).await?),
        Command::Purchases(PurchaseCommand::List { user, list }) => {
            to_json(catalog.list_user_purchases(user, &list.to_params()).await?)
        }
        Command::Transactions(cmd) => run_transactions(catalog, cmd).await,
        Command::Favorites(cmd) => run_favorites(catalog, cmd).await,
        Command::Overview { concurrent } => {
            let overview = if concurrent {
                catalog.books_and_authors_concurrently().await?
            } else {
                catalog.books_and_authors_sequentially().await?
            };
            to_json(overview)
        }
        Command::NextCode { kind } => {
            let code = catalog
                .codes()
                .generate_for_name(catalog.storage(), &kind)
                .await?;
            Ok(json!({ "kind": kind, "code": code }))
        }
    }
}

async fn run_authors<S>(catalog: &Catalog<S>, command: AuthorCommand) -> anyhow::Result<Value>
where
    S: AtomicWrites + ?Sized,
{
    match command {
        AuthorCommand::Add { name, bio } => {
            to_json(catalog.create_author(Author::new(name).with_bio(bio)).await?)
        }
        AuthorCommand::List(list) => to_json(catalog.list_authors(&list.to_params()).await?),
        AuthorCommand::Show { id } => to_json(catalog.get_author(id).await?),
        AuthorCommand::Delete { id } => {
            catalog.delete_author(id).await?;
            Ok(deleted("Author", id))
        }
    }
}

fn new_book(args: NewBookArgs) -> Book {
    let mut book = Book::new(args.title, args.author)
        .with_description(args.description)
        .with_price(args.price)
        .with_stock(args.stock)
        .with_categories(args.categories);
    if let Some(publisher) = args.publisher {
        book.publisher = publisher;
    }
    book.publication_year = args.year;
    book
}

async fn run_books<S>(catalog: &Catalog<S>, command: BookCommand) -> anyhow::Result<Value>
where
    S: AtomicWrites + ?Sized,
{
    match command {
        BookCommand::Add(args) => to_json(catalog.create_book(new_book(args)).await?),
        BookCommand::List(list) => to_json(catalog.list_books(&list.to_params()).await?),
        BookCommand::Show { id } => to_json(catalog.get_book(id).await?),
        BookCommand::Delete { id } => {
            catalog.delete_book(id).await?;
            Ok(deleted("Book", id))
        }
        BookCommand::Import { author, count } => {
            let imported = catalog.import_books(author, count).await?;
            Ok(json!({ "requested": count, "imported": imported }))
        }
    }
}

async fn run_categories<S>(catalog: &Catalog<S>, command: CategoryCommand) -> anyhow::Result<Value>
where
    S: AtomicWrites + ?Sized,
{
    match command {
        CategoryCommand::Add { name, description } => to_json(
            catalog
                .create_category(Category::new(name).with_description(description))
                .await?,
        ),
        CategoryCommand::List(list) => to_json(catalog.list_categories(&list.to_params()).await?),
    }
}

async fn run_transactions<S>(
    catalog: &Catalog<S>,
    command: TransactionCommand,
) -> anyhow::Result<Value>
where
    S: AtomicWrites + ?Sized,
{
    match command {
        TransactionCommand::Create { user, purchases } => {
            to_json(catalog.create_transaction(user, &purchases).await?)
        }
        TransactionCommand::List {
            user: Some(user),
            list,
        } => to_json(catalog.list_user_transactions(user, &list.to_params()).await?),
        TransactionCommand::List { user: None, list } => {
            to_json(catalog.list_all_transactions(&list.to_params()).await?)
        }
        TransactionCommand::Status { id, status } => {
            to_json(catalog.update_transaction_status(id, status).await?)
        }
    }
}

async fn run_favorites<S>(catalog: &Catalog<S>, command: FavoriteCommand) -> anyhow::Result<Value>
where
    S: AtomicWrites + ?Sized,
{
    match command {
        FavoriteCommand::Add { user, book } => to_json(catalog.add_favorite(user, book).await?),
        FavoriteCommand::List { user, list } => {
            to_json(catalog.list_favorites(user, &list.to_params()).await?)
        }
        FavoriteCommand::Remove { user, id } => {
            catalog.remove_favorite(user, id).await?;
            Ok(deleted("FavoriteBook", id))
        }
    }
}
