//! Command-line arguments.

use bookstore_persistence::model::TransactionStatus;
use bookstore_persistence::types::QueryParams;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::config::AppConfig;

/// Bookstore catalog, purchases and checkout.
#[derive(Debug, Parser)]
#[command(name = "bookstore", version)]
#[command(about = "Bookstore catalog, purchases and checkout")]
pub struct Cli {
    #[command(flatten)]
    pub config: AppConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the database schema.
    Init,

    /// Manage authors.
    #[command(subcommand)]
    Authors(AuthorCommand),

    /// Manage books.
    #[command(subcommand)]
    Books(BookCommand),

    /// Manage categories.
    #[command(subcommand)]
    Categories(CategoryCommand),

    /// Manage users.
    #[command(subcommand)]
    Users(UserCommand),

    /// Buy a book for a user.
    Buy {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        book: u64,
        #[arg(long, default_value = "1")]
        quantity: u32,
    },

    /// Inspect a user's purchases.
    #[command(subcommand)]
    Purchases(PurchaseCommand),

    /// Check out purchases and track their status.
    #[command(subcommand)]
    Transactions(TransactionCommand),

    /// Manage a user's favorite books.
    #[command(subcommand)]
    Favorites(FavoriteCommand),

    /// Every active book and every author.
    Overview {
        /// Read books and authors at the same time.
        #[arg(long)]
        concurrent: bool,
    },

    /// Print the code the next row of a kind would receive.
    NextCode {
        /// Entity kind, e.g. `Author` or `transaction`.
        kind: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AuthorCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        bio: String,
    },
    List(ListArgs),
    Show { id: u64 },
    Delete { id: u64 },
}

#[derive(Debug, Clone, Subcommand)]
pub enum BookCommand {
    Add(NewBookArgs),
    List(ListArgs),
    Show { id: u64 },
    Delete { id: u64 },
    /// Create `count` generated books for an author.
    Import {
        #[arg(long)]
        author: u64,
        #[arg(long, default_value = "10")]
        count: u32,
    },
}

#[derive(Debug, Clone, Args)]
pub struct NewBookArgs {
    pub title: String,
    #[arg(long)]
    pub author: u64,
    #[arg(long, default_value = "0")]
    pub price: Decimal,
    #[arg(long, default_value = "10")]
    pub stock: u32,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Category id; repeat for several.
    #[arg(long = "category")]
    pub categories: Vec<u64>,
    #[arg(long)]
    pub publisher: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CategoryCommand {
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    List(ListArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum UserCommand {
    Add { username: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PurchaseCommand {
    List {
        #[arg(long)]
        user: u64,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TransactionCommand {
    /// Check out purchases into one transaction.
    Create {
        #[arg(long)]
        user: u64,
        /// Purchase id; repeat for several.
        #[arg(long = "purchase", required = true)]
        purchases: Vec<u64>,
    },
    /// List transactions, all of them unless `--user` is given.
    List {
        #[arg(long)]
        user: Option<u64>,
        #[command(flatten)]
        list: ListArgs,
    },
    Status {
        id: u64,
        status: TransactionStatus,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum FavoriteCommand {
    Add {
        #[arg(long)]
        user: u64,
        #[arg(long)]
        book: u64,
    },
    List {
        #[arg(long)]
        user: u64,
        #[command(flatten)]
        list: ListArgs,
    },
    Remove {
        #[arg(long)]
        user: u64,
        id: u64,
    },
}

/// Pagination and search flags shared by every list command.
///
/// Values are passed through as raw strings so the paginator reports bad
/// input the same way it does for a query string.
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub page: Option<String>,
    #[arg(long)]
    pub limit: Option<String>,
    #[arg(long)]
    pub search: Option<String>,
    /// Comma-separated field names.
    #[arg(long)]
    pub search_fields: Option<String>,
    /// `AND` or `OR`.
    #[arg(long)]
    pub search_operator: Option<String>,
}

impl ListArgs {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .with_opt("page", self.page.clone())
            .with_opt("limit", self.limit.clone())
            .with_opt("search", self.search.clone())
            .with_opt("search_fields", self.search_fields.clone())
            .with_opt("search_operator", self.search_operator.clone())
    }
}

#[cfg(test)]
mod tests {
    use bookstore_persistence::types::ParamSource;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bookstore").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_flags_become_params() {
        let cli = parse(&[
            "books",
            "list",
            "--page",
            "2",
            "--search",
            "tolkien",
            "--search-fields",
            "title,description",
        ]);
        let Command::Books(BookCommand::List(list)) = cli.command else {
            panic!("expected books list");
        };
        let params = list.to_params();
        assert_eq!(params.param("page"), Some("2"));
        assert_eq!(params.param("limit"), None);
        assert_eq!(params.param("search"), Some("tolkien"));
        assert_eq!(params.param("search_fields"), Some("title,description"));
    }

    #[test]
    fn test_empty_flag_value_is_kept() {
        let cli = parse(&["authors", "list", "--limit", ""]);
        let Command::Authors(AuthorCommand::List(list)) = cli.command else {
            panic!("expected authors list");
        };
        assert_eq!(list.to_params().param("limit"), Some(""));
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = parse(&["--log-level", "debug", "init", "--database-url", ":memory:"]);
        assert_eq!(cli.config.log_level, "debug");
        assert!(cli.config.is_memory());
        assert!(matches!(cli.command, Command::Init));
    }

    #[test]
    fn test_book_add_arguments() {
        let cli = parse(&[
            "books", "add", "Dune", "--author", "1", "--price", "12.50", "--category", "2",
            "--category", "3",
        ]);
        let Command::Books(BookCommand::Add(book)) = cli.command else {
            panic!("expected books add");
        };
        assert_eq!(book.title, "Dune");
        assert_eq!(book.price, Decimal::new(1250, 2));
        assert_eq!(book.stock, 10);
        assert_eq!(book.categories, vec![2, 3]);
    }

    #[test]
    fn test_transaction_status_is_parsed() {
        let cli = parse(&["transactions", "status", "4", "approved"]);
        assert!(matches!(
            cli.command,
            Command::Transactions(TransactionCommand::Status {
                id: 4,
                status: TransactionStatus::Approved
            })
        ));
        assert!(
            Cli::try_parse_from(["bookstore", "transactions", "status", "4", "lost"]).is_err()
        );
    }

    #[test]
    fn test_transaction_requires_a_purchase() {
        assert!(Cli::try_parse_from(["bookstore", "transactions", "create", "--user", "1"]).is_err());
    }
}
