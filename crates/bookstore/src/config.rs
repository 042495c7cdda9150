//! Application configuration.
//!
//! Every setting can be given as a command-line flag or through the
//! environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BOOKSTORE_DATABASE_URL` | bookstore.db | SQLite file, or `:memory:` |
//! | `BOOKSTORE_LOG_LEVEL` | info | Log level |
//! | `BOOKSTORE_MAX_CONNECTIONS` | 10 | Connection pool size |
//! | `BOOKSTORE_BUSY_TIMEOUT_MS` | 5000 | SQLite busy timeout (ms) |
//! | `BOOKSTORE_CODE_PREFIXES` | (empty) | Code prefix overrides, e.g. `User=USR,Author=WR` |
//!
//! # Example
//!
//! ```rust
//! use bookstore::AppConfig;
//!
//! let config = AppConfig {
//!     database_url: ":memory:".to_string(),
//!     code_prefixes: "User=USR".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use bookstore_persistence::backends::sqlite::SqliteBackendConfig;
use bookstore_persistence::codegen::PrefixRegistry;
use clap::Args;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Database, logging and code settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// SQLite database file, or `:memory:` for a throwaway database.
    #[arg(long, env = "BOOKSTORE_DATABASE_URL", default_value = "bookstore.db", global = true)]
    pub database_url: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "BOOKSTORE_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Maximum number of pooled connections.
    #[arg(long, env = "BOOKSTORE_MAX_CONNECTIONS", default_value = "10", global = true)]
    pub max_connections: u32,

    /// How long a connection waits on a locked database, in milliseconds.
    #[arg(long, env = "BOOKSTORE_BUSY_TIMEOUT_MS", default_value = "5000", global = true)]
    pub busy_timeout_ms: u32,

    /// Comma-separated `Kind=PREFIX` pairs that replace or extend the
    /// default code prefixes.
    #[arg(long, env = "BOOKSTORE_CODE_PREFIXES", default_value = "", global = true)]
    pub code_prefixes: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "bookstore.db".to_string(),
            log_level: "info".to_string(),
            max_connections: 10,
            busy_timeout_ms: 5000,
            code_prefixes: String::new(),
        }
    }
}

impl AppConfig {
    /// Returns true if the database lives only in memory.
    pub fn is_memory(&self) -> bool {
        self.database_url == ":memory:"
    }

    /// Builds the SQLite backend configuration.
    pub fn backend_config(&self) -> SqliteBackendConfig {
        SqliteBackendConfig {
            max_connections: self.max_connections,
            busy_timeout_ms: self.busy_timeout_ms,
            ..Default::default()
        }
    }

    /// Builds the code prefix registry, applying any overrides.
    pub fn prefix_registry(&self) -> anyhow::Result<PrefixRegistry> {
        Ok(PrefixRegistry::default().with_overrides(&self.code_prefixes)?)
    }

    /// Validates the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "Unknown log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.max_connections == 0 {
            errors.push("Max connections cannot be 0".to_string());
        }

        if let Err(e) = self.prefix_registry() {
            errors.push(format!("Invalid code prefixes: {}", e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration for tests: in-memory database, debug logging.
    pub fn for_testing() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            log_level: "debug".to_string(),
            max_connections: 1,
            busy_timeout_ms: 1000,
            code_prefixes: String::new(),
        }
    }
}
