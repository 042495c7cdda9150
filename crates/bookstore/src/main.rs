//! Bookstore command-line entry point.

use bookstore::{Cli, init_logging, open_catalog, run};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.config.log_level);

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    if cli.config.is_memory() {
        info!("Using an in-memory database; nothing will be kept after exit");
    }

    let catalog = open_catalog(&cli.config)?;
    let output = run(&catalog, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
