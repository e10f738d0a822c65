//! Ticker Index - Binary Entry Point
//!
//! Loads the listing, builds the index and hands stdin/stdout to the menu.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ticker_index::cli::Config;
use ticker_index::ingest::{build_index, load_records, ColumnLayout};
use ticker_index::resolver::SystemOpener;
use ticker_index::shell::Shell;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let report = load_records(&config.listing, &ColumnLayout::default())
        .with_context(|| format!("failed to load listing {}", config.listing.display()))?;
    let seed = report.seed().map(|record| record.ticker.clone());

    let index = build_index(&report.records);
    info!(
        records = index.len(),
        height = index.height(),
        state_root = %index.state_root_hex(),
        "index ready"
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut shell = Shell::new(index, stdin.lock(), stdout.lock(), SystemOpener)
        .with_seed(seed)
        .with_history(config.history.clone(), config.price_column);
    shell.run().context("terminal I/O failed")?;

    Ok(())
}
