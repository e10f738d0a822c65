//! Command-line configuration for the `ticker-index` binary.

use std::ffi::OsString;
use std::path::PathBuf;

/// Default column of the close price in the history file
pub const DEFAULT_PRICE_COLUMN: usize = 4;

/// Runtime configuration parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Listing CSV loaded into the index at startup
    pub listing: PathBuf,
    /// Price history CSV used by the forecast action
    pub history: Option<PathBuf>,
    /// Zero-based column of the price in `history`
    pub price_column: usize,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list (first item is the binary name).
    ///
    /// # Errors
    /// * If required arguments are missing or invalid.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        Config {
            listing: matches.get_one::<PathBuf>("listing").cloned().unwrap_or_default(),
            history: matches.get_one::<PathBuf>("history").cloned(),
            price_column: matches
                .get_one::<usize>("price-column")
                .copied()
                .unwrap_or(DEFAULT_PRICE_COLUMN),
            log_level: matches
                .get_one::<String>("log-level")
                .cloned()
                .unwrap_or_else(|| "info".to_string()),
        }
    }
}

fn command() -> clap::Command {
    clap::Command::new("ticker-index")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interactive AVL index of instrument snapshots keyed by ticker")
        .arg(
            clap::Arg::new("listing")
                .short('l')
                .long("listing")
                .help("Path to the listing CSV (header line + positional columns)")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::Arg::new("history")
                .short('p')
                .long("history")
                .help("Path to the price history CSV used for forecasting")
                .num_args(1)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::Arg::new("price-column")
                .short('c')
                .long("price-column")
                .help("Zero-based price column in the history file")
                .num_args(1)
                .default_value("4")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("log-level")
                .long("log-level")
                .help("Log filter used when RUST_LOG is unset")
                .num_args(1)
                .default_value("info")
                .value_parser(["error", "warn", "info", "debug", "trace"]),
        )
}
