//! Error types for the index and its collaborators.
//!
//! The index itself only fails on malformed keys; "not found" on update or
//! delete is a no-op, not an error. Collaborator errors never touch index
//! state.

use thiserror::Error;

use crate::types::ChartHorizon;

/// Errors raised by [`OrderedIndex`](crate::index::OrderedIndex)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Record keys must be non-empty
    #[error("ticker must not be empty")]
    EmptyTicker,

    /// A structural invariant does not hold
    #[error("index corrupted: {reason}")]
    Corrupted {
        /// Which invariant failed and where
        reason: String,
    },
}

/// Why a single listing row was skipped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// Ticker column missing or empty
    #[error("missing ticker")]
    MissingTicker,

    /// A price column did not parse as a number
    #[error("column {column}: not a number: {value:?}")]
    InvalidNumber {
        /// Zero-based column index
        column: usize,
        /// Raw field text
        value: String,
    },
}

/// Errors raised while loading the listing file
#[derive(Error, Debug)]
pub enum IngestError {
    /// File could not be opened or read
    #[error("failed to read listing: {0}")]
    Io(#[from] std::io::Error),

    /// CSV framing error
    #[error("malformed listing: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised by the trend forecaster
#[derive(Error, Debug)]
pub enum ForecastError {
    /// History file could not be read
    #[error("failed to read price history: {0}")]
    Csv(#[from] csv::Error),

    /// No usable data points
    #[error("no valid data points in price history")]
    EmptySeries,

    /// Independent variable has zero variance
    #[error("regression is degenerate: zero variance in x")]
    DegenerateRegression,
}

/// Errors raised when resolving a chart link
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Record carries no link for the requested horizon
    #[error("no {horizon} chart available for {ticker}")]
    ChartUnavailable {
        /// Record key
        ticker: String,
        /// Requested horizon
        horizon: ChartHorizon,
    },

    /// The OS handler could not be launched
    #[error("failed to open chart: {0}")]
    Launch(#[from] std::io::Error),
}
