//! Listing loader: positional CSV rows into [`Record`]s.
//!
//! ## Format
//!
//! Comma-separated, one header line (discarded), rows may carry any number
//! of fields. Fields are picked by zero-based column index through a
//! [`ColumnLayout`]; column names are ignored.
//!
//! ## Malformed rows
//!
//! A row without a ticker, or with a price field that is not a finite
//! number, is logged, recorded in [`LoadReport::skipped`] and skipped.
//! Loading always continues. A price column past the end of a short row reads as `0.0` and a
//! missing chart column reads as "unavailable".

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ByteRecord;
use tracing::{debug, info, warn};

use crate::error::{IngestError, RowError};
use crate::index::OrderedIndex;
use crate::types::Record;

/// Zero-based column positions of each record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Record key
    pub ticker: usize,
    /// Opening price
    pub open: usize,
    /// Session high
    pub day_high: usize,
    /// Session low
    pub day_low: usize,
    /// Last traded price
    pub last_price: usize,
    /// Intraday chart link
    pub chart_today: usize,
    /// 30-day chart link
    pub chart_30_days: usize,
    /// 365-day chart link
    pub chart_365_days: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            ticker: 1,
            open: 3,
            day_high: 4,
            day_low: 5,
            last_price: 6,
            chart_today: 24,
            chart_30_days: 23,
            chart_365_days: 20,
        }
    }
}

/// A row that was reported and skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the source
    pub line: u64,
    /// Why the row was rejected
    pub error: RowError,
}

/// Outcome of a load: good records in file order plus skipped rows.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Parsed records in file order
    pub records: Vec<Record>,
    /// Rows that were rejected
    pub skipped: Vec<SkippedRow>,
}

impl LoadReport {
    /// First loaded record, used to seed extremal scans
    pub fn seed(&self) -> Option<&Record> {
        self.records.first()
    }
}

/// Load a listing file.
///
/// # Errors
///
/// * `IngestError::Io` - The file could not be opened
/// * `IngestError::Csv` - The underlying reader failed mid-file
pub fn load_records(path: &Path, layout: &ColumnLayout) -> Result<LoadReport, IngestError> {
    let file = File::open(path)?;
    let report = load_from_reader(file, layout)?;
    info!(
        path = %path.display(),
        loaded = report.records.len(),
        skipped = report.skipped.len(),
        "listing loaded"
    );
    Ok(report)
}

/// Load a listing from any reader.
///
/// # Example
///
/// ```
/// use ticker_index::ingest::{load_from_reader, ColumnLayout};
///
/// let data = "id,ticker,name,open,high,low,last\n\
///             1,AAPL,Apple,189.5,191.0,188.2,190.4\n\
///             2,,Nameless,1,1,1,1\n";
///
/// let report = load_from_reader(data.as_bytes(), &ColumnLayout::default()).unwrap();
/// assert_eq!(report.records.len(), 1);
/// assert_eq!(report.records[0].ticker, "AAPL");
/// assert_eq!(report.skipped.len(), 1);
/// ```
pub fn load_from_reader<R: Read>(reader: R, layout: &ColumnLayout) -> Result<LoadReport, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut report = LoadReport::default();
    let mut row = ByteRecord::new();

    while reader.read_byte_record(&mut row)? {
        let line = row.position().map_or(0, |p| p.line());
        match parse_row(&row, layout) {
            Ok(record) => report.records.push(record),
            Err(error) => {
                warn!(line, %error, row = %display_row(&row), "skipping listing row");
                report.skipped.push(SkippedRow { line, error });
            }
        }
    }

    Ok(report)
}

/// Build an index from loaded records; duplicate tickers keep the first row.
pub fn build_index(records: &[Record]) -> OrderedIndex {
    let mut index = OrderedIndex::with_capacity(records.len());
    for record in records {
        match index.insert(record.clone()) {
            Ok(true) => {}
            Ok(false) => debug!(ticker = %record.ticker, "duplicate ticker ignored"),
            Err(error) => warn!(%error, "record rejected by index"),
        }
    }
    index
}

fn parse_row(row: &ByteRecord, layout: &ColumnLayout) -> Result<Record, RowError> {
    let ticker = field(row, layout.ticker)
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .ok_or(RowError::MissingTicker)?;

    Ok(Record {
        ticker,
        open: price(row, layout.open)?,
        day_high: price(row, layout.day_high)?,
        day_low: price(row, layout.day_low)?,
        last_price: price(row, layout.last_price)?,
        chart_today: link(row, layout.chart_today),
        chart_30_days: link(row, layout.chart_30_days),
        chart_365_days: link(row, layout.chart_365_days),
    })
}

fn field(row: &ByteRecord, column: usize) -> Option<Cow<'_, str>> {
    row.get(column).map(String::from_utf8_lossy)
}

fn price(row: &ByteRecord, column: usize) -> Result<f64, RowError> {
    match field(row, column) {
        None => Ok(0.0),
        Some(value) => match value.trim().parse::<f64>() {
            Ok(price) if price.is_finite() => Ok(price),
            _ => Err(RowError::InvalidNumber {
                column,
                value: value.into_owned(),
            }),
        },
    }
}

fn display_row(row: &ByteRecord) -> String {
    row.iter()
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(",")
}

fn link(row: &ByteRecord, column: usize) -> String {
    field(row, column)
        .map(|value| value.trim().to_owned())
        .unwrap_or_default()
}

// ============================================================================
// Unit Tests
// ============================================================================
