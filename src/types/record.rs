//! Instrument snapshot held at each index position.
//!
//! ## Keying
//!
//! The `ticker` is the only field the index looks at for ordering. It is
//! compared byte-wise (`str::cmp`), so `"aapl"` and `"AAPL"` are distinct keys.
//!
//! ## Prices
//!
//! Prices are plain `f64`. No relation between `open`, `day_high`, `day_low`
//! and `last_price` is enforced; inconsistent source data is stored as-is.

use std::fmt;

// ============================================================================
// ChartHorizon enum
// ============================================================================

/// Horizon of a chart link attached to a record.
///
/// Menu numbering:
/// - Today = 1 (short)
/// - ThirtyDays = 2 (medium)
/// - Year = 3 (long)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartHorizon {
    /// Intraday chart
    Today,
    /// 30-day chart
    ThirtyDays,
    /// 365-day chart
    Year,
}

impl ChartHorizon {
    /// All horizons in menu order
    pub const ALL: [ChartHorizon; 3] = [
        ChartHorizon::Today,
        ChartHorizon::ThirtyDays,
        ChartHorizon::Year,
    ];

    /// Convert to the menu number
    pub fn to_choice(self) -> u8 {
        match self {
            ChartHorizon::Today => 1,
            ChartHorizon::ThirtyDays => 2,
            ChartHorizon::Year => 3,
        }
    }

    /// Convert from the menu number
    pub fn from_choice(value: u8) -> Option<Self> {
        match value {
            1 => Some(ChartHorizon::Today),
            2 => Some(ChartHorizon::ThirtyDays),
            3 => Some(ChartHorizon::Year),
            _ => None,
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            ChartHorizon::Today => "today",
            ChartHorizon::ThirtyDays => "30-day",
            ChartHorizon::Year => "365-day",
        }
    }
}

impl fmt::Display for ChartHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Record struct
// ============================================================================

/// Latest snapshot of one instrument.
///
/// ## Example
///
/// ```
/// use ticker_index::types::{ChartHorizon, Record};
///
/// let record = Record::new("AAPL", 189.5, 191.0, 188.2, 190.4)
///     .with_charts("https://c/today", "", "https://c/year");
///
/// assert_eq!(record.chart(ChartHorizon::Today), Some("https://c/today"));
/// assert_eq!(record.chart(ChartHorizon::ThirtyDays), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Unique, case-sensitive key
    pub ticker: String,

    /// Opening price
    pub open: f64,

    /// Session high
    pub day_high: f64,

    /// Session low
    pub day_low: f64,

    /// Last traded price, used by range and extremal scans
    pub last_price: f64,

    /// Intraday chart link (empty = unavailable)
    pub chart_today: String,

    /// 30-day chart link (empty = unavailable)
    pub chart_30_days: String,

    /// 365-day chart link (empty = unavailable)
    pub chart_365_days: String,
}

impl Record {
    /// Create a record without chart links
    pub fn new(
        ticker: impl Into<String>,
        open: f64,
        day_high: f64,
        day_low: f64,
        last_price: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            open,
            day_high,
            day_low,
            last_price,
            chart_today: String::new(),
            chart_30_days: String::new(),
            chart_365_days: String::new(),
        }
    }

    /// Attach the three chart links (short, medium, long horizon)
    pub fn with_charts(
        mut self,
        today: impl Into<String>,
        thirty_days: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        self.chart_today = today.into();
        self.chart_30_days = thirty_days.into();
        self.chart_365_days = year.into();
        self
    }

    /// Chart link for a horizon, `None` when the link is empty
    pub fn chart(&self, horizon: ChartHorizon) -> Option<&str> {
        let link = match horizon {
            ChartHorizon::Today => &self.chart_today,
            ChartHorizon::ThirtyDays => &self.chart_30_days,
            ChartHorizon::Year => &self.chart_365_days,
        };
        if link.is_empty() {
            None
        } else {
            Some(link.as_str())
        }
    }

    /// Replace this record's chart links with `other`'s.
    ///
    /// Used by the shell when the user re-keys prices but not links.
    pub fn with_charts_from(mut self, other: &Record) -> Self {
        self.chart_today = other.chart_today.clone();
        self.chart_30_days = other.chart_30_days.clone();
        self.chart_365_days = other.chart_365_days.clone();
        self
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticker: {}, Open: {}, Day High: {}, Day Low: {}, Last Price: {}",
            self.ticker, self.open, self.day_high, self.day_low, self.last_price
        )
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
