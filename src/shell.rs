//! Interactive menu over an [`OrderedIndex`].
//!
//! ## Input model
//!
//! Input is read as whitespace-separated tokens, so answers may be given one
//! per line or all on one line. A token that does not parse aborts the
//! current action, discards the rest of the buffered line and returns to the
//! menu. End of input exits the loop.
//!
//! ## Actions
//!
//! | # | Action |
//! |---|--------|
//! | 1 | Add stock |
//! | 2 | Update stock |
//! | 3 | Delete stock |
//! | 4 | Display all stocks |
//! | 5 | Visualize stock chart |
//! | 6 | Highest last price |
//! | 7 | Lowest last price |
//! | 8 | Fetch by price range or ticker |
//! | 9 | Predict next price |
//! | 10 | Exit |

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, info};

use crate::cli::DEFAULT_PRICE_COLUMN;
use crate::error::ResolveError;
use crate::forecast::{forecast_next, load_price_series};
use crate::index::{Extremum, OrderedIndex};
use crate::resolver::{open_chart, ChartOpener};
use crate::types::{ChartHorizon, Record};

// ============================================================================
// Action enum
// ============================================================================

/// Menu entries by number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Insert a new record
    Add,
    /// Replace an existing record's prices
    Update,
    /// Remove a record by ticker
    Delete,
    /// Print every record in ticker order
    List,
    /// Open a chart link
    Visualize,
    /// Highest last price
    Highest,
    /// Lowest last price
    Lowest,
    /// Price range or single-ticker query
    Fetch,
    /// Next-day price forecast
    Predict,
    /// Leave the menu
    Exit,
}

impl Action {
    /// Convert from the menu number
    pub fn from_choice(value: u32) -> Option<Self> {
        match value {
            1 => Some(Action::Add),
            2 => Some(Action::Update),
            3 => Some(Action::Delete),
            4 => Some(Action::List),
            5 => Some(Action::Visualize),
            6 => Some(Action::Highest),
            7 => Some(Action::Lowest),
            8 => Some(Action::Fetch),
            9 => Some(Action::Predict),
            10 => Some(Action::Exit),
            _ => None,
        }
    }
}

const MENU: &str = "\nMenu:\n\
    1. Add Stock\n\
    2. Update Stock\n\
    3. Delete Stock\n\
    4. Display All Stocks\n\
    5. Visualize Stock Chart\n\
    6. Find Highest Stock Price\n\
    7. Find Lowest Stock Price\n\
    8. Fetch Stocks (By Range or By Name)\n\
    9. Predict Stock Price\n\
    10. Exit\n";

// ============================================================================
// Token input
// ============================================================================

/// Why an action stopped before completing
#[derive(Debug)]
enum Interrupt {
    /// Input ended
    Eof,
    /// A token did not parse
    Invalid(String),
    /// Reading or writing failed
    Io(io::Error),
}

impl From<io::Error> for Interrupt {
    fn from(error: io::Error) -> Self {
        Interrupt::Io(error)
    }
}

#[derive(Debug)]
struct Tokens<R> {
    reader: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> Tokens<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> io::Result<Option<String>> {
        while self.pending.is_empty() {
            // Non-UTF-8 input decodes lossily into tokens that fail to parse
            let mut line = Vec::new();
            if self.reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(None);
            }
            let line = String::from_utf8_lossy(&line);
            self.pending.extend(line.split_whitespace().map(str::to_owned));
        }
        Ok(self.pending.pop_front())
    }

    fn discard_pending(&mut self) {
        self.pending.clear();
    }
}

// ============================================================================
// Shell
// ============================================================================

/// Menu loop owning the index for the lifetime of a session.
pub struct Shell<R, W, O> {
    index: OrderedIndex,
    input: Tokens<R>,
    out: W,
    opener: O,
    /// Ticker whose record seeds extremal scans
    seed: Option<String>,
    history: Option<PathBuf>,
    price_column: usize,
}

impl<R: BufRead, W: Write, O: ChartOpener> Shell<R, W, O> {
    /// Create a shell over a populated index
    pub fn new(index: OrderedIndex, input: R, out: W, opener: O) -> Self {
        Self {
            index,
            input: Tokens::new(input),
            out,
            opener,
            seed: None,
            history: None,
            price_column: DEFAULT_PRICE_COLUMN,
        }
    }

    /// Seed extremal scans with this ticker's record (normally the first
    /// loaded one)
    pub fn with_seed(mut self, ticker: Option<String>) -> Self {
        self.seed = ticker;
        self
    }

    /// Price history file and column used by the forecast action
    pub fn with_history(mut self, history: Option<PathBuf>, price_column: usize) -> Self {
        self.history = history;
        self.price_column = price_column;
        self
    }

    /// Consume the shell, returning the index and output sink
    pub fn into_parts(self) -> (OrderedIndex, W) {
        (self.index, self.out)
    }

    /// Run until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Only I/O failures on the input or output stream
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.out.write_all(MENU.as_bytes())?;
            match self.step() {
                Ok(true) => {}
                Ok(false) | Err(Interrupt::Eof) => break,
                Err(Interrupt::Invalid(token)) => {
                    self.input.discard_pending();
                    writeln!(self.out, "Invalid input '{token}'. Returning to the menu.")?;
                }
                Err(Interrupt::Io(error)) => return Err(error),
            }
        }
        self.out.flush()
    }

    /// One menu round; `Ok(false)` means exit.
    fn step(&mut self) -> Result<bool, Interrupt> {
        let choice: u32 = self.prompt_parsed("Enter your choice: ")?;
        let Some(action) = Action::from_choice(choice) else {
            writeln!(self.out, "Invalid choice. Try again.")?;
            return Ok(true);
        };
        debug!(?action, "menu action");

        match action {
            Action::Add => self.add()?,
            Action::Update => self.update()?,
            Action::Delete => self.delete()?,
            Action::List => self.list()?,
            Action::Visualize => self.visualize()?,
            Action::Highest => self.extremal(Extremum::Max)?,
            Action::Lowest => self.extremal(Extremum::Min)?,
            Action::Fetch => self.fetch()?,
            Action::Predict => self.predict()?,
            Action::Exit => {
                writeln!(self.out, "Exiting.")?;
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ========================================================================
    // Actions
    // ========================================================================

    fn add(&mut self) -> Result<(), Interrupt> {
        write!(self.out, "Enter ticker, open, day high, day low, and last price: ")?;
        self.out.flush()?;
        let ticker = self.token()?;
        let (open, high, low, last) = self.read_prices()?;
        let record = Record::new(ticker.clone(), open, high, low, last);

        match self.index.insert(record) {
            Ok(true) => {
                info!(%ticker, "record added");
                if self.seed.is_none() {
                    self.seed = Some(ticker.clone());
                }
                writeln!(self.out, "Added {ticker}.")?;
            }
            Ok(false) => writeln!(self.out, "Ticker {ticker} already exists; use Update Stock.")?,
            Err(error) => writeln!(self.out, "Error: {error}")?,
        }
        Ok(())
    }

    fn update(&mut self) -> Result<(), Interrupt> {
        let ticker = self.prompt_token("Enter stock ticker to update: ")?;
        write!(self.out, "Enter updated data for ticker (open, day high, day low, last price): ")?;
        self.out.flush()?;
        let (open, high, low, last) = self.read_prices()?;

        let Some(existing) = self.index.lookup(&ticker) else {
            writeln!(self.out, "Stock with ticker {ticker} not found.")?;
            return Ok(());
        };
        let record = Record::new(ticker.clone(), open, high, low, last).with_charts_from(existing);

        match self.index.update(record) {
            Ok(_) => {
                info!(%ticker, "record updated");
                writeln!(self.out, "Updated {ticker}.")?;
            }
            Err(error) => writeln!(self.out, "Error: {error}")?,
        }
        Ok(())
    }

    fn delete(&mut self) -> Result<(), Interrupt> {
        let ticker = self.prompt_token("Enter ticker to delete: ")?;
        match self.index.delete(&ticker) {
            Some(_) => {
                info!(%ticker, "record deleted");
                writeln!(self.out, "Deleted {ticker}.")?;
            }
            None => writeln!(self.out, "Stock with ticker {ticker} not found.")?,
        }
        Ok(())
    }

    fn list(&mut self) -> Result<(), Interrupt> {
        if self.index.is_empty() {
            writeln!(self.out, "No stocks loaded.")?;
            return Ok(());
        }
        writeln!(self.out, "Displaying all stocks:")?;
        for record in self.index.iter() {
            writeln!(self.out, "{record}")?;
        }
        Ok(())
    }

    fn visualize(&mut self) -> Result<(), Interrupt> {
        let ticker = self.prompt_token("Enter ticker to visualize chart: ")?;
        let Some(record) = self.index.lookup(&ticker).cloned() else {
            writeln!(self.out, "Error: Stock ticker {ticker} not found.")?;
            return Ok(());
        };

        writeln!(self.out, "\nWhich chart do you want to visualize?")?;
        for horizon in ChartHorizon::ALL {
            writeln!(self.out, "{}. {} chart", horizon.to_choice(), horizon)?;
        }
        let choice: u8 = self.prompt_parsed("Enter your choice: ")?;
        let Some(horizon) = ChartHorizon::from_choice(choice) else {
            writeln!(self.out, "Invalid choice. No chart displayed.")?;
            return Ok(());
        };

        match open_chart(&record, horizon, &mut self.opener) {
            Ok(link) => writeln!(self.out, "Opening chart for {ticker} at {link}")?,
            Err(ResolveError::ChartUnavailable { .. }) => {
                writeln!(self.out, "No chart available for the selected period.")?
            }
            Err(error) => writeln!(self.out, "Error: {error}")?,
        }
        Ok(())
    }

    fn extremal(&mut self, extremum: Extremum) -> Result<(), Interrupt> {
        let label = match extremum {
            Extremum::Max => "Highest",
            Extremum::Min => "Lowest",
        };

        // Prefer the configured seed while it is still indexed
        let seed = self
            .seed
            .as_deref()
            .and_then(|ticker| self.index.lookup(ticker))
            .or_else(|| self.index.iter().next());

        match seed {
            Some(seed) => {
                let best = self.index.find_extremal(extremum, seed);
                writeln!(self.out, "{label} Stock Price: {} - {}", best.ticker, best.last_price)?;
            }
            None => writeln!(self.out, "No stocks loaded.")?,
        }
        Ok(())
    }

    fn fetch(&mut self) -> Result<(), Interrupt> {
        writeln!(self.out, "Fetch Stocks By:\n1. By Price Range\n2. By Ticker Name")?;
        let choice: u32 = self.prompt_parsed("Enter your choice: ")?;

        match choice {
            1 => {
                let min: f64 = self.prompt_parsed("Enter minimum price: ")?;
                let max: f64 = self.prompt_parsed("Enter maximum price: ")?;
                let hits = self.index.range_scan(min, max);
                writeln!(self.out, "Stocks within the price range ({min}, {max}):")?;
                if hits.is_empty() {
                    writeln!(self.out, "None.")?;
                }
                for record in hits {
                    writeln!(self.out, "{record}")?;
                }
            }
            2 => {
                let ticker = self.prompt_token("Enter ticker to fetch: ")?;
                match self.index.lookup(&ticker) {
                    Some(record) => writeln!(self.out, "{record}")?,
                    None => writeln!(self.out, "Stock with ticker {ticker} not found.")?,
                }
            }
            _ => writeln!(self.out, "Invalid choice. Returning to the main menu.")?,
        }
        Ok(())
    }

    fn predict(&mut self) -> Result<(), Interrupt> {
        let Some(path) = self.history.clone() else {
            writeln!(self.out, "No price history configured (start with --history <PATH>).")?;
            return Ok(());
        };

        let outcome = load_price_series(&path, self.price_column)
            .and_then(|series| forecast_next(&series.values));

        match outcome {
            Ok(forecast) => writeln!(
                self.out,
                "Predicted price for the next day (day {}) is: {}",
                forecast.day, forecast.price
            )?,
            Err(error) => writeln!(self.out, "Error: {error}. No prediction made.")?,
        }
        Ok(())
    }

    // ========================================================================
    // Input helpers
    // ========================================================================

    fn token(&mut self) -> Result<String, Interrupt> {
        self.input.next_token()?.ok_or(Interrupt::Eof)
    }

    fn parsed<T: FromStr>(&mut self) -> Result<T, Interrupt> {
        let token = self.token()?;
        match token.parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(Interrupt::Invalid(token)),
        }
    }

    fn prompt_token(&mut self, prompt: &str) -> Result<String, Interrupt> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        self.token()
    }

    fn prompt_parsed<T: FromStr>(&mut self, prompt: &str) -> Result<T, Interrupt> {
        write!(self.out, "{prompt}")?;
        self.out.flush()?;
        self.parsed()
    }

    fn price(&mut self) -> Result<f64, Interrupt> {
        let token = self.token()?;
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(Interrupt::Invalid(token)),
        }
    }

    fn read_prices(&mut self) -> Result<(f64, f64, f64, f64), Interrupt> {
        Ok((self.price()?, self.price()?, self.price()?, self.price()?))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Default)]
    struct RecordingOpener {
        opened: Vec<String>,
    }

    impl ChartOpener for RecordingOpener {
        fn open(&mut self, link: &str) -> Result<(), ResolveError> {
            self.opened.push(link.to_owned());
            Ok(())
        }
    }

    fn scenario_index() -> OrderedIndex {
        let mut index = OrderedIndex::new();
        for (ticker, price) in [("AAA", 10.0), ("BBB", 5.0), ("CCC", 20.0), ("DDD", 1.0), ("EEE", 15.0)] {
            index.insert(Record::new(ticker, price, price, price, price)).unwrap();
        }
        index
            .update(Record::new("AAA", 10.0, 10.0, 10.0, 10.0).with_charts("https://t/AAA", "", ""))
            .unwrap();
        index
    }

    fn run_script(index: OrderedIndex, script: &str) -> (OrderedIndex, String, Vec<String>) {
        let mut opener = RecordingOpener::default();
        let mut shell = Shell::new(index, Cursor::new(script.to_owned()), Vec::new(), &mut opener)
            .with_seed(Some("AAA".to_string()));
        shell.run().unwrap();
        let (index, out) = shell.into_parts();
        (index, String::from_utf8(out).unwrap(), opener.opened)
    }

    impl ChartOpener for &mut RecordingOpener {
        fn open(&mut self, link: &str) -> Result<(), ResolveError> {
            (**self).open(link)
        }
    }

    #[test]
    fn test_action_from_choice() {
        assert_eq!(Action::from_choice(1), Some(Action::Add));
        assert_eq!(Action::from_choice(10), Some(Action::Exit));
        assert_eq!(Action::from_choice(0), None);
        assert_eq!(Action::from_choice(11), None);
    }

    #[test]
    fn test_exit_and_eof() {
        let (_, out, _) = run_script(OrderedIndex::new(), "10\n");
        assert!(out.contains("Exiting."));

        let (_, out, _) = run_script(OrderedIndex::new(), "");
        assert!(out.contains("Menu:"));
        assert!(!out.contains("Exiting."));
    }

    #[test]
    fn test_list_in_order() {
        let (_, out, _) = run_script(scenario_index(), "4\n10\n");

        let listed: Vec<&str> = out
            .lines()
            .filter_map(|line| line.strip_prefix("Ticker: "))
            .map(|rest| &rest[..3])
            .collect();
        assert_eq!(listed, ["AAA", "BBB", "CCC", "DDD", "EEE"]);
    }

    #[test]
    fn test_add_then_duplicate() {
        let (index, out, _) = run_script(
            OrderedIndex::new(),
            "1\nZZZ 1 2 0.5 1.5\n1\nZZZ 9 9 9 9\n10\n",
        );

        assert!(out.contains("Added ZZZ."));
        assert!(out.contains("Ticker ZZZ already exists"));
        assert_eq!(index.lookup("ZZZ").unwrap().last_price, 1.5);
    }

    #[test]
    fn test_update_keeps_chart_links() {
        let (index, out, _) = run_script(scenario_index(), "2\nAAA\n11 12 10 11.5\n10\n");

        assert!(out.contains("Updated AAA."));
        let record = index.lookup("AAA").unwrap();
        assert_eq!(record.last_price, 11.5);
        assert_eq!(record.chart_today, "https://t/AAA");
    }

    #[test]
    fn test_update_absent() {
        let (index, out, _) = run_script(scenario_index(), "2 QQQ 1 1 1 1\n10\n");

        assert!(out.contains("Stock with ticker QQQ not found."));
        assert!(index.lookup("QQQ").is_none());
    }

    #[test]
    fn test_delete() {
        let (index, out, _) = run_script(scenario_index(), "3\nBBB\n3\nBBB\n10\n");

        assert!(out.contains("Deleted BBB."));
        assert!(out.contains("Stock with ticker BBB not found."));
        let tickers: Vec<&str> = index.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, ["AAA", "CCC", "DDD", "EEE"]);
        assert!(index.validate().is_ok());
    }

    #[test]
    fn test_highest_and_lowest() {
        let (_, out, _) = run_script(scenario_index(), "6\n7\n10\n");

        assert!(out.contains("Highest Stock Price: CCC - 20"));
        assert!(out.contains("Lowest Stock Price: DDD - 1"));
    }

    #[test]
    fn test_extremal_after_seed_deleted() {
        let (_, out, _) = run_script(scenario_index(), "3 AAA\n6\n10\n");

        assert!(out.contains("Highest Stock Price: CCC - 20"));
    }

    #[test]
    fn test_extremal_empty() {
        let (_, out, _) = run_script(OrderedIndex::new(), "6\n10\n");

        assert!(out.contains("No stocks loaded."));
    }

    #[test]
    fn test_fetch_by_range() {
        let (_, out, _) = run_script(scenario_index(), "8\n1\n5\n15\n10\n");

        assert!(out.contains("Stocks within the price range (5, 15):"));
        let hits: Vec<&str> = out
            .lines()
            .filter_map(|line| line.strip_prefix("Ticker: "))
            .map(|rest| &rest[..3])
            .collect();
        assert_eq!(hits, ["AAA", "BBB", "EEE"]);
    }

    #[test]
    fn test_fetch_by_name() {
        let (_, out, _) = run_script(scenario_index(), "8 2 EEE\n8 2 XYZ\n10\n");

        assert!(out.contains("Ticker: EEE, Open: 15, Day High: 15, Day Low: 15, Last Price: 15"));
        assert!(out.contains("Stock with ticker XYZ not found."));
    }

    #[test]
    fn test_visualize() {
        let (_, out, opened) = run_script(scenario_index(), "5 AAA 1\n5 AAA 3\n5 AAA 9\n5 NOPE\n10\n");

        assert!(out.contains("Opening chart for AAA at https://t/AAA"));
        assert!(out.contains("No chart available for the selected period."));
        assert!(out.contains("Invalid choice. No chart displayed."));
        assert!(out.contains("Error: Stock ticker NOPE not found."));
        assert_eq!(opened, ["https://t/AAA"]);
    }

    #[test]
    fn test_invalid_input_returns_to_menu() {
        let (index, out, _) = run_script(scenario_index(), "1 NEW abc 1 1 1\n42\n4\n10\n");

        assert!(out.contains("Invalid input 'abc'"));
        assert!(out.contains("Invalid choice. Try again."));
        assert!(index.lookup("NEW").is_none());
        assert!(out.contains("Displaying all stocks:"));
    }

    #[test]
    fn test_non_finite_price_rejected() {
        let (index, out, _) = run_script(scenario_index(), "1 NAN 1 1 1 NaN\n2 AAA inf 1 1 1\n10\n");

        assert!(out.contains("Invalid input 'NaN'"));
        assert!(out.contains("Invalid input 'inf'"));
        assert!(index.lookup("NAN").is_none());
        assert_eq!(index.lookup("AAA").unwrap().open, 10.0);
    }

    #[test]
    fn test_non_utf8_line_returns_to_menu() {
        let mut script = b"3\n".to_vec();
        script.extend_from_slice(b"\xff\xfe\n");
        script.extend_from_slice(b"\xff\xfe\n4\n10\n");

        let mut shell = Shell::new(
            scenario_index(),
            Cursor::new(script),
            Vec::new(),
            RecordingOpener::default(),
        );
        shell.run().unwrap();
        let (index, out) = shell.into_parts();
        let out = String::from_utf8(out).unwrap();

        // First bad line is read as a ticker, the second as a menu choice
        assert!(out.contains("Stock with ticker \u{FFFD}\u{FFFD} not found."));
        assert!(out.contains("Invalid input '\u{FFFD}\u{FFFD}'"));
        assert!(out.contains("Displaying all stocks:"));
        assert!(out.contains("Exiting."));
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_predict_without_history() {
        let (_, out, _) = run_script(scenario_index(), "9\n10\n");

        assert!(out.contains("No price history configured"));
    }

    #[test]
    fn test_predict_from_history() {
        use std::io::Write as _;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,open,high,low,close").unwrap();
        for close in [1.0, 2.0, 3.0] {
            writeln!(file, "d,0,0,0,{close}").unwrap();
        }

        let mut shell = Shell::new(
            scenario_index(),
            Cursor::new("9\n10\n".to_string()),
            Vec::new(),
            RecordingOpener::default(),
        )
        .with_history(Some(file.path().to_path_buf()), 4);
        shell.run().unwrap();
        let (_, out) = shell.into_parts();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Predicted price for the next day (day 3) is: 4"));
    }

    #[test]
    fn test_predict_degenerate() {
        use std::io::Write as _;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,open,high,low,close").unwrap();
        writeln!(file, "d,0,0,0,5").unwrap();

        let mut shell = Shell::new(
            OrderedIndex::new(),
            Cursor::new("9\n10\n".to_string()),
            Vec::new(),
            RecordingOpener::default(),
        )
        .with_history(Some(file.path().to_path_buf()), 4);
        shell.run().unwrap();
        let (_, out) = shell.into_parts();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("regression is degenerate"));
        assert!(out.contains("No prediction made."));
    }
}
