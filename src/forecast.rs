//! Least-squares trend forecast over a separately loaded price history.
//!
//! Independent of the index: the history comes from its own CSV file and is
//! a plain `Vec<f64>`, not records. Day indices `0..n` are the x values and
//! the forecast is the fitted line evaluated at day `n`.

use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::error::ForecastError;

/// Close prices read from a history file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    /// Parsed values in file order
    pub values: Vec<f64>,
    /// Non-numeric or non-finite values that were reported and dropped
    pub skipped: usize,
}

/// Fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    /// Change per day
    pub slope: f64,
    /// Value at day 0
    pub intercept: f64,
}

/// Predicted next point of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    /// Day index being predicted (equals the number of input points)
    pub day: usize,
    /// Predicted value
    pub price: f64,
    /// Line it was read from
    pub trend: TrendLine,
}

/// Read one column of a price history file.
///
/// The header line is skipped. Rows too short to have `column` are ignored;
/// values that are not finite numbers are logged, counted and dropped.
pub fn load_price_series(path: &Path, column: usize) -> Result<PriceSeries, ForecastError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let series = read_series(reader, column)?;
    info!(
        path = %path.display(),
        points = series.values.len(),
        skipped = series.skipped,
        "price history loaded"
    );
    Ok(series)
}

/// Same as [`load_price_series`] over any reader
pub fn price_series_from_reader<R: Read>(reader: R, column: usize) -> Result<PriceSeries, ForecastError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    read_series(reader, column)
}

fn read_series<R: Read>(mut reader: csv::Reader<R>, column: usize) -> Result<PriceSeries, ForecastError> {
    let mut series = PriceSeries::default();
    for row in reader.byte_records() {
        let row = row?;
        let Some(raw) = row.get(column) else {
            continue;
        };
        let raw = String::from_utf8_lossy(raw);
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => series.values.push(value),
            _ => {
                warn!(value = %raw, "skipping non-numeric price");
                series.skipped += 1;
            }
        }
    }
    Ok(series)
}

impl TrendLine {
    /// Ordinary least squares over paired points.
    ///
    /// Extra points in the longer slice are ignored.
    ///
    /// # Errors
    ///
    /// * `ForecastError::EmptySeries` - No points
    /// * `ForecastError::DegenerateRegression` - All x values are equal
    ///
    /// # Example
    ///
    /// ```
    /// use ticker_index::forecast::TrendLine;
    ///
    /// let line = TrendLine::fit(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
    /// assert_eq!(line.slope, 2.0);
    /// assert_eq!(line.intercept, 1.0);
    /// assert_eq!(line.predict(3.0), 7.0);
    /// ```
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, ForecastError> {
        let n = xs.len().min(ys.len());
        if n == 0 {
            return Err(ForecastError::EmptySeries);
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);

        let x_mean = mean(xs);
        let y_mean = mean(ys);

        let (numerator, denominator) = xs.iter().zip(ys).fold((0.0, 0.0), |(num, den), (x, y)| {
            let dx = x - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

        if denominator == 0.0 {
            return Err(ForecastError::DegenerateRegression);
        }

        let slope = numerator / denominator;
        Ok(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    /// Evaluate the line at `x`
    #[inline]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `prices` against day indices and predict the following day.
pub fn forecast_next(prices: &[f64]) -> Result<Forecast, ForecastError> {
    let days: Vec<f64> = (0..prices.len()).map(|day| day as f64).collect();
    let trend = TrendLine::fit(&days, prices)?;
    let day = prices.len();
    Ok(Forecast {
        day,
        price: trend.predict(day as f64),
        trend,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fit_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [5.0, 3.0, 1.0, -1.0];

        let line = TrendLine::fit(&xs, &ys).unwrap();

        assert!(approx(line.slope, -2.0));
        assert!(approx(line.intercept, 5.0));
    }

    #[test]
    fn test_fit_noisy_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 2.0, 2.0, 3.0];

        let line = TrendLine::fit(&xs, &ys).unwrap();

        // Sxy = 3.0, Sxx = 5.0
        assert!(approx(line.slope, 0.6));
        assert!(approx(line.intercept, 1.1));
    }

    #[test]
    fn test_fit_degenerate() {
        let result = TrendLine::fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);

        assert!(matches!(result, Err(ForecastError::DegenerateRegression)));
    }

    #[test]
    fn test_fit_empty() {
        assert!(matches!(TrendLine::fit(&[], &[]), Err(ForecastError::EmptySeries)));
    }

    #[test]
    fn test_forecast_next_linear_series() {
        let prices = [10.0, 12.0, 14.0, 16.0, 18.0];

        let forecast = forecast_next(&prices).unwrap();

        assert_eq!(forecast.day, 5);
        assert!(approx(forecast.price, 20.0));
    }

    #[test]
    fn test_forecast_flat_series_is_not_degenerate() {
        let forecast = forecast_next(&[7.0, 7.0, 7.0]).unwrap();

        assert!(approx(forecast.trend.slope, 0.0));
        assert!(approx(forecast.price, 7.0));
    }

    #[test]
    fn test_forecast_single_point_is_degenerate() {
        assert!(matches!(
            forecast_next(&[42.0]),
            Err(ForecastError::DegenerateRegression)
        ));
    }

    #[test]
    fn test_forecast_empty() {
        assert!(matches!(forecast_next(&[]), Err(ForecastError::EmptySeries)));
    }

    #[test]
    fn test_series_skips_non_numeric_and_short_rows() {
        let data = "date,open,high,low,close\n\
                    d1,1,1,1,10.5\n\
                    d2,1,1,1,null\n\
                    d3,1\n\
                    d4,1,1,1, 11.5 \n";

        let series = price_series_from_reader(data.as_bytes(), 4).unwrap();

        assert_eq!(series.values, vec![10.5, 11.5]);
        assert_eq!(series.skipped, 1);
    }

    #[test]
    fn test_series_skips_non_finite_values() {
        let data = "date,open,high,low,close\n\
                    d1,1,1,1,1.0\n\
                    d2,1,1,1,NaN\n\
                    d3,1,1,1,inf\n\
                    d4,1,1,1,2.0\n";

        let series = price_series_from_reader(data.as_bytes(), 4).unwrap();
        let forecast = forecast_next(&series.values).unwrap();

        assert_eq!(series.values, vec![1.0, 2.0]);
        assert_eq!(series.skipped, 2);
        assert!(approx(forecast.price, 3.0));
    }

    #[test]
    fn test_load_price_series_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,open,high,low,close").unwrap();
        for (day, close) in [1.0, 2.0, 3.0].iter().enumerate() {
            writeln!(file, "d{day},0,0,0,{close}").unwrap();
        }

        let series = load_price_series(file.path(), 4).unwrap();
        let forecast = forecast_next(&series.values).unwrap();

        assert!(approx(forecast.price, 4.0));
    }

    #[test]
    fn test_load_price_series_missing_file() {
        let result = load_price_series(Path::new("/definitely/not/here.csv"), 4);

        assert!(matches!(result, Err(ForecastError::Csv(_))));
    }
}
