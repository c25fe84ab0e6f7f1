//! # Market Data
//!
//! `market_data` provides the historical price series types and the data
//! provider interface used by the forecasting crates in this workspace.
//!
//! A [`PriceSeries`] is a validated, time-ordered sequence of daily closing
//! prices. Providers implement [`MarketDataProvider`] to resolve a ticker
//! symbol and a [`DateRange`] into a series; the workspace bundles a
//! CSV-backed provider and a synthetic generator for tests and demos.
//!
//! ## Usage Example
//!
//! ```
//! use market_data::providers::SyntheticDataProvider;
//! use market_data::{DateRange, MarketDataProvider};
//! use chrono::NaiveDate;
//!
//! let provider = SyntheticDataProvider::default().with_seed(7);
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
//! ).unwrap();
//!
//! let series = provider.fetch_price_series("AAPL", &range).unwrap();
//! assert!(!series.is_empty());
//! ```

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod providers;

pub use providers::{CsvDataProvider, SyntheticDataProvider};

/// Errors that can occur while fetching or validating market data
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The ticker is unknown or the requested range yields no data
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// The series violates its ordering or value invariants
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// The requested date range is malformed
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(String),
}

impl From<csv::Error> for MarketDataError {
    fn from(err: csv::Error) -> Self {
        MarketDataError::CsvError(err.to_string())
    }
}

/// A single daily observation: date and closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Date of the observation
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

/// An inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date of the range
    pub start: NaiveDate,
    /// Last date of the range
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a new date range; `start` must not be after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, MarketDataError> {
        if start > end {
            return Err(MarketDataError::InvalidRange(format!(
                "start ({}) is after end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range covering the `years` calendar years up to and including `today`
    pub fn last_years(years: u32, today: NaiveDate) -> Result<Self, MarketDataError> {
        let start = today
            .checked_sub_months(Months::new(years * 12))
            .ok_or_else(|| {
                MarketDataError::InvalidRange(format!("{} years before {} underflows", years, today))
            })?;
        Self::new(start, today)
    }

    /// Whether the range contains the given date
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days in the range, inclusive
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A time-ordered series of daily closing prices for one instrument.
///
/// Invariants enforced at construction: at least one point, dates strictly
/// increasing (no duplicates), all closes finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a validated price series from raw points
    pub fn new(points: Vec<PricePoint>) -> Result<Self, MarketDataError> {
        if points.is_empty() {
            return Err(MarketDataError::InvalidSeries(
                "series must contain at least one point".to_string(),
            ));
        }

        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(MarketDataError::InvalidSeries(format!(
                    "dates must be strictly increasing, found {} after {}",
                    pair[1].date, pair[0].date
                )));
            }
        }

        if let Some(point) = points.iter().find(|p| !p.close.is_finite()) {
            return Err(MarketDataError::InvalidSeries(format!(
                "non-finite close at {}",
                point.date
            )));
        }

        Ok(Self { points })
    }

    /// Build a series from parallel date and close vectors
    pub fn from_parts(dates: Vec<NaiveDate>, closes: Vec<f64>) -> Result<Self, MarketDataError> {
        if dates.len() != closes.len() {
            return Err(MarketDataError::InvalidSeries(format!(
                "dates ({}) and closes ({}) differ in length",
                dates.len(),
                closes.len()
            )));
        }

        let points = dates
            .into_iter()
            .zip(closes)
            .map(|(date, close)| PricePoint { date, close })
            .collect();

        Self::new(points)
    }

    /// All points in chronological order
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Closing prices in chronological order
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Dates in chronological order
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// The most recent closing price
    pub fn last_close(&self) -> f64 {
        // construction guarantees at least one point
        self.points[self.points.len() - 1].close
    }

    /// The most recent date
    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Number of points in the series
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series is empty (never true for a constructed series)
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Restrict the series to points inside `range`
    pub fn restrict(&self, range: &DateRange) -> Result<Self, MarketDataError> {
        let points: Vec<PricePoint> = self
            .points
            .iter()
            .copied()
            .filter(|p| range.contains(p.date))
            .collect();

        if points.is_empty() {
            return Err(MarketDataError::DataUnavailable(format!(
                "no points between {} and {}",
                range.start, range.end
            )));
        }

        Ok(Self { points })
    }
}

/// Day-over-day percentage change of the closing prices.
///
/// The first observation has no predecessor, so the output has one fewer
/// element than the series. A zero previous close contributes no change.
pub fn daily_changes(series: &PriceSeries) -> Vec<f64> {
    series
        .points
        .windows(2)
        .map(|pair| {
            let prev = pair[0].close;
            if prev == 0.0 {
                0.0
            } else {
                (pair[1].close - prev) / prev * 100.0
            }
        })
        .collect()
}

/// Capability to resolve a ticker and date range into a price series
pub trait MarketDataProvider {
    /// Fetch the historical closing prices for `ticker` within `range`
    fn fetch_price_series(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<PriceSeries, MarketDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::from_parts(
            vec![date(2023, 1, 2), date(2023, 1, 3), date(2023, 1, 4)],
            vec![100.0, 110.0, 99.0],
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_series() {
        assert!(matches!(
            PriceSeries::new(vec![]),
            Err(MarketDataError::InvalidSeries(_))
        ));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let result = PriceSeries::from_parts(
            vec![date(2023, 1, 2), date(2023, 1, 2)],
            vec![100.0, 101.0],
        );
        assert!(matches!(result, Err(MarketDataError::InvalidSeries(_))));
    }

    #[test]
    fn rejects_out_of_order_dates() {
        let result = PriceSeries::from_parts(
            vec![date(2023, 1, 3), date(2023, 1, 2)],
            vec![100.0, 101.0],
        );
        assert!(matches!(result, Err(MarketDataError::InvalidSeries(_))));
    }

    #[test]
    fn rejects_non_finite_close() {
        let result =
            PriceSeries::from_parts(vec![date(2023, 1, 2), date(2023, 1, 3)], vec![100.0, f64::NAN]);
        assert!(matches!(result, Err(MarketDataError::InvalidSeries(_))));
    }

    #[test]
    fn daily_changes_match_hand_computation() {
        let series = sample_series();
        let changes = daily_changes(&series);

        assert_eq!(changes.len(), 2);
        assert!((changes[0] - 10.0).abs() < 1e-9);
        assert!((changes[1] - (-10.0)).abs() < 1e-9);
    }

    #[test]
    fn restrict_filters_to_range() {
        let series = sample_series();
        let range = DateRange::new(date(2023, 1, 3), date(2023, 1, 4)).unwrap();

        let restricted = series.restrict(&range).unwrap();
        assert_eq!(restricted.len(), 2);
        assert_eq!(restricted.last_close(), 99.0);
    }

    #[test]
    fn restrict_outside_range_is_unavailable() {
        let series = sample_series();
        let range = DateRange::new(date(2024, 1, 1), date(2024, 2, 1)).unwrap();

        assert!(matches!(
            series.restrict(&range),
            Err(MarketDataError::DataUnavailable(_))
        ));
    }

    #[test]
    fn date_range_validation() {
        assert!(DateRange::new(date(2023, 2, 1), date(2023, 1, 1)).is_err());

        let range = DateRange::last_years(1, date(2023, 6, 15)).unwrap();
        assert_eq!(range.start, date(2022, 6, 15));
        assert!(range.contains(date(2023, 1, 1)));
        assert!(!range.contains(date(2022, 6, 14)));
    }
}
