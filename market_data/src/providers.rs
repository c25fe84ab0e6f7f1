//! Bundled market data providers
//!
//! Two providers ship with the workspace: [`CsvDataProvider`] reads daily
//! closes from per-ticker CSV files, and [`SyntheticDataProvider`] generates
//! a random-walk series for demos and tests. Network-backed providers belong
//! to the application layer; anything implementing
//! [`MarketDataProvider`](crate::MarketDataProvider) plugs into the pipeline.

use crate::{DateRange, MarketDataError, MarketDataProvider, PricePoint, PriceSeries};
use chrono::NaiveDate;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One row of a `<TICKER>.csv` file
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    close: f64,
}

/// Provider that reads `<TICKER>.csv` files from a data directory.
///
/// Files must have a header with `date` (ISO 8601) and `close` columns and
/// rows in chronological order.
#[derive(Debug, Clone)]
pub struct CsvDataProvider {
    data_dir: PathBuf,
}

impl CsvDataProvider {
    /// Create a provider rooted at `data_dir`
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn ticker_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", ticker.to_uppercase()))
    }
}

impl MarketDataProvider for CsvDataProvider {
    fn fetch_price_series(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<PriceSeries, MarketDataError> {
        let path = self.ticker_path(ticker);
        debug!("loading {} from {}", ticker, path.display());

        if !path.exists() {
            return Err(MarketDataError::DataUnavailable(format!(
                "no data file for ticker {}",
                ticker
            )));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut points = Vec::new();
        for row in reader.deserialize() {
            let row: CsvRow = row?;
            if range.contains(row.date) {
                points.push(PricePoint {
                    date: row.date,
                    close: row.close,
                });
            }
        }

        if points.is_empty() {
            return Err(MarketDataError::DataUnavailable(format!(
                "{} has no rows between {} and {}",
                ticker, range.start, range.end
            )));
        }

        let series = PriceSeries::new(points)?;
        info!("loaded {} points for {}", series.len(), ticker);
        Ok(series)
    }
}

/// Provider that generates a trending random-walk series.
///
/// Useful for demos and tests that need plausible data without any files.
/// The walk is `close[t+1] = close[t] + drift + noise` with Gaussian noise;
/// a fixed seed makes the output reproducible.
#[derive(Debug, Clone)]
pub struct SyntheticDataProvider {
    /// Price of the first generated point
    pub start_price: f64,
    /// Deterministic per-day price increment
    pub daily_drift: f64,
    /// Standard deviation of the per-day noise
    pub volatility: f64,
    seed: Option<u64>,
}

impl Default for SyntheticDataProvider {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            daily_drift: 0.05,
            volatility: 1.0,
            seed: None,
        }
    }
}

impl SyntheticDataProvider {
    /// Create a generator with explicit walk parameters
    pub fn new(start_price: f64, daily_drift: f64, volatility: f64) -> Self {
        Self {
            start_price,
            daily_drift,
            volatility,
            seed: None,
        }
    }

    /// Fix the RNG seed so repeated fetches return identical series
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl MarketDataProvider for SyntheticDataProvider {
    fn fetch_price_series(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<PriceSeries, MarketDataError> {
        let noise = Normal::new(0.0, self.volatility).map_err(|e| {
            MarketDataError::InvalidSeries(format!("bad volatility {}: {}", self.volatility, e))
        })?;

        let mut rng: StdRng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(rand::thread_rng()).map_err(|e| {
                MarketDataError::InvalidSeries(format!("rng initialization failed: {}", e))
            })?,
        };

        let mut points = Vec::with_capacity(range.num_days() as usize);
        let mut price = self.start_price;
        let mut date = range.start;

        while date <= range.end {
            points.push(PricePoint { date, close: price });
            price = (price + self.daily_drift + noise.sample(&mut rng)).max(0.01);
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        debug!(
            "generated {} synthetic points for {} (seed {:?})",
            points.len(),
            ticker,
            self.seed
        );

        PriceSeries::new(points)
    }
}

/// Generate a noiseless, linearly increasing test series.
///
/// Handy for pipeline sanity checks where the trend must be obvious.
pub fn linear_test_series(
    start_date: NaiveDate,
    num_points: usize,
    start_price: f64,
    step: f64,
) -> Result<PriceSeries, MarketDataError> {
    let mut points = Vec::with_capacity(num_points);
    let mut date = start_date;
    for i in 0..num_points {
        points.push(PricePoint {
            date,
            close: start_price + step * i as f64,
        });
        date = date.succ_opt().ok_or_else(|| {
            MarketDataError::InvalidRange("date overflow while generating series".to_string())
        })?;
    }
    PriceSeries::new(points)
}

/// Generate a random OHLC-free daily walk directly, without a provider.
///
/// Mirrors [`SyntheticDataProvider`] but for callers that already know how
/// many points they want rather than a date range.
pub fn generate_walk(
    start_date: NaiveDate,
    num_points: usize,
    start_price: f64,
    volatility: f64,
) -> Result<PriceSeries, MarketDataError> {
    let mut rng = rand::thread_rng();
    let mut points = Vec::with_capacity(num_points);
    let mut price = start_price;
    let mut date = start_date;

    for _ in 0..num_points {
        points.push(PricePoint { date, close: price });
        let shock: f64 = rng.gen_range(-volatility..=volatility);
        price = (price * (1.0 + shock)).max(0.01);
        date = date.succ_opt().ok_or_else(|| {
            MarketDataError::InvalidRange("date overflow while generating series".to_string())
        })?;
    }

    PriceSeries::new(points)
}
