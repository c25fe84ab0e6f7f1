//! Request-scoped forecasting pipeline
//!
//! One call to [`run_forecast`] performs the whole request on the calling
//! thread: fetch, normalize, window, train, iteratively forecast,
//! denormalize, and simulate. Nothing is shared across requests and nothing
//! is persisted; the trained model lives only inside the call. Any failure
//! aborts the request with a typed [`ForecastError`](crate::ForecastError) —
//! no retries, no partial results.

use crate::error::{ForecastError, Result};
use crate::models::{future_dates, ForecastModel, ForecastResult, LstmModel, TrainedForecastModel};
use crate::scaling::MinMaxScaler;
use crate::simulation::{simulate_investment, SimulationResult};
use crate::windows::{last_window, TrainingSet};
use chrono::Utc;
use market_data::{DateRange, MarketDataProvider};
use serde::{Deserialize, Serialize};

/// Validated configuration for one forecast request.
///
/// Built once from caller input at request start and passed through the
/// pipeline by value; there is no ambient configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Ticker symbol to forecast
    pub ticker: String,
    /// Historical range to fetch
    pub range: DateRange,
    /// Sliding window length `L`
    pub window_len: usize,
    /// Forecast horizon `H` in days
    pub horizon: usize,
    /// Investment amount for the simulation, in currency units
    pub initial_investment: f64,
    /// Model hyperparameters
    pub model: LstmModel,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        let today = Utc::now().date_naive();
        Self {
            ticker: "AAPL".to_string(),
            // a one-year lookback always fits between epoch and today
            range: DateRange::last_years(1, today).unwrap_or(DateRange {
                start: today,
                end: today,
            }),
            window_len: 60,
            horizon: 30,
            initial_investment: 1000.0,
            model: LstmModel::default(),
        }
    }
}

impl ForecastConfig {
    /// Configuration for `ticker` with defaults everywhere else
    pub fn for_ticker(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            ..Self::default()
        }
    }

    /// Set the historical range
    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Set the window length `L`
    pub fn with_window_len(mut self, window_len: usize) -> Self {
        self.window_len = window_len;
        self
    }

    /// Set the forecast horizon `H`
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the simulated investment amount
    pub fn with_initial_investment(mut self, amount: f64) -> Self {
        self.initial_investment = amount;
        self
    }

    /// Set the model hyperparameters
    pub fn with_model(mut self, model: LstmModel) -> Self {
        self.model = model;
        self
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        if self.ticker.trim().is_empty() {
            return Err(ForecastError::InvalidInput(
                "ticker must not be empty".to_string(),
            ));
        }
        if self.window_len == 0 {
            return Err(ForecastError::InvalidInput(
                "window length must be at least 1".to_string(),
            ));
        }
        if self.horizon == 0 {
            return Err(ForecastError::InvalidInput(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        if self.initial_investment < 0.0 || !self.initial_investment.is_finite() {
            return Err(ForecastError::InvalidInput(format!(
                "initial investment must be non-negative, got {}",
                self.initial_investment
            )));
        }
        self.model.validate()
    }
}

/// Everything one forecast request produces
#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    /// The requested ticker
    pub ticker: String,
    /// Number of historical points the model was fitted on
    pub history_len: usize,
    /// Last known actual closing price
    pub last_close: f64,
    /// Dated forecast in price scale
    pub forecast: ForecastResult,
    /// Investment projection over the forecast
    pub simulation: SimulationResult,
}

/// Run one complete forecast request against `provider`.
///
/// Flow: fetch → normalize → window → train → iterative forecast →
/// denormalize → simulate. The training step blocks the calling thread for
/// the duration of the fit.
pub fn run_forecast<P: MarketDataProvider>(
    provider: &P,
    config: &ForecastConfig,
) -> Result<ForecastOutcome> {
    config.validate()?;

    let series = provider.fetch_price_series(&config.ticker, &config.range)?;
    let closes = series.closes();
    if closes.len() < config.window_len + 1 {
        return Err(ForecastError::InsufficientData {
            required: config.window_len + 1,
            actual: closes.len(),
        });
    }

    let scaler = MinMaxScaler::fit(&closes)?;
    let normalized = scaler.transform(&closes);

    let training_set = TrainingSet::from_values(&normalized, config.window_len)?;
    let trained = config.model.train(&training_set)?;

    let seed_window = last_window(&normalized, config.window_len)?;
    let predicted = trained.forecast_iterative(&seed_window, config.horizon)?;
    let prices = scaler.inverse_transform(&predicted);

    let dates = future_dates(series.last_date(), config.horizon)?;
    let forecast = ForecastResult::new(prices, config.horizon)?.with_dates(dates)?;

    let last_close = series.last_close();
    let simulation = simulate_investment(config.initial_investment, last_close, forecast.values())?;

    Ok(ForecastOutcome {
        ticker: config.ticker.clone(),
        history_len: series.len(),
        last_close,
        forecast,
        simulation,
    })
}
