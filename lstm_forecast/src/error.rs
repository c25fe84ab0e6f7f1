//! Error types for the lstm_forecast crate

use market_data::MarketDataError;
use thiserror::Error;

/// Custom error types for the lstm_forecast crate.
///
/// Every error is terminal for the current forecast request: the pipeline
/// returns no partial results and performs no retries.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The series is too short to produce any training window
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The upstream market data fetch failed
    #[error("Data unavailable: {0}")]
    DataUnavailable(#[from] MarketDataError),

    /// Malformed caller-supplied configuration or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The investment simulation received an empty forecast
    #[error("Empty forecast: simulation requires at least one forecast value")]
    EmptyForecast,

    /// The simulation reference price cannot be used as a divisor
    #[error("Invalid price: reference price {0} cannot anchor a return calculation")]
    InvalidPrice(f64),

    /// Model training failed numerically
    #[error("Training error: {0}")]
    TrainingError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
