//! # LSTM Forecast
//!
//! A Rust library that forecasts near-future stock prices with an LSTM and
//! runs a naive investment simulation over the forecast.
//!
//! ## Features
//!
//! - Min-max price normalization with exact inversion
//! - Sliding-window training examples (window of `L` prices, next price as target)
//! - LSTM sequence regressor trained with backpropagation through time
//! - Iterative multi-step forecasting (each prediction feeds the next step)
//! - Buy-and-hold investment projection over forecast and history
//! - Forecast accuracy metrics for holdout evaluation
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use lstm_forecast::models::LstmModel;
//! use lstm_forecast::pipeline::{run_forecast, ForecastConfig};
//! use market_data::providers::SyntheticDataProvider;
//! use market_data::DateRange;
//!
//! let provider = SyntheticDataProvider::default().with_seed(42);
//! let range = DateRange::new(
//!     NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2023, 4, 10).unwrap(),
//! ).unwrap();
//!
//! let config = ForecastConfig::for_ticker("DEMO")
//!     .with_range(range)
//!     .with_window_len(10)
//!     .with_horizon(5)
//!     .with_model(LstmModel::new(8, 20, 16, 0.05).unwrap().with_seed(7));
//!
//! let outcome = run_forecast(&provider, &config).unwrap();
//! assert_eq!(outcome.forecast.values().len(), 5);
//! println!("projected value: {:.2}", outcome.simulation.final_value);
//! ```
//!
//! The pipeline is request-scoped and synchronous: each call fetches its own
//! series, trains its own model on the calling thread, and discards both when
//! it returns. Exact forecast values are not reproducible across runs unless
//! a model seed is fixed; tests should assert structural properties instead.

pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod scaling;
pub mod simulation;
pub mod windows;

// Re-export commonly used types
pub use crate::error::{ForecastError, Result};
pub use crate::models::{ForecastModel, ForecastResult, LstmModel, TrainedForecastModel};
pub use crate::pipeline::{run_forecast, ForecastConfig, ForecastOutcome};
pub use crate::scaling::MinMaxScaler;
pub use crate::simulation::{simulate_investment, SimulationResult};
pub use crate::windows::TrainingSet;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
