//! Naive investment simulation over a forecast
//!
//! The projection anchors on the last known actual price, not on the first
//! forecast value: the fractional return is `(last forecast - last actual) /
//! last actual`, applied to the initial amount.

use crate::error::{ForecastError, Result};
use market_data::{daily_changes, PriceSeries};
use serde::Serialize;

/// Outcome of a buy-and-hold projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationResult {
    /// Amount invested at the start
    pub initial_amount: f64,
    /// Projected value at the end
    pub final_value: f64,
    /// Fractional return, e.g. 0.1 for +10%
    pub fractional_return: f64,
}

impl SimulationResult {
    /// Absolute profit (negative for a loss)
    pub fn profit(&self) -> f64 {
        self.final_value - self.initial_amount
    }

    /// Whether the projection ends above the initial amount
    pub fn is_gain(&self) -> bool {
        self.final_value > self.initial_amount
    }
}

/// Project an investment over a forecast.
///
/// `reference_price` is the last known actual price. Fails with
/// [`ForecastError::EmptyForecast`] on an empty forecast and
/// [`ForecastError::InvalidPrice`] when the reference price cannot anchor a
/// return (zero or non-finite).
pub fn simulate_investment(
    initial_amount: f64,
    reference_price: f64,
    forecast_values: &[f64],
) -> Result<SimulationResult> {
    if initial_amount < 0.0 || !initial_amount.is_finite() {
        return Err(ForecastError::InvalidInput(format!(
            "initial investment must be non-negative, got {}",
            initial_amount
        )));
    }
    if forecast_values.is_empty() {
        return Err(ForecastError::EmptyForecast);
    }
    if reference_price == 0.0 || !reference_price.is_finite() {
        return Err(ForecastError::InvalidPrice(reference_price));
    }

    let last = forecast_values[forecast_values.len() - 1];
    let fractional_return = (last - reference_price) / reference_price;

    Ok(SimulationResult {
        initial_amount,
        final_value: initial_amount * (1.0 + fractional_return),
        fractional_return,
    })
}

/// Project an investment over the observed history by compounding the daily
/// percentage changes.
pub fn historical_performance(
    initial_amount: f64,
    series: &PriceSeries,
) -> Result<SimulationResult> {
    if initial_amount < 0.0 || !initial_amount.is_finite() {
        return Err(ForecastError::InvalidInput(format!(
            "initial investment must be non-negative, got {}",
            initial_amount
        )));
    }

    let growth: f64 = daily_changes(series)
        .iter()
        .map(|change| 1.0 + change / 100.0)
        .product();

    Ok(SimulationResult {
        initial_amount,
        final_value: initial_amount * growth,
        fractional_return: growth - 1.0,
    })
}
