//! Forecasting models for normalized price windows
//!
//! A [`ForecastModel`] is an untrained configuration that fits itself to a
//! [`TrainingSet`] and produces a [`TrainedForecastModel`]. Trained models
//! predict one normalized step at a time; multi-step forecasts come from
//! [`TrainedForecastModel::forecast_iterative`], which feeds each prediction
//! back in as input for the next step. A trained model is created fresh per
//! request and discarded with it.

use crate::error::{ForecastError, Result};
use crate::windows::TrainingSet;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Debug;

pub mod lstm;

pub use lstm::{LstmModel, TrainedLstm};

/// Forecast result: predicted future prices, optionally dated
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    values: Vec<f64>,
    horizons: usize,
    dates: Option<Vec<NaiveDate>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::InvalidInput(format!(
                "values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            dates: None,
        })
    }

    /// Attach one future date per forecast value
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.horizons {
            return Err(ForecastError::InvalidInput(format!(
                "dates length ({}) doesn't match horizons ({})",
                dates.len(),
                self.horizons
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    /// The forecasted prices
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// The forecast dates, if attached
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    /// Dated points `(date, price)`, if dates are attached
    pub fn dated_points(&self) -> Option<Vec<(NaiveDate, f64)>> {
        self.dates
            .as_ref()
            .map(|dates| dates.iter().copied().zip(self.values.iter().copied()).collect())
    }

    /// Serialize the forecast to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ForecastError::InvalidInput(format!("serialization failed: {}", e)))
    }
}

/// Consecutive calendar days strictly after `last_date`, one per horizon step
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last_date;
    for _ in 0..horizon {
        current = current.succ_opt().ok_or_else(|| {
            ForecastError::InvalidInput(format!("date overflow past {}", current))
        })?;
        dates.push(current);
    }
    Ok(dates)
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Predict the next normalized value from a full window of normalized
    /// history.
    fn predict_next(&self, window: &[f64]) -> Result<f64>;

    /// The window length the model was trained with
    fn window_len(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;

    /// Iterative multi-step forecast in normalized space.
    ///
    /// Starting from `last_window`, repeatedly predicts the next value,
    /// appends it to the output, and slides the window forward so each
    /// successive prediction is conditioned on prior predictions rather than
    /// ground truth. Model error therefore compounds over the horizon; that
    /// is a property of the scheme, not something callers should correct
    /// for by re-anchoring on actuals.
    fn forecast_iterative(&self, last_window: &[f64], horizon: usize) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Err(ForecastError::InvalidInput(
                "forecast horizon must be at least 1".to_string(),
            ));
        }
        if last_window.len() != self.window_len() {
            return Err(ForecastError::InvalidInput(format!(
                "window length {} doesn't match model window length {}",
                last_window.len(),
                self.window_len()
            )));
        }

        let mut window = last_window.to_vec();
        let mut predictions = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = self.predict_next(&window)?;
            predictions.push(next);
            window.remove(0);
            window.push(next);
        }

        Ok(predictions)
    }
}

/// Forecast model that can be trained on windowed data
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Fit the model to the training set, minimizing mean squared error
    fn train(&self, data: &TrainingSet) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts the last window value plus a fixed increment.
    #[derive(Debug)]
    struct StepModel {
        window_len: usize,
        step: f64,
    }

    impl TrainedForecastModel for StepModel {
        fn predict_next(&self, window: &[f64]) -> Result<f64> {
            Ok(window[window.len() - 1] + self.step)
        }

        fn window_len(&self) -> usize {
            self.window_len
        }

        fn name(&self) -> &str {
            "Step"
        }
    }

    #[test]
    fn iterative_forecast_feeds_predictions_back() {
        let model = StepModel {
            window_len: 3,
            step: 0.1,
        };

        let out = model.forecast_iterative(&[0.1, 0.2, 0.3], 4).unwrap();

        assert_eq!(out.len(), 4);
        // each step builds on the previous prediction, not on the inputs
        for (i, v) in out.iter().enumerate() {
            assert!((v - (0.4 + 0.1 * i as f64)).abs() < 1e-9);
        }
    }

    #[test]
    fn iterative_forecast_validates_inputs() {
        let model = StepModel {
            window_len: 3,
            step: 0.1,
        };

        assert!(model.forecast_iterative(&[0.1, 0.2, 0.3], 0).is_err());
        assert!(model.forecast_iterative(&[0.1, 0.2], 5).is_err());
    }

    #[test]
    fn forecast_result_validates_lengths() {
        assert!(ForecastResult::new(vec![1.0, 2.0], 3).is_err());

        let result = ForecastResult::new(vec![1.0, 2.0], 2).unwrap();
        let d = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert!(result.clone().with_dates(vec![d]).is_err());

        let dated = result.with_dates(future_dates(d, 2).unwrap()).unwrap();
        let points = dated.dated_points().unwrap();
        assert_eq!(points[0].0, NaiveDate::from_ymd_opt(2023, 5, 2).unwrap());
        assert_eq!(points[1].0, NaiveDate::from_ymd_opt(2023, 5, 3).unwrap());
    }

    #[test]
    fn future_dates_start_strictly_after_last_date() {
        let last = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let dates = future_dates(last, 3).unwrap();

        assert_eq!(dates.len(), 3);
        assert!(dates[0] > last);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }
}
