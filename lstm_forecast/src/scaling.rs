//! Min-max price scaling
//!
//! The model trains on values mapped into `[0, 1]`; the scaler keeps the
//! fitted bounds so forecasts can be mapped back to price scale. One scaler
//! is fitted per request and lives only as long as that request's forecast.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Linear rescaler mapping a fitted value range onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler to the observed values.
    ///
    /// Fails on an empty slice or non-finite values.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::InvalidInput(
                "cannot fit scaler on an empty slice".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidInput(
                "cannot fit scaler on non-finite values".to_string(),
            ));
        }

        let mut min = values[0];
        let mut max = values[0];
        for &v in &values[1..] {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }

        Ok(Self { min, max })
    }

    /// Map one value into the fitted range.
    ///
    /// A constant series (`max == min`) maps every value to 0 instead of
    /// dividing by zero.
    pub fn transform_one(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            0.0
        } else {
            (value - self.min) / range
        }
    }

    /// Map a slice of values into the fitted range
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform_one(v)).collect()
    }

    /// Invert one normalized value back to price scale
    pub fn inverse_transform_one(&self, value: f64) -> f64 {
        value * (self.max - self.min) + self.min
    }

    /// Invert a slice of normalized values back to price scale
    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.inverse_transform_one(v)).collect()
    }

    /// Lower bound of the fitted range
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound of the fitted range
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_range_onto_unit_interval() {
        let scaler = MinMaxScaler::fit(&[10.0, 20.0, 15.0]).unwrap();
        let scaled = scaler.transform(&[10.0, 15.0, 20.0]);

        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn constant_series_maps_to_zero() {
        let scaler = MinMaxScaler::fit(&[7.0, 7.0, 7.0]).unwrap();
        let scaled = scaler.transform(&[7.0, 7.0]);

        assert_eq!(scaled, vec![0.0, 0.0]);
        // the inverse of the degenerate scaler recovers the constant
        assert_eq!(scaler.inverse_transform_one(0.0), 7.0);
    }

    #[test]
    fn round_trip_recovers_values() {
        let values = [100.0, 105.5, 98.25, 120.0];
        let scaler = MinMaxScaler::fit(&values).unwrap();

        for &v in &values {
            let round_trip = scaler.inverse_transform_one(scaler.transform_one(v));
            assert!((round_trip - v).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_empty_and_non_finite_input() {
        assert!(MinMaxScaler::fit(&[]).is_err());
        assert!(MinMaxScaler::fit(&[1.0, f64::INFINITY]).is_err());
        assert!(MinMaxScaler::fit(&[1.0, f64::NAN]).is_err());
    }
}
