//! Sliding-window training examples
//!
//! A normalized series of length `N` with window length `L` yields exactly
//! `N - L` windows: the input is `values[i..i + L]`, the target is
//! `values[i + L]`, sliding by one step in chronological order.

use crate::error::{ForecastError, Result};

/// One training example: a fixed-length input sequence and its target
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Normalized input sequence of length `window_len`
    pub input: Vec<f64>,
    /// The normalized value immediately following the input
    pub target: f64,
}

/// All windows derived from one normalized series, in chronological order
#[derive(Debug, Clone)]
pub struct TrainingSet {
    windows: Vec<Window>,
    window_len: usize,
}

impl TrainingSet {
    /// Build the training set by sliding a window of `window_len` over
    /// `values` one step at a time.
    pub fn from_values(values: &[f64], window_len: usize) -> Result<Self> {
        if window_len == 0 {
            return Err(ForecastError::InvalidInput(
                "window length must be at least 1".to_string(),
            ));
        }
        if values.len() < window_len + 1 {
            return Err(ForecastError::InsufficientData {
                required: window_len + 1,
                actual: values.len(),
            });
        }

        let windows = (0..values.len() - window_len)
            .map(|i| Window {
                input: values[i..i + window_len].to_vec(),
                target: values[i + window_len],
            })
            .collect();

        Ok(Self {
            windows,
            window_len,
        })
    }

    /// The windows in chronological order
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// The configured window length
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Number of training examples
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether the set is empty (never true for a constructed set)
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// The trailing `window_len` values of a series, used to seed iterative
/// forecasting.
pub fn last_window(values: &[f64], window_len: usize) -> Result<Vec<f64>> {
    if window_len == 0 {
        return Err(ForecastError::InvalidInput(
            "window length must be at least 1".to_string(),
        ));
    }
    if values.len() < window_len {
        return Err(ForecastError::InsufficientData {
            required: window_len,
            actual: values.len(),
        });
    }
    Ok(values[values.len() - window_len..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_n_minus_l_windows() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let set = TrainingSet::from_values(&values, 3).unwrap();

        assert_eq!(set.len(), 7);
        assert!(set.windows().iter().all(|w| w.input.len() == 3));

        assert_eq!(set.windows()[0].input, vec![0.0, 1.0, 2.0]);
        assert_eq!(set.windows()[0].target, 3.0);
        assert_eq!(set.windows()[6].input, vec![6.0, 7.0, 8.0]);
        assert_eq!(set.windows()[6].target, 9.0);
    }

    #[test]
    fn series_no_longer_than_window_is_insufficient() {
        let values = vec![1.0, 2.0, 3.0];

        let err = TrainingSet::from_values(&values, 3).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData {
                required: 4,
                actual: 3
            }
        ));

        assert!(TrainingSet::from_values(&values, 5).is_err());
    }

    #[test]
    fn zero_window_length_is_invalid() {
        let err = TrainingSet::from_values(&[1.0, 2.0], 0).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidInput(_)));
    }

    #[test]
    fn last_window_takes_the_tail() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(last_window(&values, 2).unwrap(), vec![4.0, 5.0]);
        assert_eq!(last_window(&values, 5).unwrap(), values);
        assert!(last_window(&values, 6).is_err());
    }
}
