//! LSTM sequence regressor
//!
//! A single LSTM layer followed by a linear readout, trained sequence-to-one
//! on normalized price windows with mean squared error. Gradients are exact
//! backpropagation through time; optimization is mini-batch SGD over
//! shuffled batches with gradient-norm clipping.
//!
//! Random initialization means two training runs on the same data generally
//! produce different forecasts unless a seed is fixed via
//! [`LstmModel::with_seed`].

use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::windows::TrainingSet;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const GRADIENT_CLIP_NORM: f64 = 5.0;

/// Untrained LSTM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmModel {
    /// Width of the hidden state
    pub hidden_size: usize,
    /// Number of passes over the training set
    pub epochs: usize,
    /// Mini-batch size for SGD
    pub batch_size: usize,
    /// SGD learning rate
    pub learning_rate: f64,
    /// Optional RNG seed for reproducible initialization and shuffling
    pub seed: Option<u64>,
    name: String,
}

impl Default for LstmModel {
    fn default() -> Self {
        Self {
            hidden_size: 32,
            epochs: 60,
            batch_size: 32,
            learning_rate: 0.05,
            seed: None,
            name: "LSTM".to_string(),
        }
    }
}

impl LstmModel {
    /// Create a model with explicit hyperparameters
    pub fn new(hidden_size: usize, epochs: usize, batch_size: usize, learning_rate: f64) -> Result<Self> {
        let model = Self {
            hidden_size,
            epochs,
            batch_size,
            learning_rate,
            ..Self::default()
        };
        model.validate()?;
        Ok(model)
    }

    /// Fix the RNG seed for initialization and batch shuffling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the hyperparameters
    pub fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(ForecastError::InvalidInput(
                "hidden size must be at least 1".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(ForecastError::InvalidInput(
                "epochs must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ForecastError::InvalidInput(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

impl ForecastModel for LstmModel {
    type Trained = TrainedLstm;

    fn train(&self, data: &TrainingSet) -> Result<Self::Trained> {
        self.validate()?;

        let mut rng: StdRng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(rand::thread_rng()).map_err(|e| {
                ForecastError::TrainingError(format!("rng initialization failed: {}", e))
            })?,
        };

        let mut network = LstmNetwork::new(self.hidden_size, &mut rng);
        let n_samples = data.len();
        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut loss_history = Vec::with_capacity(self.epochs);

        for epoch in 0..self.epochs {
            indices.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in indices.chunks(self.batch_size) {
                let mut grads = Gradients::zeros(self.hidden_size);
                let mut batch_loss = 0.0;

                for &idx in batch {
                    let window = &data.windows()[idx];
                    batch_loss += network.backward(&window.input, window.target, &mut grads);
                }

                grads.scale(1.0 / batch.len() as f64);
                grads.clip(GRADIENT_CLIP_NORM);
                network.apply(&grads, self.learning_rate);

                epoch_loss += batch_loss;
            }

            let avg_loss = epoch_loss / n_samples as f64;
            if !avg_loss.is_finite() {
                return Err(ForecastError::TrainingError(format!(
                    "loss diverged at epoch {}",
                    epoch
                )));
            }
            loss_history.push(avg_loss);
        }

        Ok(TrainedLstm {
            name: self.name.clone(),
            window_len: data.window_len(),
            network,
            loss_history,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Trained LSTM regressor
#[derive(Debug, Clone)]
pub struct TrainedLstm {
    name: String,
    window_len: usize,
    network: LstmNetwork,
    loss_history: Vec<f64>,
}

impl TrainedLstm {
    /// Average training loss per epoch, in training order
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }
}

impl TrainedForecastModel for TrainedLstm {
    fn predict_next(&self, window: &[f64]) -> Result<f64> {
        if window.len() != self.window_len {
            return Err(ForecastError::InvalidInput(format!(
                "window length {} doesn't match model window length {}",
                window.len(),
                self.window_len
            )));
        }
        Ok(self.network.predict(window))
    }

    fn window_len(&self) -> usize {
        self.window_len
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Single LSTM cell over a univariate input.
///
/// Input weights are vectors because each timestep consumes one scalar.
#[derive(Debug, Clone)]
struct LstmCell {
    hidden_size: usize,
    // input gate
    w_i: Array1<f64>,
    u_i: Array2<f64>,
    b_i: Array1<f64>,
    // forget gate
    w_f: Array1<f64>,
    u_f: Array2<f64>,
    b_f: Array1<f64>,
    // cell candidate
    w_g: Array1<f64>,
    u_g: Array2<f64>,
    b_g: Array1<f64>,
    // output gate
    w_o: Array1<f64>,
    u_o: Array2<f64>,
    b_o: Array1<f64>,
}

/// Per-timestep forward activations kept for backpropagation
#[derive(Debug, Clone)]
struct StepCache {
    x: f64,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    c: Array1<f64>,
    tanh_c: Array1<f64>,
    h: Array1<f64>,
}

impl LstmCell {
    fn new(hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let vec = |rng: &mut StdRng| Array1::from_shape_fn(hidden_size, |_| rng.gen_range(-limit..limit));
        let mat = |rng: &mut StdRng| {
            Array2::from_shape_fn((hidden_size, hidden_size), |_| rng.gen_range(-limit..limit))
        };

        Self {
            hidden_size,
            w_i: vec(&mut *rng),
            u_i: mat(&mut *rng),
            b_i: Array1::zeros(hidden_size),
            w_f: vec(&mut *rng),
            u_f: mat(&mut *rng),
            // forget gate opens at init so early training keeps cell state
            b_f: Array1::from_elem(hidden_size, 1.0),
            w_g: vec(&mut *rng),
            u_g: mat(&mut *rng),
            b_g: Array1::zeros(hidden_size),
            w_o: vec(&mut *rng),
            u_o: mat(&mut *rng),
            b_o: Array1::zeros(hidden_size),
        }
    }

    /// Forward pass for one timestep
    fn step(&self, x: f64, h_prev: &Array1<f64>, c_prev: &Array1<f64>) -> StepCache {
        let i = sigmoid(&(&self.w_i * x + self.u_i.dot(h_prev) + &self.b_i));
        let f = sigmoid(&(&self.w_f * x + self.u_f.dot(h_prev) + &self.b_f));
        let g = tanh(&(&self.w_g * x + self.u_g.dot(h_prev) + &self.b_g));
        let o = sigmoid(&(&self.w_o * x + self.u_o.dot(h_prev) + &self.b_o));

        let c = &f * c_prev + &i * &g;
        let tanh_c = c.mapv(f64::tanh);
        let h = &o * &tanh_c;

        StepCache {
            x,
            i,
            f,
            g,
            o,
            c,
            tanh_c,
            h,
        }
    }

    fn init_state(&self) -> (Array1<f64>, Array1<f64>) {
        (
            Array1::zeros(self.hidden_size),
            Array1::zeros(self.hidden_size),
        )
    }
}

/// LSTM layer plus linear readout
#[derive(Debug, Clone)]
struct LstmNetwork {
    cell: LstmCell,
    w_out: Array1<f64>,
    b_out: f64,
}

impl LstmNetwork {
    fn new(hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        Self {
            cell: LstmCell::new(hidden_size, rng),
            w_out: Array1::from_shape_fn(hidden_size, |_| rng.gen_range(-limit..limit)),
            b_out: 0.0,
        }
    }

    /// Run the sequence and return the scalar prediction
    fn predict(&self, xs: &[f64]) -> f64 {
        let (mut h, mut c) = self.cell.init_state();
        for &x in xs {
            let cache = self.cell.step(x, &h, &c);
            h = cache.h;
            c = cache.c;
        }
        self.w_out.dot(&h) + self.b_out
    }

    /// Forward plus backpropagation through time for one sample.
    ///
    /// Accumulates parameter gradients into `grads` and returns the sample's
    /// squared error.
    fn backward(&self, xs: &[f64], target: f64, grads: &mut Gradients) -> f64 {
        let n = self.cell.hidden_size;

        // forward, caching every timestep
        let mut caches: Vec<StepCache> = Vec::with_capacity(xs.len());
        let (mut h, mut c) = self.cell.init_state();
        for &x in xs {
            let cache = self.cell.step(x, &h, &c);
            h = cache.h.clone();
            c = cache.c.clone();
            caches.push(cache);
        }

        let y_hat = self.w_out.dot(&h) + self.b_out;
        let err = y_hat - target;
        let dy = 2.0 * err;

        grads.w_out += &(&h * dy);
        grads.b_out += dy;

        let mut dh = &self.w_out * dy;
        let mut dc: Array1<f64> = Array1::zeros(n);

        for t in (0..caches.len()).rev() {
            let cache = &caches[t];
            let (h_prev, c_prev) = if t == 0 {
                self.cell.init_state()
            } else {
                (caches[t - 1].h.clone(), caches[t - 1].c.clone())
            };

            // h = o * tanh(c)
            let d_o = &dh * &cache.tanh_c;
            let dpre_o = &d_o * &cache.o.mapv(|v| v * (1.0 - v));
            dc = dc + &dh * &cache.o * &cache.tanh_c.mapv(|v| 1.0 - v * v);

            // c = f * c_prev + i * g
            let d_f = &dc * &c_prev;
            let dpre_f = &d_f * &cache.f.mapv(|v| v * (1.0 - v));
            let d_i = &dc * &cache.g;
            let dpre_i = &d_i * &cache.i.mapv(|v| v * (1.0 - v));
            let d_g = &dc * &cache.i;
            let dpre_g = &d_g * &cache.g.mapv(|v| 1.0 - v * v);

            grads.w_i += &(&dpre_i * cache.x);
            grads.u_i += &outer(&dpre_i, &h_prev);
            grads.b_i += &dpre_i;

            grads.w_f += &(&dpre_f * cache.x);
            grads.u_f += &outer(&dpre_f, &h_prev);
            grads.b_f += &dpre_f;

            grads.w_g += &(&dpre_g * cache.x);
            grads.u_g += &outer(&dpre_g, &h_prev);
            grads.b_g += &dpre_g;

            grads.w_o += &(&dpre_o * cache.x);
            grads.u_o += &outer(&dpre_o, &h_prev);
            grads.b_o += &dpre_o;

            dh = self.cell.u_i.t().dot(&dpre_i)
                + self.cell.u_f.t().dot(&dpre_f)
                + self.cell.u_g.t().dot(&dpre_g)
                + self.cell.u_o.t().dot(&dpre_o);
            dc = &dc * &cache.f;
        }

        err * err
    }

    /// One SGD step with pre-scaled gradients
    fn apply(&mut self, grads: &Gradients, learning_rate: f64) {
        let lr = -learning_rate;
        self.cell.w_i.scaled_add(lr, &grads.w_i);
        self.cell.u_i.scaled_add(lr, &grads.u_i);
        self.cell.b_i.scaled_add(lr, &grads.b_i);
        self.cell.w_f.scaled_add(lr, &grads.w_f);
        self.cell.u_f.scaled_add(lr, &grads.u_f);
        self.cell.b_f.scaled_add(lr, &grads.b_f);
        self.cell.w_g.scaled_add(lr, &grads.w_g);
        self.cell.u_g.scaled_add(lr, &grads.u_g);
        self.cell.b_g.scaled_add(lr, &grads.b_g);
        self.cell.w_o.scaled_add(lr, &grads.w_o);
        self.cell.u_o.scaled_add(lr, &grads.u_o);
        self.cell.b_o.scaled_add(lr, &grads.b_o);
        self.w_out.scaled_add(lr, &grads.w_out);
        self.b_out += lr * grads.b_out;
    }
}

/// Parameter gradients, same shapes as the network parameters
#[derive(Debug)]
struct Gradients {
    w_i: Array1<f64>,
    u_i: Array2<f64>,
    b_i: Array1<f64>,
    w_f: Array1<f64>,
    u_f: Array2<f64>,
    b_f: Array1<f64>,
    w_g: Array1<f64>,
    u_g: Array2<f64>,
    b_g: Array1<f64>,
    w_o: Array1<f64>,
    u_o: Array2<f64>,
    b_o: Array1<f64>,
    w_out: Array1<f64>,
    b_out: f64,
}

impl Gradients {
    fn zeros(hidden_size: usize) -> Self {
        Self {
            w_i: Array1::zeros(hidden_size),
            u_i: Array2::zeros((hidden_size, hidden_size)),
            b_i: Array1::zeros(hidden_size),
            w_f: Array1::zeros(hidden_size),
            u_f: Array2::zeros((hidden_size, hidden_size)),
            b_f: Array1::zeros(hidden_size),
            w_g: Array1::zeros(hidden_size),
            u_g: Array2::zeros((hidden_size, hidden_size)),
            b_g: Array1::zeros(hidden_size),
            w_o: Array1::zeros(hidden_size),
            u_o: Array2::zeros((hidden_size, hidden_size)),
            b_o: Array1::zeros(hidden_size),
            w_out: Array1::zeros(hidden_size),
            b_out: 0.0,
        }
    }

    fn scale(&mut self, factor: f64) {
        self.w_i *= factor;
        self.u_i *= factor;
        self.b_i *= factor;
        self.w_f *= factor;
        self.u_f *= factor;
        self.b_f *= factor;
        self.w_g *= factor;
        self.u_g *= factor;
        self.b_g *= factor;
        self.w_o *= factor;
        self.u_o *= factor;
        self.b_o *= factor;
        self.w_out *= factor;
        self.b_out *= factor;
    }

    fn norm(&self) -> f64 {
        let sq = |a: &Array1<f64>| a.iter().map(|v| v * v).sum::<f64>();
        let sq2 = |a: &Array2<f64>| a.iter().map(|v| v * v).sum::<f64>();
        (sq(&self.w_i)
            + sq2(&self.u_i)
            + sq(&self.b_i)
            + sq(&self.w_f)
            + sq2(&self.u_f)
            + sq(&self.b_f)
            + sq(&self.w_g)
            + sq2(&self.u_g)
            + sq(&self.b_g)
            + sq(&self.w_o)
            + sq2(&self.u_o)
            + sq(&self.b_o)
            + sq(&self.w_out)
            + self.b_out * self.b_out)
            .sqrt()
    }

    /// Rescale so the global gradient norm stays below `max_norm`
    fn clip(&mut self, max_norm: f64) {
        let norm = self.norm();
        if norm > max_norm {
            self.scale(max_norm / norm);
        }
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    Array2::from_shape_fn((a.len(), b.len()), |(row, col)| a[row] * b[col])
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(f64::tanh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::windows::TrainingSet;

    #[test]
    fn cell_step_has_hidden_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let cell = LstmCell::new(8, &mut rng);
        let (h, c) = cell.init_state();

        let cache = cell.step(0.5, &h, &c);

        assert_eq!(cache.h.len(), 8);
        assert_eq!(cache.c.len(), 8);
        // gates are sigmoid outputs
        assert!(cache.i.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(cache.f.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn hyperparameter_validation() {
        assert!(LstmModel::new(0, 10, 8, 0.05).is_err());
        assert!(LstmModel::new(8, 0, 8, 0.05).is_err());
        assert!(LstmModel::new(8, 10, 0, 0.05).is_err());
        assert!(LstmModel::new(8, 10, 8, 0.0).is_err());
        assert!(LstmModel::new(8, 10, 8, f64::NAN).is_err());
        assert!(LstmModel::new(8, 10, 8, 0.05).is_ok());
    }

    #[test]
    fn backward_matches_numerical_gradient_on_readout() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = LstmNetwork::new(4, &mut rng);
        let xs = [0.1, 0.4, 0.7];
        let target = 0.5;

        let mut grads = Gradients::zeros(4);
        network.backward(&xs, target, &mut grads);

        // central difference on one readout weight
        let eps = 1e-6;
        let mut plus = network.clone();
        plus.w_out[0] += eps;
        let mut minus = network.clone();
        minus.w_out[0] -= eps;

        let loss = |net: &LstmNetwork| {
            let err = net.predict(&xs) - target;
            err * err
        };
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);

        assert!((grads.w_out[0] - numeric).abs() < 1e-5);
    }

    #[test]
    fn backward_matches_numerical_gradient_on_gate_weights() {
        let mut rng = StdRng::seed_from_u64(4);
        let network = LstmNetwork::new(3, &mut rng);
        let xs = [0.2, 0.9, 0.1, 0.6];
        let target = 0.3;

        let mut grads = Gradients::zeros(3);
        network.backward(&xs, target, &mut grads);

        let eps = 1e-6;
        let loss = |net: &LstmNetwork| {
            let err = net.predict(&xs) - target;
            err * err
        };

        // input weight of the candidate gate
        let mut plus = network.clone();
        plus.cell.w_g[1] += eps;
        let mut minus = network.clone();
        minus.cell.w_g[1] -= eps;
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
        assert!((grads.w_g[1] - numeric).abs() < 1e-5);

        // recurrent weight of the forget gate
        let mut plus = network.clone();
        plus.cell.u_f[[0, 2]] += eps;
        let mut minus = network.clone();
        minus.cell.u_f[[0, 2]] -= eps;
        let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
        assert!((grads.u_f[[0, 2]] - numeric).abs() < 1e-5);
    }

    #[test]
    fn training_reduces_loss_on_a_ramp() {
        let values: Vec<f64> = (0..60).map(|i| i as f64 / 59.0).collect();
        let data = TrainingSet::from_values(&values, 5).unwrap();

        let model = LstmModel::new(8, 40, 16, 0.1).unwrap().with_seed(11);
        let trained = model.train(&data).unwrap();

        let history = trained.loss_history();
        assert_eq!(history.len(), 40);
        assert!(history[history.len() - 1] < history[0]);
    }

    #[test]
    fn seeded_training_is_reproducible() {
        let values: Vec<f64> = (0..40).map(|i| (i as f64 / 10.0).sin() * 0.5 + 0.5).collect();
        let data = TrainingSet::from_values(&values, 4).unwrap();
        let model = LstmModel::new(6, 10, 8, 0.05).unwrap().with_seed(99);

        let a = model.train(&data).unwrap();
        let b = model.train(&data).unwrap();

        let window = vec![0.4, 0.5, 0.6, 0.7];
        assert_eq!(
            a.predict_next(&window).unwrap(),
            b.predict_next(&window).unwrap()
        );
    }

    #[test]
    fn predict_next_rejects_wrong_window_length() {
        let values: Vec<f64> = (0..20).map(|i| i as f64 / 19.0).collect();
        let data = TrainingSet::from_values(&values, 4).unwrap();
        let model = LstmModel::new(4, 2, 8, 0.05).unwrap().with_seed(5);
        let trained = model.train(&data).unwrap();

        assert!(trained.predict_next(&[0.1, 0.2]).is_err());
        assert!(trained.predict_next(&[0.1, 0.2, 0.3, 0.4]).is_ok());
    }
}
