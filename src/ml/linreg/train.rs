use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::LinearModel;
use crate::training::{EpochControl, TrainError, Trainer, TrainingSample, TrainingSet};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-7;

/// Optimizer settings for the linear head.
///
/// Config keys (TOML `[training]`): `epochs`, `learning_rate`, `batch_size`,
/// `shuffle`, `seed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainOptions {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            learning_rate: default_learning_rate(),
            batch_size: default_batch_size(),
            shuffle: default_shuffle(),
            seed: default_seed(),
        }
    }
}

fn default_epochs() -> usize {
    50
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_batch_size() -> usize {
    32
}

fn default_shuffle() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

impl TrainOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.epochs == 0 {
            return Err("epochs must be > 0".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("learning_rate must be > 0".to_string());
        }
        Ok(())
    }
}

/// Mini-batch Adam over mean squared error.
#[derive(Debug, Clone, Default)]
pub struct LinearTrainer {
    pub options: TrainOptions,
}

impl LinearTrainer {
    pub fn new(options: TrainOptions) -> Self {
        Self { options }
    }
}

/// First and second moment estimates for each parameter (3 weights + bias).
struct Adam {
    m: [f64; 4],
    v: [f64; 4],
    step: i32,
}

impl Adam {
    fn new() -> Self {
        Self {
            m: [0.0; 4],
            v: [0.0; 4],
            step: 0,
        }
    }

    fn apply(&mut self, params: &mut [f64; 4], grads: &[f64; 4], lr: f64) {
        self.step += 1;
        let correction = (1.0 - BETA2.powi(self.step)).sqrt() / (1.0 - BETA1.powi(self.step));
        let lr_t = lr * correction;
        for i in 0..4 {
            self.m[i] = BETA1 * self.m[i] + (1.0 - BETA1) * grads[i];
            self.v[i] = BETA2 * self.v[i] + (1.0 - BETA2) * grads[i] * grads[i];
            params[i] -= lr_t * self.m[i] / (self.v[i].sqrt() + EPSILON);
        }
    }
}

impl Trainer for LinearTrainer {
    type Model = LinearModel;

    fn epochs(&self) -> usize {
        self.options.epochs
    }

    fn fit(
        &self,
        set: &TrainingSet,
        on_epoch: &mut dyn FnMut(TrainingSample) -> EpochControl,
    ) -> Result<LinearModel, TrainError> {
        set.check()?;
        self.options.validate().map_err(TrainError::InvalidOptions)?;

        let mut rng = StdRng::seed_from_u64(self.options.seed);
        // Glorot-uniform kernel (fan_in 3, fan_out 1), zero bias.
        let limit = (6.0f64 / 4.0).sqrt();
        let mut params = [0.0f64; 4];
        for w in params.iter_mut().take(3) {
            *w = rng.random_range(-limit..limit);
        }

        let mut adam = Adam::new();
        let mut indices: Vec<usize> = (0..set.len()).collect();
        let batch_size = self.options.batch_size.max(1);
        let lr = self.options.learning_rate;

        for epoch in 1..=self.options.epochs {
            if self.options.shuffle {
                indices.shuffle(&mut rng);
            }
            let mut loss_sum = 0.0f64;
            for batch in indices.chunks(batch_size) {
                let mut grads = [0.0f64; 4];
                let mut batch_loss = 0.0f64;
                for &idx in batch {
                    let x = &set.x[idx];
                    let predicted = params[3] + params[0] * x[0] + params[1] * x[1] + params[2] * x[2];
                    let err = predicted - set.y[idx];
                    batch_loss += err * err;
                    for i in 0..3 {
                        grads[i] += err * x[i];
                    }
                    grads[3] += err;
                }
                let scale = 2.0 / batch.len() as f64;
                for grad in &mut grads {
                    *grad *= scale;
                }
                adam.apply(&mut params, &grads, lr);
                loss_sum += batch_loss;
            }

            let loss = loss_sum / set.len() as f64;
            if !loss.is_finite() {
                return Err(TrainError::Diverged { epoch });
            }
            tracing::debug!("epoch {epoch}: loss {loss:.6}");
            if on_epoch(TrainingSample { epoch, loss }) == EpochControl::Stop {
                return Err(TrainError::Stopped { epoch });
            }
        }

        let model = LinearModel {
            weights: [params[0], params[1], params[2]],
            bias: params[3],
        };
        model.validate().map_err(|_| TrainError::Diverged {
            epoch: self.options.epochs,
        })?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::Regressor;

    fn linear_set(n: usize) -> TrainingSet {
        let mut rng = StdRng::seed_from_u64(7);
        let mut set = TrainingSet::default();
        for _ in 0..n {
            let size = rng.random_range(30..=250) as f64 / 250.0;
            let bathrooms = rng.random_range(1..=5) as f64;
            let bedrooms = rng.random_range(1..=6) as f64;
            let price = 0.5 * size + 0.005 * bathrooms + 0.0075 * bedrooms;
            set.x.push([size, bathrooms, bedrooms]);
            set.y.push(price);
        }
        set
    }

    fn fit_collecting(trainer: &LinearTrainer, set: &TrainingSet) -> (LinearModel, Vec<TrainingSample>) {
        let mut samples = Vec::new();
        let model = trainer
            .fit(set, &mut |sample| {
                samples.push(sample);
                EpochControl::Continue
            })
            .unwrap();
        (model, samples)
    }

    #[test]
    fn loss_drops_on_noiseless_linear_data() {
        let set = linear_set(256);
        let trainer = LinearTrainer::default();
        let (model, samples) = fit_collecting(&trainer, &set);
        assert_eq!(samples.len(), 50);
        let epochs: Vec<usize> = samples.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, (1..=50).collect::<Vec<_>>());
        let first = samples[0].loss;
        let last = samples[49].loss;
        assert!(last.is_finite());
        assert!(last < first * 0.1, "first {first} last {last}");
        let mse = set
            .x
            .iter()
            .zip(&set.y)
            .map(|(x, y)| (model.predict(x) - y).powi(2))
            .sum::<f64>()
            / set.len() as f64;
        assert!(mse < first * 0.1);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let set = linear_set(64);
        let trainer = LinearTrainer::new(TrainOptions {
            epochs: 5,
            ..TrainOptions::default()
        });
        let (a, _) = fit_collecting(&trainer, &set);
        let (b, _) = fit_collecting(&trainer, &set);
        assert_eq!(a, b);
    }

    #[test]
    fn stop_request_ends_run() {
        let set = linear_set(16);
        let trainer = LinearTrainer::default();
        let mut seen = 0usize;
        let result = trainer.fit(&set, &mut |_| {
            seen += 1;
            if seen == 3 {
                EpochControl::Stop
            } else {
                EpochControl::Continue
            }
        });
        assert!(matches!(result, Err(TrainError::Stopped { epoch: 3 })));
    }

    #[test]
    fn rejects_empty_set_and_zero_epochs() {
        let trainer = LinearTrainer::default();
        let result = trainer.fit(&TrainingSet::default(), &mut |_| EpochControl::Continue);
        assert!(matches!(result, Err(TrainError::EmptyTrainingSet)));

        let trainer = LinearTrainer::new(TrainOptions {
            epochs: 0,
            ..TrainOptions::default()
        });
        let result = trainer.fit(&linear_set(4), &mut |_| EpochControl::Continue);
        assert!(matches!(result, Err(TrainError::InvalidOptions(_))));
    }
}
