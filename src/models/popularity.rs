//! A damped item-popularity baseline.
use failure;
use ndarray::Array2;

use super::super::ImplicitFeedbackModel;
use data::SparseMatrix;

/// Hyperparameters of the popularity baseline.
#[derive(Clone, Debug)]
pub struct Hyperparameters {
    num_components: usize,
    weight_decay: f32,
}

impl Hyperparameters {
    /// Creates hyperparameters with `num_components` factor columns and a
    /// damping term of 0.1.
    pub fn new(num_components: usize) -> Self {
        Hyperparameters {
            num_components: num_components,
            weight_decay: 0.1,
        }
    }

    /// Sets the damping term applied to the interaction counts.
    pub fn weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Builds an unfitted model.
    pub fn build(self) -> PopularityModel {
        PopularityModel {
            hyper: self,
            user_factors: Array2::zeros((0, 0)),
            item_factors: Array2::zeros((0, 0)),
        }
    }
}

/// An item-popularity baseline.
///
/// Fitting counts each item's training interactions and writes the damped
/// popularity `count / (count + weight_decay)` into the first factor
/// component; every user gets a unit first component and the remaining
/// components stay zero, so predicted affinities reduce to item
/// popularity. This is not a factorization model: it is the simplest
/// possible collaborator for the fit/evaluate loop and a floor for real
/// models to beat.
#[derive(Clone, Debug)]
pub struct PopularityModel {
    hyper: Hyperparameters,
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
}

impl ImplicitFeedbackModel for PopularityModel {
    fn fit(
        &mut self,
        train: &SparseMatrix,
        num_epochs: usize,
        _num_threads: usize,
        verbose: bool,
    ) -> Result<(), failure::Error> {
        // A single counting pass is exact; further epochs recompute the
        // same counts so that repeated fit calls stay idempotent.
        for epoch in 0..num_epochs {
            let mut counts = vec![0usize; train.num_items()];

            for row in train.iter_users() {
                for &item_id in row.item_ids {
                    counts[item_id] += 1;
                }
            }

            let mut user_factors = Array2::zeros((train.num_users(), self.hyper.num_components));
            let mut item_factors = Array2::zeros((train.num_items(), self.hyper.num_components));

            if self.hyper.num_components > 0 {
                for (item_id, &count) in counts.iter().enumerate() {
                    item_factors[(item_id, 0)] =
                        count as f32 / (count as f32 + self.hyper.weight_decay);
                }

                for user_id in 0..train.num_users() {
                    user_factors[(user_id, 0)] = 1.0;
                }
            }

            self.user_factors = user_factors;
            self.item_factors = item_factors;

            if verbose {
                println!("epoch {}: counted {} interactions", epoch, train.nnz());
            }
        }

        Ok(())
    }

    fn user_factors(&self) -> &Array2<f32> {
        &self.user_factors
    }

    fn item_factors(&self) -> &Array2<f32> {
        &self.item_factors
    }
}
