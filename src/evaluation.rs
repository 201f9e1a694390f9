//! Scoring learned factors against held-out interactions.
use ndarray::Array2;

use data::SparseMatrix;

/// Evaluation error types.
#[derive(Debug, Fail)]
pub enum EvaluationError {
    /// Factor shapes do not agree with the held-out matrix.
    #[fail(display = "Factor dimensions do not match the held-out matrix.")]
    DimensionMismatch,
}

/// Trait for scoring learned user/item factors against held-out data.
///
/// The example driver consumes scorers exclusively through this interface,
/// so alternative evaluation strategies can be substituted without touching
/// the dataset loader or the models.
pub trait Evaluator {
    /// Scores the factors. Higher is better.
    fn evaluate(
        &self,
        user_factors: &Array2<f32>,
        item_factors: &Array2<f32>,
    ) -> Result<f32, EvaluationError>;
}

/// Scores factors by the mean predicted affinity over the nonzero entries
/// of a held-out matrix.
///
/// Every held-out entry is a positive interaction, so models assigning
/// high scores to them are preferable. This is a cheap sanity signal for
/// the epoch loop, not a ranking measure.
pub struct HeldOutScorer<'a> {
    held_out: &'a SparseMatrix,
}

impl<'a> HeldOutScorer<'a> {
    /// Creates a scorer over `held_out`.
    pub fn new(held_out: &'a SparseMatrix) -> Self {
        HeldOutScorer { held_out: held_out }
    }
}

impl<'a> Evaluator for HeldOutScorer<'a> {
    fn evaluate(
        &self,
        user_factors: &Array2<f32>,
        item_factors: &Array2<f32>,
    ) -> Result<f32, EvaluationError> {
        if user_factors.nrows() != self.held_out.num_users()
            || item_factors.nrows() != self.held_out.num_items()
            || user_factors.ncols() != item_factors.ncols()
        {
            return Err(EvaluationError::DimensionMismatch);
        }

        if self.held_out.nnz() == 0 {
            return Ok(0.0);
        }

        let mut total = 0.0;

        for row in self.held_out.iter_users() {
            let user_embedding = user_factors.row(row.user_id);

            for &item_id in row.item_ids {
                total += user_embedding.dot(&item_factors.row(item_id));
            }
        }

        Ok(total / self.held_out.nnz() as f32)
    }
}

#[cfg(test)]
mod tests {

    use ndarray::arr2;

    use super::*;
    use data::{Interactions, RawInteraction};

    fn held_out() -> SparseMatrix {
        // Two users and two items; nonzeros at (0, 0) and (1, 1).
        let raw = vec![
            RawInteraction {
                user: 10,
                item: 100,
                rating: 5.0,
                timestamp: 0,
            },
            RawInteraction {
                user: 20,
                item: 200,
                rating: 5.0,
                timestamp: 1,
            },
        ];

        let (interactions, _, _) = Interactions::from_raw(&raw);

        interactions.to_matrix()
    }

    #[test]
    fn scores_the_mean_affinity_of_held_out_positives() {
        let matrix = held_out();
        let scorer = HeldOutScorer::new(&matrix);

        let user_factors = arr2(&[[1.0f32, 0.0], [0.0, 2.0]]);
        let item_factors = arr2(&[[3.0f32, 0.0], [0.0, 5.0]]);

        // (1, 0)·(3, 0) = 3 and (0, 2)·(0, 5) = 10, mean 6.5.
        let score = scorer.evaluate(&user_factors, &item_factors).unwrap();

        assert_eq!(score, 6.5);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let matrix = held_out();
        let scorer = HeldOutScorer::new(&matrix);

        let too_many_users = arr2(&[[1.0f32], [1.0], [1.0]]);
        let item_factors = arr2(&[[1.0f32], [1.0]]);

        assert!(scorer.evaluate(&too_many_users, &item_factors).is_err());

        let user_factors = arr2(&[[1.0f32, 0.0], [0.0, 1.0]]);
        let narrower_items = arr2(&[[1.0f32], [1.0]]);

        assert!(scorer.evaluate(&user_factors, &narrower_items).is_err());
    }

    #[test]
    fn empty_held_out_matrix_scores_zero() {
        let raw = vec![
            RawInteraction {
                user: 10,
                item: 100,
                rating: 1.0,
                timestamp: 0,
            },
            RawInteraction {
                user: 20,
                item: 200,
                rating: 2.0,
                timestamp: 1,
            },
        ];

        let (interactions, _, _) = Interactions::from_raw(&raw);
        let matrix = interactions.binarize(4.0).to_matrix();

        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix.nnz(), 0);

        let scorer = HeldOutScorer::new(&matrix);
        let user_factors = arr2(&[[1.0f32], [1.0]]);
        let item_factors = arr2(&[[1.0f32], [1.0]]);

        assert_eq!(scorer.evaluate(&user_factors, &item_factors).unwrap(), 0.0);
    }
}
