#![deny(missing_docs)]
//! # ifrec
//!
//! `ifrec` prepares classic explicit-rating datasets for implicit-feedback
//! recommender experiments: it downloads the Movielens archives, binarizes
//! ratings into positive-only interactions, reindexes the sparse user and
//! item identifiers to dense ranges, and partitions the interactions into
//! train/validation/test sparse matrices with a fixed seed.
//!
//! Models and evaluators are deliberately thin collaborators behind the
//! [`ImplicitFeedbackModel`](trait.ImplicitFeedbackModel.html) and
//! [`Evaluator`](evaluation/trait.Evaluator.html) traits, so that any
//! factorization backend can consume the prepared matrices.
//!
//! ## Example
//! Preparing Movielens 100K and running the bundled popularity baseline:
//!
//! ```no_run
//! # extern crate ifrec;
//! use ifrec::ImplicitFeedbackModel;
//! use ifrec::datasets::{Movielens, MovielensVariant};
//! use ifrec::evaluation::{Evaluator, HeldOutScorer};
//! use ifrec::models::popularity::Hyperparameters;
//!
//! let dataset = Movielens::load(MovielensVariant::Ml100K, 4.0).unwrap();
//!
//! println!(
//!     "{} users, {} items, {} training interactions",
//!     dataset.num_users(),
//!     dataset.num_items(),
//!     dataset.train_size()
//! );
//!
//! let evaluator = HeldOutScorer::new(dataset.test());
//! let mut model = Hyperparameters::new(20).weight_decay(0.1).build();
//!
//! for _ in 0..5 {
//!     model.fit(dataset.train(), 1, 1, false).unwrap();
//!     let score = evaluator
//!         .evaluate(model.user_factors(), model.item_factors())
//!         .unwrap();
//!     println!("{}", score);
//! }
//! ```
#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate failure;

extern crate csv;
extern crate fnv;
extern crate ndarray;
extern crate rand;
extern crate reqwest;
extern crate serde;
extern crate zip;

pub mod data;
pub mod datasets;
pub mod evaluation;
pub mod models;

use ndarray::Array2;

/// Alias for user indices.
pub type UserId = usize;
/// Alias for item indices.
pub type ItemId = usize;
/// Alias for timestamps.
pub type Timestamp = usize;

/// Trait describing models that learn latent user and item factors from a
/// binary interaction matrix.
///
/// The dataset loader has no dependency on any concrete model; everything it
/// produces is consumed through this narrow interface.
pub trait ImplicitFeedbackModel {
    /// Fit the model to the training matrix.
    ///
    /// `num_threads` is a hint for parallel backends; single-threaded
    /// implementations are free to ignore it. When `verbose` is set,
    /// implementations may print per-epoch progress.
    fn fit(
        &mut self,
        train: &data::SparseMatrix,
        num_epochs: usize,
        num_threads: usize,
        verbose: bool,
    ) -> Result<(), failure::Error>;

    /// The learned `(num_users, num_components)` user factors.
    fn user_factors(&self) -> &Array2<f32>;

    /// The learned `(num_items, num_components)` item factors.
    fn item_factors(&self) -> &Array2<f32>;
}
