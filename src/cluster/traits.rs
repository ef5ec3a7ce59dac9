//! Clustering traits.

use crate::dataset::Dataset;
use crate::error::Result;
use ndarray::Array2;
use rand::Rng;

/// Trait for clustering algorithms.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels, one per input point. All random
    /// choices are drawn from `rng`.
    fn fit_predict<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}

/// Trait for soft clustering algorithms that return probabilities.
pub trait SoftClustering: Clustering {
    /// Fit and return soft cluster assignments (probabilities).
    ///
    /// Returns an `m × n` matrix where column i is the distribution of
    /// point i over the m clusters.
    fn fit_predict_proba<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<Array2<f64>>;
}
