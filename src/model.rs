//! Fitted parameter sets shared by the mixture and discriminant models.

use crate::error::{Error, Result};
use crate::gaussian::check_symmetric;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Allowed `|Σ weights - 1|`.
const WEIGHT_SUM_TOL: f64 = 1e-9;

/// Per-component parameters: mixing weights (or class priors), means and
/// covariances.
///
/// `means` is `m × a`, one row per component, matching the [`Dataset`]
/// layout. `covariances[k]` is the `a × a` covariance of component `k`.
///
/// [`Dataset`]: crate::Dataset
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureParams {
    /// Mixing proportions, non-negative and summing to 1.
    pub weights: Array1<f64>,
    /// Component means, `m × a`.
    pub means: Array2<f64>,
    /// Component covariances, each `a × a`.
    pub covariances: Vec<Array2<f64>>,
}

impl MixtureParams {
    /// Check that the three parts agree on `m` and `a`, that the weights form a
    /// distribution and that every covariance is symmetric.
    pub fn new(weights: Array1<f64>, means: Array2<f64>, covariances: Vec<Array2<f64>>) -> Result<Self> {
        let m = weights.len();
        if m == 0 {
            return Err(Error::EmptyInput);
        }
        if means.nrows() != m {
            return Err(Error::LengthMismatch {
                expected: m,
                found: means.nrows(),
            });
        }
        if covariances.len() != m {
            return Err(Error::LengthMismatch {
                expected: m,
                found: covariances.len(),
            });
        }
        let a = means.ncols();
        for cov in &covariances {
            for found in [cov.nrows(), cov.ncols()] {
                if found != a {
                    return Err(Error::DimensionMismatch { expected: a, found });
                }
            }
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidParameter {
                name: "weights",
                message: "must be finite and non-negative",
            });
        }
        if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(Error::InvalidParameter {
                name: "weights",
                message: "must sum to 1",
            });
        }
        for cov in &covariances {
            check_symmetric(cov.view())?;
        }
        Ok(Self {
            weights,
            means,
            covariances,
        })
    }

    /// Number of components (`m`).
    pub fn n_components(&self) -> usize {
        self.weights.len()
    }

    /// Feature dimensionality (`a`).
    pub fn dim(&self) -> usize {
        self.means.ncols()
    }

    /// Mean of component `k`.
    pub fn mean(&self, k: usize) -> ArrayView1<'_, f64> {
        self.means.row(k)
    }

    /// Covariance of component `k`.
    pub fn covariance(&self, k: usize) -> ArrayView2<'_, f64> {
        self.covariances[k].view()
    }

    /// Largest absolute coordinate-wise difference across weights, means and
    /// covariances.
    pub fn max_abs_change(&self, other: &MixtureParams) -> f64 {
        let w = self
            .weights
            .iter()
            .zip(other.weights.iter())
            .map(|(a, b)| (a - b).abs());
        let mu = self
            .means
            .iter()
            .zip(other.means.iter())
            .map(|(a, b)| (a - b).abs());
        let sig = self
            .covariances
            .iter()
            .zip(other.covariances.iter())
            .flat_map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()));
        w.chain(mu).chain(sig).fold(0.0, f64::max)
    }
}

/// How an iterative fit stopped.
///
/// Hitting the iteration cap is not an error: the parameters from the last
/// iteration are still returned alongside this annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
    /// The change between iterations fell below tolerance.
    Converged {
        /// Iterations run, including the final one.
        iterations: usize,
    },
    /// The iteration cap was reached first.
    NotConverged {
        /// Iterations run (the cap).
        iterations: usize,
        /// Change measured on the last iteration.
        max_change: f64,
    },
}

impl Convergence {
    /// Whether tolerance was met.
    pub fn converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    /// Iterations run.
    pub fn iterations(&self) -> usize {
        match *self {
            Convergence::Converged { iterations } | Convergence::NotConverged { iterations, .. } => iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(shift: f64) -> MixtureParams {
        MixtureParams::new(
            array![0.5, 0.5],
            array![[0.0, 0.0], [1.0, 1.0 + shift]],
            vec![Array2::eye(2), Array2::eye(2) * (1.0 + 2.0 * shift)],
        )
        .unwrap()
    }

    #[test]
    fn test_max_abs_change_sees_every_part() {
        assert_eq!(params(0.0).max_abs_change(&params(0.0)), 0.0);
        // covariance diagonal moves by 2 * shift, the mean only by shift
        assert!((params(0.0).max_abs_change(&params(0.25)) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_shape_checks() {
        let err = MixtureParams::new(array![1.0], array![[0.0, 0.0]], vec![Array2::eye(3)]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
        let err = MixtureParams::new(array![0.5, 0.5], array![[0.0]], vec![Array2::eye(1)]).unwrap_err();
        assert_eq!(
            err,
            Error::LengthMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let err = MixtureParams::new(
            array![0.9, 0.9],
            array![[0.0], [1.0]],
            vec![Array2::eye(1), Array2::eye(1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidParameter {
                name: "weights",
                message: "must sum to 1"
            }
        );
        assert!(MixtureParams::new(
            array![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            array![[0.0], [1.0], [2.0]],
            vec![Array2::eye(1); 3],
        )
        .is_ok());
    }

    #[test]
    fn test_covariances_must_be_symmetric() {
        let err = MixtureParams::new(
            array![1.0],
            array![[0.0, 0.0]],
            vec![array![[1.0, 50.0], [0.0, 1.0]]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidParameter {
                name: "covariance",
                message: "must be symmetric"
            }
        );
    }

    #[test]
    fn test_convergence_accessors() {
        let c = Convergence::NotConverged {
            iterations: 10,
            max_change: 0.1,
        };
        assert!(!c.converged());
        assert_eq!(c.iterations(), 10);
        assert!(Convergence::Converged { iterations: 3 }.converged());
    }
}
