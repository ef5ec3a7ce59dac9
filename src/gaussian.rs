//! Multivariate normal density.
//!
//! ```text
//! N(x | μ, Σ) = (2π)^(-a/2) |Σ|^(-1/2) exp(-½ (x-μ)ᵀ Σ⁻¹ (x-μ))
//! ```
//!
//! The covariance is factored once as `Σ = L Lᵀ` (faer's LLᵀ). Both the
//! Mahalanobis term and the log-determinant come from `L`:
//!
//! ```text
//! (x-μ)ᵀ Σ⁻¹ (x-μ) = ||L⁻¹ (x-μ)||²        log|Σ| = 2 Σᵢ log Lᵢᵢ
//! ```
//!
//! A covariance that cannot be factored is not positive-definite, so it has no
//! valid density. Mixture and discriminant fits turn that into
//! [`Error::NotPositiveDefinite`] with their own component/iteration context.

use crate::error::{Error, Result};
use faer::linalg::solvers::Llt;
use faer::prelude::*;
use faer::{Mat, Side};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Relative tolerance for `|Σ_pq - Σ_qp|`.
const SYMMETRY_TOL: f64 = 1e-9;

/// A Gaussian with a pre-factored covariance.
#[derive(Debug, Clone)]
pub struct Gaussian {
    mean: Array1<f64>,
    llt: Llt<f64>,
    /// `-½ (a log 2π + log|Σ|)`.
    log_norm: f64,
}

impl Gaussian {
    /// Build a density from a mean and a symmetric `a × a` covariance.
    ///
    /// Fails with [`Error::SingularCovariance`] when the covariance cannot be
    /// factored.
    pub fn new(mean: ArrayView1<'_, f64>, covariance: ArrayView2<'_, f64>) -> Result<Self> {
        let a = mean.len();
        for found in [covariance.nrows(), covariance.ncols()] {
            if found != a {
                return Err(Error::DimensionMismatch { expected: a, found });
            }
        }
        check_symmetric(covariance)?;
        Self::factor(mean, covariance).ok_or(Error::SingularCovariance)
    }

    /// Factor without shape or symmetry checks; `None` when the covariance is
    /// not positive-definite (or not finite). Only the lower triangle is read.
    pub(crate) fn factor(mean: ArrayView1<'_, f64>, covariance: ArrayView2<'_, f64>) -> Option<Self> {
        let a = mean.len();
        if a == 0 || covariance.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let sigma = Mat::<f64>::from_fn(a, a, |i, j| covariance[[i, j]]);
        let llt = sigma.as_ref().llt(Side::Lower).ok()?;

        let l = llt.L();
        let mut log_det = 0.0;
        for i in 0..a {
            let d = l[(i, i)];
            if !(d > 0.0 && d.is_finite()) {
                return None;
            }
            log_det += 2.0 * d.ln();
        }
        if !log_det.is_finite() {
            return None;
        }

        Some(Self {
            mean: mean.to_owned(),
            llt,
            log_norm: -0.5 * (a as f64 * LN_2PI + log_det),
        })
    }

    /// Dimensionality.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Mean vector.
    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    /// `log |Σ|`.
    pub fn log_det(&self) -> f64 {
        -2.0 * self.log_norm - self.dim() as f64 * LN_2PI
    }

    /// Squared Mahalanobis distance `(x-μ)ᵀ Σ⁻¹ (x-μ)`.
    pub fn mahalanobis_sq(&self, x: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(x.len(), self.dim());
        let d = Mat::<f64>::from_fn(self.dim(), 1, |i, _| x[i] - self.mean[i]);
        let w = self.llt.solve(&d);
        (0..self.dim()).map(|i| d[(i, 0)] * w[(i, 0)]).sum()
    }

    /// Log density at `x`.
    pub fn log_pdf(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.log_norm - 0.5 * self.mahalanobis_sq(x)
    }

    /// Density at `x`.
    pub fn pdf(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.log_pdf(x).exp()
    }

    /// Draw one point: `μ + L z` with `z ~ N(0, I)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        let a = self.dim();
        let draws: Vec<f64> = (0..a).map(|_| StandardNormal.sample(rng)).collect();
        let z = Mat::<f64>::from_fn(a, 1, |i, _| draws[i]);
        let lz = self.llt.L() * z.as_ref();
        Array1::from_shape_fn(a, |i| self.mean[i] + lz[(i, 0)])
    }
}

/// Reject a covariance whose upper and lower triangles disagree.
pub(crate) fn check_symmetric(covariance: ArrayView2<'_, f64>) -> Result<()> {
    let a = covariance.nrows();
    for p in 0..a {
        for q in (p + 1)..a {
            let (lo, hi) = (covariance[[q, p]], covariance[[p, q]]);
            if (lo - hi).abs() > SYMMETRY_TOL * lo.abs().max(hi.abs()).max(1.0) {
                return Err(Error::InvalidParameter {
                    name: "covariance",
                    message: "must be symmetric",
                });
            }
        }
    }
    Ok(())
}

/// Log-sum-exp for numerical stability.
pub(crate) fn logsumexp(values: &[f64]) -> f64 {
    let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max_val.is_finite() {
        return max_val;
    }
    max_val
        + values
            .iter()
            .map(|&v| (v - max_val).exp())
            .sum::<f64>()
            .ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::prelude::*;

    #[test]
    fn test_standard_normal_at_mean() {
        let g = Gaussian::new(array![0.0, 0.0].view(), Array2::eye(2).view()).unwrap();
        let expected = 1.0 / (2.0 * std::f64::consts::PI);
        assert!((g.pdf(array![0.0, 0.0].view()) - expected).abs() < 1e-12);
        assert!(g.log_det().abs() < 1e-12);
    }

    #[test]
    fn test_matches_closed_form_2d() {
        // Σ = [[4, 1], [1, 2]], |Σ| = 7, Σ⁻¹ = [[2, -1], [-1, 4]] / 7
        let cov = array![[4.0, 1.0], [1.0, 2.0]];
        let g = Gaussian::new(array![1.0, -1.0].view(), cov.view()).unwrap();
        let x = array![2.0, 0.0];
        // d = (1, 1): dᵀ Σ⁻¹ d = (2 - 1 - 1 + 4) / 7 = 4/7
        assert!((g.mahalanobis_sq(x.view()) - 4.0 / 7.0).abs() < 1e-12);
        assert!((g.log_det() - 7.0_f64.ln()).abs() < 1e-12);

        let expected = (-2.0_f64 / 7.0).exp() / (2.0 * std::f64::consts::PI * 7.0_f64.sqrt());
        assert!((g.pdf(x.view()) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_singular_covariance_rejected() {
        let cov = array![[1.0, 1.0], [1.0, 1.0]];
        let err = Gaussian::new(array![0.0, 0.0].view(), cov.view()).unwrap_err();
        assert_eq!(err, Error::SingularCovariance);
    }

    #[test]
    fn test_asymmetric_covariance_rejected() {
        // The factorization reads only the lower triangle; the 50 would be lost.
        let cov = array![[1.0, 50.0], [0.0, 1.0]];
        assert_eq!(
            Gaussian::new(array![0.0, 0.0].view(), cov.view()).unwrap_err(),
            Error::InvalidParameter {
                name: "covariance",
                message: "must be symmetric"
            }
        );

        // Rounding-level asymmetry on large entries is tolerated.
        let cov = array![[1e6, 2e5], [2e5 * (1.0 + 1e-13), 1e6]];
        assert!(Gaussian::new(array![0.0, 0.0].view(), cov.view()).is_ok());
    }

    #[test]
    fn test_indefinite_covariance_rejected() {
        let cov = array![[1.0, 0.0], [0.0, -1.0]];
        assert!(Gaussian::new(array![0.0, 0.0].view(), cov.view()).is_err());
    }

    #[test]
    fn test_shape_mismatch() {
        let err = Gaussian::new(array![0.0, 0.0, 0.0].view(), Array2::eye(2).view()).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_sample_moments() {
        let cov = array![[2.0, 0.5], [0.5, 1.0]];
        let g = Gaussian::new(array![3.0, -2.0].view(), cov.view()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000;
        let samples: Vec<Array1<f64>> = (0..n).map(|_| g.sample(&mut rng)).collect();
        let mean_x = samples.iter().map(|s| s[0]).sum::<f64>() / n as f64;
        let mean_y = samples.iter().map(|s| s[1]).sum::<f64>() / n as f64;
        let cov_xy = samples
            .iter()
            .map(|s| (s[0] - mean_x) * (s[1] - mean_y))
            .sum::<f64>()
            / n as f64;
        assert!((mean_x - 3.0).abs() < 0.05);
        assert!((mean_y + 2.0).abs() < 0.05);
        assert!((cov_xy - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_logsumexp() {
        let v = [1000.0, 1000.0];
        assert!((logsumexp(&v) - (1000.0 + 2.0_f64.ln())).abs() < 1e-9);
        assert_eq!(logsumexp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), f64::NEG_INFINITY);
    }
}
