//! Gaussian Mixture Model clustering.
//!
//! GMM provides **soft clustering** with probabilistic assignments,
//! allowing items to belong to multiple clusters with different probabilities.
//!
//! # The Probabilistic Model
//!
//! GMM assumes data is generated from m Gaussian distributions:
//!
//! ```text
//! P(x) = Σₖ φₖ × N(x | μₖ, Σₖ)
//! ```
//!
//! Where:
//! - φₖ = mixing weight (probability of component k)
//! - μₖ = mean of component k
//! - Σₖ = full covariance matrix of component k
//!
//! # The EM Algorithm
//!
//! **E-step**: Compute "responsibilities" (soft assignments):
//! ```text
//! wₖᵢ = φₖ × N(xᵢ | μₖ, Σₖ) / Σⱼ φⱼ × N(xᵢ | μⱼ, Σⱼ)
//! ```
//!
//! **M-step**: Update parameters using responsibilities, with `Wₖ = Σᵢ wₖᵢ`:
//! - φₖ = Wₖ / n
//! - μₖ = Σᵢ wₖᵢ xᵢ / Wₖ
//! - Σₖ = Σᵢ wₖᵢ (xᵢ - μₖ)(xᵢ - μₖ)ᵀ / Wₖ
//!
//! Iteration stops once the largest absolute change of any weight, mean or
//! covariance entry drops below `tol`, or after `max_iter` iterations.
//!
//! The E-step works in log space and normalizes with log-sum-exp, so far-away
//! points do not underflow to an all-zero column. If every score of a point is
//! still zero (log score −∞), that point's column falls back to uniform.
//!
//! # Failure Modes
//!
//! - **Local optima**: EM converges to local maxima; initialization matters
//! - **Collapsed component**: A component with (almost) no responsibility mass
//!   has no defined mean; the fit aborts with [`Error::CollapsedComponent`]
//! - **Singular covariance**: A component that shrinks onto a subspace is not
//!   positive-definite; the fit aborts with [`Error::NotPositiveDefinite`].
//!   A small `reg_covar` ridge keeps this at bay on degenerate data.

use super::kmeans::{plus_plus_indices, random_indices};
use super::traits::{Clustering, SoftClustering};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::gaussian::{logsumexp, Gaussian};
use crate::model::{Convergence, MixtureParams};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How the initial component means are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GmmInit {
    /// m distinct data points drawn uniformly.
    #[default]
    RandomPoints,
    /// m data points drawn by k-means++ D² seeding.
    PlusPlus,
}

/// Gaussian Mixture Model clustering.
#[derive(Debug, Clone)]
pub struct Gmm {
    /// Number of components (clusters).
    n_components: usize,
    /// Maximum EM iterations.
    max_iter: usize,
    /// Convergence tolerance on the largest parameter change.
    tol: f64,
    init: GmmInit,
    /// Regularization for covariance.
    reg_covar: f64,
    /// Responsibility mass at or below which a component counts as collapsed.
    min_component_mass: f64,
}

/// Result of [`Gmm::fit`].
#[derive(Debug, Clone)]
pub struct GmmFit {
    /// `m × n`; column i is point i's distribution over components.
    pub responsibilities: Array2<f64>,
    /// Fitted weights, means and covariances.
    pub params: MixtureParams,
    /// How the fit stopped.
    pub convergence: Convergence,
    /// Mean per-point log-likelihood under `params`.
    pub log_likelihood: f64,
}

impl GmmFit {
    /// Hard assignment: the most responsible component per point, ties to the
    /// lowest index.
    pub fn labels(&self) -> Vec<usize> {
        hard_labels(self.responsibilities.view())
    }
}

impl Gmm {
    /// Create a new GMM with the given number of components.
    pub fn new(n_components: usize) -> Self {
        Self {
            n_components,
            max_iter: 100,
            tol: 1e-6,
            init: GmmInit::default(),
            reg_covar: 0.0,
            min_component_mass: 1e-10,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set how the initial means are picked.
    pub fn with_init(mut self, init: GmmInit) -> Self {
        self.init = init;
        self
    }

    /// Add `reg_covar` to every covariance diagonal after each M-step.
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Set the collapse threshold on a component's responsibility mass.
    pub fn with_min_component_mass(mut self, mass: f64) -> Self {
        self.min_component_mass = mass;
        self
    }

    fn validate(&self, data: &Dataset) -> Result<()> {
        let n = data.n_points();
        if self.n_components == 0 || self.n_components > n {
            return Err(Error::InvalidClusterCount {
                requested: self.n_components,
                n_items: n,
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be > 0",
            });
        }
        for (name, value) in [
            ("tol", self.tol),
            ("reg_covar", self.reg_covar),
            ("min_component_mass", self.min_component_mass),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(Error::InvalidParameter {
                    name,
                    message: "must be finite and >= 0",
                });
            }
        }
        Ok(())
    }

    /// Run EM to convergence or to the iteration cap.
    pub fn fit<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<GmmFit> {
        self.validate(data)?;

        let x = data.view();
        let m = self.n_components;
        let a = data.dim();

        let seeds = match self.init {
            GmmInit::RandomPoints => random_indices(x.nrows(), m, rng),
            GmmInit::PlusPlus => plus_plus_indices(x, m, rng),
        };
        let mut params = MixtureParams {
            weights: Array1::from_elem(m, 1.0 / m as f64),
            means: x.select(Axis(0), &seeds),
            covariances: vec![Array2::eye(a); m],
        };
        let mut components = (0..m)
            .map(|k| factor(&params, k, 0))
            .collect::<Result<Vec<_>>>()?;

        let mut convergence = Convergence::NotConverged {
            iterations: 0,
            max_change: f64::INFINITY,
        };

        for iteration in 1..=self.max_iter {
            let (resp, log_likelihood) = e_step(x, params.weights.view(), &components);
            let (new_params, new_components) = self.m_step(x, resp.view(), iteration)?;

            let max_change = new_params.max_abs_change(&params);
            params = new_params;
            components = new_components;
            debug!(iteration, max_change, log_likelihood, "EM iteration");

            if max_change < self.tol {
                convergence = Convergence::Converged { iterations: iteration };
                break;
            }
            convergence = Convergence::NotConverged {
                iterations: iteration,
                max_change,
            };
        }

        if let Convergence::NotConverged { iterations, max_change } = convergence {
            warn!(iterations, max_change, "EM hit the iteration cap before converging");
        }

        let (responsibilities, log_likelihood) = e_step(x, params.weights.view(), &components);
        Ok(GmmFit {
            responsibilities,
            params,
            convergence,
            log_likelihood,
        })
    }

    fn m_step(
        &self,
        x: ArrayView2<'_, f64>,
        resp: ArrayView2<'_, f64>,
        iteration: usize,
    ) -> Result<(MixtureParams, Vec<Gaussian>)> {
        let n = x.nrows();
        let a = x.ncols();
        let m = resp.nrows();

        let mut weights = Array1::zeros(m);
        let mut means = Array2::zeros((m, a));
        let mut covariances = Vec::with_capacity(m);

        for k in 0..m {
            let r = resp.row(k);
            let mass = r.sum();
            if !(mass > self.min_component_mass) {
                return Err(Error::CollapsedComponent {
                    component: k,
                    iteration,
                    mass,
                });
            }

            weights[k] = mass / n as f64;
            let mean = r.dot(&x) / mass;

            // Σᵢ rᵢ dᵢ dᵢᵀ as (D ∘ r)ᵀ D, then averaged with its transpose.
            let diff = &x - &mean;
            let scatter = (&diff * &r.insert_axis(Axis(1))).t().dot(&diff);
            let mut cov = (&scatter + &scatter.t()) / (2.0 * mass);
            let mut diag = cov.diag_mut();
            diag += self.reg_covar;

            means.row_mut(k).assign(&mean);
            covariances.push(cov);
        }

        let params = MixtureParams {
            weights,
            means,
            covariances,
        };
        let components = (0..m)
            .map(|k| factor(&params, k, iteration))
            .collect::<Result<Vec<_>>>()?;
        Ok((params, components))
    }
}

impl Default for Gmm {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Clustering for Gmm {
    fn fit_predict<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<Vec<usize>> {
        Ok(self.fit(data, rng)?.labels())
    }

    fn n_clusters(&self) -> usize {
        self.n_components
    }
}

impl SoftClustering for Gmm {
    fn fit_predict_proba<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<Array2<f64>> {
        Ok(self.fit(data, rng)?.responsibilities)
    }
}

fn factor(params: &MixtureParams, k: usize, iteration: usize) -> Result<Gaussian> {
    Gaussian::factor(params.mean(k), params.covariance(k)).ok_or(Error::NotPositiveDefinite {
        component: k,
        iteration: Some(iteration),
    })
}

/// Responsibilities (`m × n`) and mean log-likelihood of `x` under the mixture.
pub(crate) fn e_step(
    x: ArrayView2<'_, f64>,
    weights: ArrayView1<'_, f64>,
    components: &[Gaussian],
) -> (Array2<f64>, f64) {
    let n = x.nrows();
    let m = components.len();

    #[cfg(feature = "parallel")]
    let columns: Vec<(Vec<f64>, f64)> = (0..n)
        .into_par_iter()
        .map(|i| point_responsibilities(x.row(i), weights, components))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let columns: Vec<(Vec<f64>, f64)> = x
        .rows()
        .into_iter()
        .map(|point| point_responsibilities(point, weights, components))
        .collect();

    let mut resp = Array2::zeros((m, n));
    let mut total = 0.0;
    for (i, (col, ll)) in columns.into_iter().enumerate() {
        for (k, w) in col.into_iter().enumerate() {
            resp[[k, i]] = w;
        }
        total += ll;
    }
    (resp, total / n as f64)
}

fn point_responsibilities(
    point: ArrayView1<'_, f64>,
    weights: ArrayView1<'_, f64>,
    components: &[Gaussian],
) -> (Vec<f64>, f64) {
    let m = components.len();
    let scores: Vec<f64> = components
        .iter()
        .zip(weights.iter())
        .map(|(g, &w)| w.ln() + g.log_pdf(point))
        .collect();

    let log_sum = logsumexp(&scores);
    if !log_sum.is_finite() {
        return (vec![1.0 / m as f64; m], log_sum);
    }
    (scores.iter().map(|s| (s - log_sum).exp()).collect(), log_sum)
}

/// Argmax per column, ties to the lowest row.
pub(crate) fn hard_labels(resp: ArrayView2<'_, f64>) -> Vec<usize> {
    resp.columns()
        .into_iter()
        .map(|col| {
            let mut best = 0;
            for (k, &p) in col.iter().enumerate() {
                if p > col[best] {
                    best = k;
                }
            }
            best
        })
        .collect()
}
