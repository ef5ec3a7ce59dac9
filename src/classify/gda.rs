//! Gaussian Discriminant Analysis.
//!
//! A generative classifier: each class j gets a prior φⱼ and a full-covariance
//! Gaussian N(μⱼ, Σⱼ), all estimated in closed form from labeled points:
//!
//! ```text
//! φⱼ = countⱼ / n
//! μⱼ = mean of the points labeled j
//! Σⱼ = mean of (x - μⱼ)(x - μⱼ)ᵀ over the points labeled j
//! ```
//!
//! A point is assigned to the class with the largest φⱼ N(x | μⱼ, Σⱼ), which is
//! the largest posterior under the fitted model. Scores are compared in log
//! space. Ties go to the lowest class id.
//!
//! Because every class keeps its own covariance the decision boundaries are
//! quadratic.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::gaussian::{logsumexp, Gaussian};
use crate::model::MixtureParams;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::debug;

/// GDA fitter.
#[derive(Debug, Clone)]
pub struct Gda {
    n_classes: usize,
}

impl Gda {
    /// Fit `n_classes` classes labeled `0..n_classes`.
    pub fn new(n_classes: usize) -> Self {
        Self { n_classes }
    }

    /// Estimate priors, means and covariances from `labels`.
    ///
    /// Every class id in `0..n_classes` must occur at least once.
    pub fn fit(&self, data: &Dataset, labels: &[usize]) -> Result<GdaModel> {
        let m = self.n_classes;
        let n = data.n_points();
        let a = data.dim();

        if m == 0 {
            return Err(Error::InvalidParameter {
                name: "n_classes",
                message: "must be > 0",
            });
        }
        if labels.len() != n {
            return Err(Error::LengthMismatch {
                expected: n,
                found: labels.len(),
            });
        }

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); m];
        for (index, &label) in labels.iter().enumerate() {
            if label >= m {
                return Err(Error::LabelOutOfRange {
                    index,
                    label,
                    n_classes: m,
                });
            }
            members[label].push(index);
        }
        if let Some(class) = members.iter().position(Vec::is_empty) {
            return Err(Error::EmptyClass { class });
        }
        let counts: Vec<usize> = members.iter().map(Vec::len).collect();
        debug!(n_classes = m, ?counts, "fitting GDA");

        let mut means = Array2::<f64>::zeros((m, a));
        let mut covariances = Vec::with_capacity(m);
        for (j, idx) in members.iter().enumerate() {
            let rows = data.view().select(Axis(0), idx);
            let count = idx.len() as f64;
            let mean = rows.sum_axis(Axis(0)) / count;

            let diff = &rows - &mean;
            let scatter = diff.t().dot(&diff);
            covariances.push((&scatter + &scatter.t()) / (2.0 * count));
            means.row_mut(j).assign(&mean);
        }

        let weights = counts.iter().map(|&c| c as f64 / n as f64).collect::<Array1<f64>>();
        GdaModel::from_params(MixtureParams {
            weights,
            means,
            covariances,
        })
    }
}

/// A fitted GDA classifier. Immutable once built.
#[derive(Debug, Clone)]
pub struct GdaModel {
    params: MixtureParams,
    components: Vec<Gaussian>,
}

impl GdaModel {
    /// Build a classifier from priors, means and covariances.
    ///
    /// Fails with [`Error::NotPositiveDefinite`] naming the first class whose
    /// covariance cannot be factored.
    pub fn from_params(params: MixtureParams) -> Result<Self> {
        let params = MixtureParams::new(params.weights, params.means, params.covariances)?;
        let components = (0..params.n_components())
            .map(|j| {
                Gaussian::factor(params.mean(j), params.covariance(j)).ok_or(Error::NotPositiveDefinite {
                    component: j,
                    iteration: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { params, components })
    }

    /// Fitted priors, means and covariances.
    pub fn params(&self) -> &MixtureParams {
        &self.params
    }

    /// Number of classes.
    pub fn n_classes(&self) -> usize {
        self.params.n_components()
    }

    /// Feature dimensionality.
    pub fn dim(&self) -> usize {
        self.params.dim()
    }

    /// `ln φⱼ + ln N(x | μⱼ, Σⱼ)` for every class.
    pub fn log_scores(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if x.len() != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found: x.len(),
            });
        }
        Ok(self
            .components
            .iter()
            .zip(self.params.weights.iter())
            .map(|(g, &w)| w.ln() + g.log_pdf(x))
            .collect())
    }

    /// Most probable class for `x`.
    pub fn classify(&self, x: ArrayView1<'_, f64>) -> Result<usize> {
        let scores = self.log_scores(x)?;
        let mut best = 0;
        for (j, &s) in scores.iter().enumerate() {
            if s > scores[best] {
                best = j;
            }
        }
        Ok(best)
    }

    /// Class posteriors `P(j | x)`.
    pub fn posterior(&self, x: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        let scores = self.log_scores(x)?;
        let log_sum = logsumexp(&scores.to_vec());
        let m = scores.len();
        if !log_sum.is_finite() {
            return Ok(Array1::from_elem(m, 1.0 / m as f64));
        }
        Ok(scores.mapv(|s| (s - log_sum).exp()))
    }

    /// Classify every point of `data`.
    pub fn predict(&self, data: &Dataset) -> Result<Vec<usize>> {
        data.check_dim(self.dim())?;
        (0..data.n_points()).map(|i| self.classify(data.point(i))).collect()
    }
}

/// Decision rule of a fitted model: the class maximizing `φⱼ N(x | μⱼ, Σⱼ)`.
pub fn classify(model: &GdaModel, x: ArrayView1<'_, f64>) -> Result<usize> {
    model.classify(x)
}
