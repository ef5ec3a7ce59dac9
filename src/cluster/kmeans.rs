//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS):
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids from k distinct data points
//! 2. **Assign**: Each point → nearest centroid (ties → lowest index)
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until no coordinate of any centroid moves by more than `tol`,
//!    or `max_iter` iterations have run
//!
//! WCSS never increases from one iteration to the next, so the loop settles.
//! Floating-point rounding can still make it hover, which is why the stopping
//! test is a tolerance and the loop is capped.
//!
//! # Empty Clusters
//!
//! A centroid that attracts no points has no mean. [`EmptyClusterPolicy`]
//! decides what happens: keep it where it was (default), move it onto a
//! random data point, or abort with [`Error::EmptyCluster`].
//!
//! # Initialization
//!
//! [`KmeansInit::RandomPoints`] samples k distinct points uniformly.
//! [`KmeansInit::PlusPlus`] spreads the seeds out:
//! 1. Choose first centroid uniformly at random
//! 2. Choose next centroid with probability proportional to D(x)²
//!    (squared distance to nearest existing centroid)
//!
//! Lloyd only finds a local minimum, so [`Kmeans::with_n_init`] reruns from
//! fresh seeds and keeps the lowest-WCSS result.

use super::traits::Clustering;
use super::util::{nearest_index, squared_euclidean};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::model::Convergence;
use ndarray::{Array2, ArrayView2, Axis};
use rand::seq::index;
use rand::Rng;
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How the first centroids are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KmeansInit {
    /// k distinct points drawn uniformly.
    #[default]
    RandomPoints,
    /// k-means++ D² seeding.
    PlusPlus,
}

/// What to do with a centroid whose cluster is empty after assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyClusterPolicy {
    /// Leave the centroid at its previous position.
    #[default]
    KeepCentroid,
    /// Move the centroid onto a uniformly drawn data point.
    Reseed,
    /// Abort the fit with [`Error::EmptyCluster`].
    Fail,
}

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations per run.
    max_iter: usize,
    /// Largest per-coordinate centroid move still counted as "not moving".
    tol: f64,
    init: KmeansInit,
    /// Independent runs; the lowest-inertia one is returned.
    n_init: usize,
    empty_cluster: EmptyClusterPolicy,
}

/// Result of [`Kmeans::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Final centroids, `k × a`.
    pub centroids: Array2<f64>,
    /// Nearest-centroid label of every point under `centroids`.
    pub labels: Vec<usize>,
    /// Within-cluster sum of squares under `labels` and `centroids`.
    pub inertia: f64,
    /// How the winning run stopped.
    pub convergence: Convergence,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-9,
            init: KmeansInit::default(),
            n_init: 1,
            empty_cluster: EmptyClusterPolicy::default(),
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

    /// Set the seeding strategy.
    pub fn with_init(mut self, init: KmeansInit) -> Self {
        self.init = init;
        self
    }

    /// Set the number of independent runs.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the empty-cluster policy.
    pub fn with_empty_cluster(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster = policy;
        self
    }

    /// Fit centroids and labels.
    pub fn fit<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<KmeansFit> {
        self.validate(data)?;

        let mut best: Option<KmeansFit> = None;
        for run in 0..self.n_init {
            let fit = self.fit_once(data, rng)?;
            debug!(run, inertia = fit.inertia, iterations = fit.convergence.iterations(), "k-means run finished");
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }
        best.ok_or(Error::InvalidParameter {
            name: "n_init",
            message: "must be > 0",
        })
    }

    fn validate(&self, data: &Dataset) -> Result<()> {
        let n = data.n_points();
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be > 0",
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be > 0",
            });
        }
        if !(self.tol >= 0.0 && self.tol.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and >= 0",
            });
        }
        Ok(())
    }

    fn fit_once<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<KmeansFit> {
        let x = data.view();
        let seeds = match self.init {
            KmeansInit::RandomPoints => random_indices(x.nrows(), self.k, rng),
            KmeansInit::PlusPlus => plus_plus_indices(x, self.k, rng),
        };
        let mut centroids = x.select(Axis(0), &seeds);
        let mut convergence = Convergence::NotConverged {
            iterations: 0,
            max_change: f64::INFINITY,
        };

        for iteration in 1..=self.max_iter {
            let labels = Self::assign_labels(x, centroids.view());
            let (mut new_centroids, counts) = accumulate(x, &labels, self.k);

            self.fill_empty(x, centroids.view(), &mut new_centroids, &counts, iteration, rng)?;

            let shift = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            centroids = new_centroids;
            debug!(iteration, shift, "k-means iteration");

            if shift <= self.tol {
                convergence = Convergence::Converged { iterations: iteration };
                break;
            }
            convergence = Convergence::NotConverged {
                iterations: iteration,
                max_change: shift,
            };
        }

        if let Convergence::NotConverged { iterations, max_change } = convergence {
            warn!(iterations, max_change, "k-means hit the iteration cap before converging");
        }

        let labels = Self::assign_labels(x, centroids.view());
        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &l)| squared_euclidean(x.row(i), centroids.row(l)))
            .sum();

        Ok(KmeansFit {
            centroids,
            labels,
            inertia,
            convergence,
        })
    }

    /// Apply the empty-cluster policy to every cluster with no members.
    fn fill_empty<R: Rng + ?Sized>(
        &self,
        x: ArrayView2<'_, f64>,
        previous: ArrayView2<'_, f64>,
        centroids: &mut Array2<f64>,
        counts: &[usize],
        iteration: usize,
        rng: &mut R,
    ) -> Result<()> {
        for (c, &count) in counts.iter().enumerate() {
            if count > 0 {
                continue;
            }
            match self.empty_cluster {
                EmptyClusterPolicy::KeepCentroid => {
                    debug!(iteration, cluster = c, "empty cluster, keeping centroid");
                    centroids.row_mut(c).assign(&previous.row(c));
                }
                EmptyClusterPolicy::Reseed => {
                    let idx = rng.random_range(0..x.nrows());
                    debug!(iteration, cluster = c, point = idx, "empty cluster, reseeding");
                    centroids.row_mut(c).assign(&x.row(idx));
                }
                EmptyClusterPolicy::Fail => {
                    return Err(Error::EmptyCluster { cluster: c, iteration });
                }
            }
        }
        Ok(())
    }

    /// Label every row of `data` with its nearest centroid.
    pub fn assign_labels(data: ArrayView2<'_, f64>, centroids: ArrayView2<'_, f64>) -> Vec<usize> {
        #[cfg(feature = "parallel")]
        {
            (0..data.nrows())
                .into_par_iter()
                .map(|i| nearest_index(data.row(i), centroids))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            data.rows()
                .into_iter()
                .map(|point| nearest_index(point, centroids))
                .collect()
        }
    }

    /// Recompute each centroid as the mean of its members.
    ///
    /// Clusters with no members keep their row from `previous`.
    pub fn update_centroids(
        data: ArrayView2<'_, f64>,
        labels: &[usize],
        previous: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        let (mut centroids, counts) = accumulate(data, labels, previous.nrows());
        for (c, &count) in counts.iter().enumerate() {
            if count == 0 {
                centroids.row_mut(c).assign(&previous.row(c));
            }
        }
        centroids
    }
}

impl Clustering for Kmeans {
    fn fit_predict<R: Rng + ?Sized>(&self, data: &Dataset, rng: &mut R) -> Result<Vec<usize>> {
        Ok(self.fit(data, rng)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Per-cluster means (zero rows for empty clusters) and member counts.
fn accumulate(data: ArrayView2<'_, f64>, labels: &[usize], k: usize) -> (Array2<f64>, Vec<usize>) {
    let mut sums = Array2::zeros((k, data.ncols()));
    let mut counts = vec![0usize; k];
    for (point, &l) in data.rows().into_iter().zip(labels) {
        let mut row = sums.row_mut(l);
        row += &point;
        counts[l] += 1;
    }
    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mut row = sums.row_mut(c);
            row /= count as f64;
        }
    }
    (sums, counts)
}

/// `k` distinct indices in `0..n`, uniformly.
pub(crate) fn random_indices<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    index::sample(rng, n, k).into_vec()
}

/// `k` indices chosen by k-means++ D² sampling.
pub(crate) fn plus_plus_indices<R: Rng + ?Sized>(data: ArrayView2<'_, f64>, k: usize, rng: &mut R) -> Vec<usize> {
    let n = data.nrows();
    let mut chosen = Vec::with_capacity(k);
    chosen.push(rng.random_range(0..n));

    // Squared distance of every point to its nearest chosen seed.
    let mut distances: Vec<f64> = data
        .rows()
        .into_iter()
        .map(|p| squared_euclidean(p, data.row(chosen[0])))
        .collect();

    while chosen.len() < k {
        let total: f64 = distances.iter().sum();
        let selected = if total > 0.0 {
            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = None;
            let mut last_positive = 0;
            for (j, &d) in distances.iter().enumerate() {
                if d > 0.0 {
                    last_positive = j;
                }
                cumsum += d;
                if d > 0.0 && cumsum >= threshold {
                    selected = Some(j);
                    break;
                }
            }
            selected.unwrap_or(last_positive)
        } else {
            // Everything left coincides with a seed: pick any unused index.
            let unused: Vec<usize> = (0..n).filter(|i| !chosen.contains(i)).collect();
            unused[rng.random_range(0..unused.len())]
        };

        chosen.push(selected);
        for (j, d) in distances.iter_mut().enumerate() {
            *d = d.min(squared_euclidean(data.row(j), data.row(selected)));
        }
    }

    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::prelude::*;

    fn two_pairs() -> Dataset {
        Dataset::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ])
        .unwrap()
    }

    #[test]
    fn test_kmeans_basic() {
        let data = two_pairs();
        let mut rng = StdRng::seed_from_u64(42);
        let fit = Kmeans::new(2)
            .with_init(KmeansInit::PlusPlus)
            .fit(&data, &mut rng)
            .unwrap();

        // Points 0,1 should be in same cluster, points 2,3 in another
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[2], fit.labels[3]);
        assert_ne!(fit.labels[0], fit.labels[2]);
        assert!(fit.convergence.converged());
    }

    #[test]
    fn test_kmeans_all_points_assigned() {
        // Property: every point must be assigned to exactly one cluster
        let rows: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64 * 0.1, (i % 5) as f64]).collect();
        let data = Dataset::from_rows(&rows).unwrap();

        let mut rng = StdRng::seed_from_u64(123);
        let labels = Kmeans::new(5).fit_predict(&data, &mut rng).unwrap();

        assert_eq!(labels.len(), data.n_points());
        for &label in &labels {
            assert!(label < 5, "label {} out of range", label);
        }
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        // Edge case: k = n (each point its own cluster)
        let data = Dataset::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let fit = Kmeans::new(3).fit(&data, &mut rng).unwrap();

        assert_eq!(fit.convergence, Convergence::Converged { iterations: 1 });
        let unique: std::collections::HashSet<_> = fit.labels.iter().collect();
        assert_eq!(unique.len(), 3);
        for (i, &l) in fit.labels.iter().enumerate() {
            assert_eq!(fit.centroids.row(l), data.point(i));
        }
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let data = two_pairs();
        let fit1 = Kmeans::new(2).fit(&data, &mut StdRng::seed_from_u64(42)).unwrap();
        let fit2 = Kmeans::new(2).fit(&data, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(fit1, fit2, "same seed should give same result");
    }

    #[test]
    fn test_kmeans_scaling_invariant() {
        // Metamorphic: uniform scaling shouldn't change cluster assignments
        let data = two_pairs();
        let scaled = Dataset::new(data.view().mapv(|x| x * 100.0)).unwrap();

        let model = Kmeans::new(2).with_init(KmeansInit::PlusPlus).with_n_init(3);
        let labels1 = model.fit_predict(&data, &mut StdRng::seed_from_u64(42)).unwrap();
        let labels2 = model.fit_predict(&scaled, &mut StdRng::seed_from_u64(42)).unwrap();

        // Same structure (labels may be permuted)
        assert_eq!(labels1[0], labels1[1]);
        assert_eq!(labels2[0], labels2[1]);
        assert_eq!(labels1[2], labels1[3]);
        assert_eq!(labels2[2], labels2[3]);
        assert_ne!(labels1[0], labels1[2]);
        assert_ne!(labels2[0], labels2[2]);
    }

    #[test]
    fn test_kmeans_labels_are_nearest_centroid() {
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i * 7 % 13) as f64, (i * 3 % 11) as f64])
            .collect();
        let data = Dataset::from_rows(&rows).unwrap();
        let fit = Kmeans::new(4).fit(&data, &mut StdRng::seed_from_u64(9)).unwrap();
        for (i, &l) in fit.labels.iter().enumerate() {
            assert_eq!(l, nearest_index(data.point(i), fit.centroids.view()));
        }
    }

    #[test]
    fn test_kmeans_fixed_point() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![(i % 3) as f64 * 10.0 + (i % 5) as f64 * 0.1, (i % 7) as f64 * 0.1])
            .collect();
        let data = Dataset::from_rows(&rows).unwrap();
        let fit = Kmeans::new(3).fit(&data, &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(fit.convergence.converged());

        let relabeled = Kmeans::assign_labels(data.view(), fit.centroids.view());
        assert_eq!(relabeled, fit.labels);
        let moved = Kmeans::update_centroids(data.view(), &relabeled, fit.centroids.view());
        for (a, b) in moved.iter().zip(fit.centroids.iter()) {
            assert!((a - b).abs() <= 1e-9);
        }
    }

    #[test]
    fn test_kmeans_iteration_cap_reported() {
        let data = Dataset::from_rows(&[vec![0.0], vec![1.0], vec![10.0], vec![11.0]]).unwrap();
        let fit = Kmeans::new(2)
            .with_max_iter(1)
            .fit(&data, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert!(matches!(
            fit.convergence,
            Convergence::NotConverged { iterations: 1, max_change } if max_change > 0.0
        ));
        // Labels still describe the returned centroids.
        assert_eq!(fit.labels, Kmeans::assign_labels(data.view(), fit.centroids.view()));
    }

    #[test]
    fn test_kmeans_empty_cluster_policies() {
        // Identical points: the second centroid never wins a tie.
        let data = Dataset::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();

        let err = Kmeans::new(2)
            .with_empty_cluster(EmptyClusterPolicy::Fail)
            .fit(&data, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert_eq!(err, Error::EmptyCluster { cluster: 1, iteration: 1 });

        for policy in [EmptyClusterPolicy::KeepCentroid, EmptyClusterPolicy::Reseed] {
            let fit = Kmeans::new(2)
                .with_empty_cluster(policy)
                .fit(&data, &mut StdRng::seed_from_u64(0))
                .unwrap();
            assert_eq!(fit.labels, vec![0, 0, 0]);
            assert_eq!(fit.centroids, array![[1.0, 1.0], [1.0, 1.0]]);
            assert!(fit.convergence.converged());
        }
    }

    #[test]
    fn test_reseed_moves_empty_centroid_onto_a_point() {
        let x = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let previous = array![[1.0, 0.0], [100.0, 100.0]];
        let counts = [3, 0];
        let seeded = Kmeans::new(2).with_empty_cluster(EmptyClusterPolicy::Reseed);
        let kept = Kmeans::new(2);

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let mut centroids = array![[1.0, 0.0], [0.0, 0.0]];
            seeded
                .fill_empty(x.view(), previous.view(), &mut centroids, &counts, 1, &mut rng)
                .unwrap();
            assert_eq!(centroids.row(0), previous.row(0));
            assert_ne!(centroids.row(1), previous.row(1));
            assert!(x.rows().into_iter().any(|p| p == centroids.row(1)));

            let mut centroids = array![[1.0, 0.0], [0.0, 0.0]];
            kept.fill_empty(x.view(), previous.view(), &mut centroids, &counts, 1, &mut rng)
                .unwrap();
            assert_eq!(centroids.row(1), previous.row(1));
        }
    }

    #[test]
    fn test_update_keeps_empty_centroid() {
        let data = array![[0.0, 0.0], [2.0, 2.0]];
        let previous = array![[5.0, 5.0], [9.0, 9.0]];
        let updated = Kmeans::update_centroids(data.view(), &[0, 0], previous.view());
        assert_eq!(updated, array![[1.0, 1.0], [9.0, 9.0]]);
    }

    #[test]
    fn test_plus_plus_picks_distinct_points() {
        let data = array![[0.0], [0.0], [5.0], [9.0]];
        let mut rng = StdRng::seed_from_u64(11);
        let idx = plus_plus_indices(data.view(), 4, &mut rng);
        let unique: std::collections::HashSet<_> = idx.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_kmeans_invalid_k() {
        let data = Dataset::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            Kmeans::new(5).fit(&data, &mut rng).unwrap_err(),
            Error::InvalidClusterCount {
                requested: 5,
                n_items: 2
            }
        );
        assert_eq!(
            Kmeans::new(0).fit(&data, &mut rng).unwrap_err().kind(),
            crate::error::ErrorKind::InvalidArgument
        );
        assert!(Kmeans::new(1).with_max_iter(0).fit(&data, &mut rng).is_err());
    }
}
