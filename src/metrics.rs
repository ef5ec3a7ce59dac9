//! Clustering evaluation metrics.
//!
//! | Metric | Range | Best | Needs ground truth |
//! |--------|-------|------|--------------------|
//! | [`dunn_index`] | [0, ∞] | higher | no |
//! | [`accuracy`] | [0, 1] | 1 | yes, same label ids |
//! | [`matched_accuracy`] | [0, 1] | 1 | yes, ids matched by best permutation |
//!
//! # Dunn Index
//!
//! Internal validity: compares how far apart clusters are with how wide they
//! are.
//!
//! ```text
//! D = min_{i≠j} ||μᵢ - μⱼ|| / max_k max_{x,y ∈ Cₖ} ||x - y||
//! ```
//!
//! Large values mean tight, well separated clusters. A cluster with fewer than
//! two members has diameter 0. When every cluster has diameter 0 the index is
//! +∞, unless two centroids also coincide, in which case it is 0.
//!
//! # Example
//!
//! ```rust
//! use stave::metrics::{dunn_index, matched_accuracy};
//! use stave::Dataset;
//! use ndarray::array;
//!
//! let data = Dataset::new(array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]]).unwrap();
//! let centroids = array![[0.0, 0.5], [10.0, 0.5]];
//! let labels = [0, 0, 1, 1];
//!
//! let d = dunn_index(&data, &labels, centroids.view()).unwrap();
//! assert!((d - 10.0).abs() < 1e-12);
//!
//! // Cluster ids 0/1 swapped relative to the classes: still a perfect match.
//! assert_eq!(matched_accuracy(&[1, 1, 0, 0], &labels, 2).unwrap(), 1.0);
//! ```
//!
//! # References
//!
//! - Dunn (1973). "A Fuzzy Relative of the ISODATA Process and Its Use in
//!   Detecting Compact Well-Separated Clusters"

use crate::cluster::util::euclidean;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use ndarray::ArrayView2;

/// Largest class count [`matched_accuracy`] will enumerate permutations for.
pub const MAX_MATCHED_CLASSES: usize = 9;

/// Dunn index of a labeling against its centroids.
///
/// `centroids` is `m × a`; every label must be below `m`.
///
/// # Errors
///
/// - fewer than 2 centroids
/// - `labels.len() != data.n_points()`
/// - centroid dimension differs from the data
/// - a label `>= m`
pub fn dunn_index(data: &Dataset, labels: &[usize], centroids: ArrayView2<'_, f64>) -> Result<f64> {
    let m = centroids.nrows();
    if m < 2 {
        return Err(Error::InvalidClusterCount {
            requested: m,
            n_items: data.n_points(),
        });
    }
    if labels.len() != data.n_points() {
        return Err(Error::LengthMismatch {
            expected: data.n_points(),
            found: labels.len(),
        });
    }
    data.check_dim(centroids.ncols())?;

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

    let mut min_sep = f64::INFINITY;
    for i in 0..m {
        for j in (i + 1)..m {
            min_sep = min_sep.min(euclidean(centroids.row(i), centroids.row(j)));
        }
    }

    let mut max_diam: f64 = 0.0;
    for cluster in &members {
        for (a, &p) in cluster.iter().enumerate() {
            for &q in &cluster[a + 1..] {
                max_diam = max_diam.max(euclidean(data.point(p), data.point(q)));
            }
        }
    }

    if max_diam == 0.0 {
        return Ok(if min_sep > 0.0 { f64::INFINITY } else { 0.0 });
    }
    Ok(min_sep / max_diam)
}

/// Fraction of positions where `pred` equals `truth`.
pub fn accuracy(truth: &[usize], pred: &[usize]) -> Result<f64> {
    if truth.len() != pred.len() {
        return Err(Error::LengthMismatch {
            expected: truth.len(),
            found: pred.len(),
        });
    }
    if truth.is_empty() {
        return Err(Error::EmptyInput);
    }
    let correct = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Accuracy after relabeling `pred` by the cluster→class permutation that
/// maximizes it.
///
/// Unsupervised labels carry arbitrary ids, so `[1, 1, 0, 0]` against
/// `[0, 0, 1, 1]` scores 1.0. All `m!` permutations are tried, so `m` is
/// capped at [`MAX_MATCHED_CLASSES`].
pub fn matched_accuracy(truth: &[usize], pred: &[usize], m: usize) -> Result<f64> {
    if truth.len() != pred.len() {
        return Err(Error::LengthMismatch {
            expected: truth.len(),
            found: pred.len(),
        });
    }
    if truth.is_empty() {
        return Err(Error::EmptyInput);
    }
    if m == 0 || m > MAX_MATCHED_CLASSES {
        return Err(Error::InvalidParameter {
            name: "m",
            message: "must be in 1..=9",
        });
    }
    for (index, &label) in truth.iter().chain(pred).enumerate() {
        if label >= m {
            return Err(Error::LabelOutOfRange {
                index: index % truth.len(),
                label,
                n_classes: m,
            });
        }
    }

    // hits[c][t]: points with cluster c and class t
    let mut hits = vec![vec![0usize; m]; m];
    for (&t, &c) in truth.iter().zip(pred) {
        hits[c][t] += 1;
    }

    let mut perm: Vec<usize> = (0..m).collect();
    let score = |perm: &[usize]| -> usize { (0..m).map(|c| hits[c][perm[c]]).sum() };
    let mut best = score(&perm);

    // Heap's algorithm, iterative form.
    let mut stack = vec![0usize; m];
    let mut i = 1;
    while i < m {
        if stack[i] < i {
            if i % 2 == 0 {
                perm.swap(0, i);
            } else {
                perm.swap(stack[i], i);
            }
            best = best.max(score(&perm));
            stack[i] += 1;
            i = 1;
        } else {
            stack[i] = 0;
            i += 1;
        }
    }

    Ok(best as f64 / truth.len() as f64)
}
