//! # stave
//!
//! Clustering and generative classification for dense feature vectors.
//!
//! - [`cluster::Kmeans`]: Lloyd's k-means with capped, tolerance-based convergence
//! - [`cluster::Gmm`]: full-covariance Gaussian mixtures fitted by EM
//! - [`classify::Gda`]: Gaussian Discriminant Analysis (one Gaussian per class)
//! - [`metrics::dunn_index`]: cluster validity of any labeling plus centroids
//!
//! All routines take a [`Dataset`] (one point per row) and return plain,
//! owned parameter values. Random initialization always draws from an
//! explicit [`rand::Rng`] passed by the caller.

pub mod classify;
pub mod cluster;
pub mod dataset;
/// Error types used across `stave`.
pub mod error;
pub mod gaussian;
pub mod metrics;
pub mod model;

pub use classify::{classify, Gda, GdaModel, LabelMap};
pub use cluster::{Clustering, Gmm, GmmFit, Kmeans, KmeansFit, SoftClustering};
pub use dataset::Dataset;
pub use error::{Error, ErrorKind, Result};
pub use gaussian::Gaussian;
pub use metrics::{accuracy, dunn_index, matched_accuracy};
pub use model::{Convergence, MixtureParams};
