//! Clustering algorithms for grouping unlabeled points.
//!
//! ## Hard vs Soft Clustering
//!
//! **Hard clustering** assigns each point to exactly one cluster. Simple, but
//! loses information when a point genuinely sits between groups.
//!
//! **Soft clustering** gives each point a probability distribution over
//! clusters. A glyph halfway between a quarter note and a half note can be 55%
//! one and 45% the other instead of being forced into a single bin.
//!
//! ## Algorithms
//!
//! ### K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance
//!
//! ### Gaussian Mixture Model (GMM)
//!
//! Models data as a mixture of m Gaussian distributions:
//!
//! ```text
//! P(x) = Σ φ_k × N(x | μ_k, Σ_k)
//! ```
//!
//! fitted by Expectation-Maximization:
//! 1. **E-step**: Compute P(component k | point x) for each point
//! 2. **M-step**: Update φ, μ, Σ to maximize likelihood
//! 3. Repeat until the parameters stop moving
//!
//! **When to use**: When you want soft assignments, or when clusters have
//! different shapes/sizes (unlike K-means which assumes spherical clusters).
//!
//! ## Randomness
//!
//! Both engines draw their initial centroids/means from a caller-supplied
//! [`rand::Rng`]. Seed it for reproducible fits.
//!
//! ## Usage
//!
//! ```rust
//! use stave::cluster::{Clustering, Gmm, GmmInit, Kmeans, KmeansInit};
//! use stave::Dataset;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let data = Dataset::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.3],
//!     vec![0.4, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.4],
//!     vec![10.3, 10.1],
//! ]).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // Hard clustering with K-means
//! let fit = Kmeans::new(2).with_init(KmeansInit::PlusPlus).fit(&data, &mut rng).unwrap();
//! assert_eq!(fit.labels[0], fit.labels[1]);  // First points together
//! assert_ne!(fit.labels[0], fit.labels[3]);  // Separate from the rest
//!
//! // Soft clustering with GMM
//! let fit = Gmm::new(2)
//!     .with_init(GmmInit::PlusPlus)
//!     .with_reg_covar(1e-6)
//!     .fit(&data, &mut rng)
//!     .unwrap();
//! // fit.responsibilities[[k, i]] = P(point i belongs to component k)
//! assert_eq!(fit.responsibilities.dim(), (2, 6));
//! ```

mod gmm;
mod kmeans;
mod traits;
pub mod util;

pub use gmm::{Gmm, GmmFit, GmmInit};
pub use kmeans::{EmptyClusterPolicy, Kmeans, KmeansFit, KmeansInit};
pub use traits::{Clustering, SoftClustering};
