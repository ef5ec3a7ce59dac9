//! Supervised classification.
//!
//! [`Gda`] fits one full-covariance Gaussian per class from labeled points and
//! returns a [`GdaModel`], an immutable value holding the priors, means and
//! covariances. [`classify`] applies the Bayes decision rule of that model to
//! a point.
//!
//! Class ids are dense integers `0..m`. [`LabelMap`] turns class names (for
//! example `"note,0.25"` or `"treble"`) into such ids and back.
//!
//! ```rust
//! use stave::classify::{Gda, LabelMap};
//! use stave::Dataset;
//! use ndarray::array;
//!
//! let data = Dataset::new(array![
//!     [0.0, 0.0], [1.0, 0.5], [0.5, 1.0], [1.0, 1.0],
//!     [9.0, 9.0], [10.0, 9.5], [9.5, 10.0], [10.0, 10.0],
//! ]).unwrap();
//! let (names, labels) = LabelMap::encode(["rest", "rest", "rest", "rest", "bar", "bar", "bar", "bar"]);
//!
//! let model = Gda::new(names.len()).fit(&data, &labels).unwrap();
//! let class = model.classify(array![9.2, 9.7].view()).unwrap();
//! assert_eq!(names.name(class), Some("bar"));
//! ```

mod gda;
mod labels;

pub use gda::{classify, Gda, GdaModel};
pub use labels::LabelMap;
