use thiserror::Error;

/// Result alias for `stave`.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before any computation runs.
    InvalidArgument,
    /// Detected mid-computation; the fit is abandoned.
    NumericalInstability,
}

/// Errors returned by the fitting, classification and scoring routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Vector dimension mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Two inputs that must pair up index-by-index have different lengths.
    #[error("length mismatch: expected {expected} entries, found {found}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid number of clusters or components requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate in point {index}")]
    NonFiniteInput {
        /// Offending point.
        index: usize,
    },

    /// A label falls outside `[0, n_classes)`.
    #[error("label {label} of point {index} is outside 0..{n_classes}")]
    LabelOutOfRange {
        /// Offending point.
        index: usize,
        /// Label found.
        label: usize,
        /// Number of classes.
        n_classes: usize,
    },

    /// A class id in range has no members.
    #[error("class {class} has no labeled points")]
    EmptyClass {
        /// Empty class.
        class: usize,
    },

    /// A covariance could not be Cholesky-factored.
    #[error("covariance of component {component} is not positive-definite{}", at_iteration(.iteration))]
    NotPositiveDefinite {
        /// Offending component or class.
        component: usize,
        /// EM iteration (1-based), `None` outside iterative fitting.
        iteration: Option<usize>,
    },

    /// The covariance of a standalone density could not be Cholesky-factored.
    #[error("covariance is not positive-definite")]
    SingularCovariance,

    /// A mixture component lost all responsibility mass.
    #[error("component {component} collapsed (mass {mass:e}) at iteration {iteration}")]
    CollapsedComponent {
        /// Offending component.
        component: usize,
        /// EM iteration (1-based).
        iteration: usize,
        /// Total responsibility mass of the component.
        mass: f64,
    },

    /// A k-means cluster has no members and the policy forbids recovering.
    #[error("cluster {cluster} has no members at iteration {iteration}")]
    EmptyCluster {
        /// Offending cluster.
        cluster: usize,
        /// Lloyd iteration (1-based).
        iteration: usize,
    },
}

fn at_iteration(iteration: &Option<usize>) -> String {
    match iteration {
        Some(i) => format!(" at iteration {i}"),
        None => String::new(),
    }
}

impl Error {
    /// Which side of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotPositiveDefinite { .. }
            | Error::SingularCovariance
            | Error::CollapsedComponent { .. }
            | Error::EmptyCluster { .. } => ErrorKind::NumericalInstability,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
