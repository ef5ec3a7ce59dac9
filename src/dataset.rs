//! Point sets.
//!
//! A [`Dataset`] is `n` points in `R^a`, stored **one point per row** as an
//! `n × a` matrix. Every fitting routine in the crate takes this layout, and
//! every parameter it returns (means, centroids) is laid out the same way:
//! one row per component.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Validated, non-empty collection of equal-length, finite points.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    points: Array2<f64>,
}

impl Dataset {
    /// Wrap an `n × a` matrix (rows are points).
    pub fn new(points: Array2<f64>) -> Result<Self> {
        if points.nrows() == 0 || points.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        for (i, row) in points.rows().into_iter().enumerate() {
            if row.iter().any(|v| !v.is_finite()) {
                return Err(Error::NonFiniteInput { index: i });
            }
        }
        Ok(Self { points })
    }

    /// Build from row vectors.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let first = rows.first().ok_or(Error::EmptyInput)?;
        let d = first.len();

        let mut flat: Vec<f64> = Vec::with_capacity(rows.len() * d);
        for point in rows {
            if point.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: point.len(),
                });
            }
            flat.extend(point);
        }
        let points = Array2::from_shape_vec((rows.len(), d), flat).map_err(|_| Error::EmptyInput)?;
        Self::new(points)
    }

    /// Number of points (`n`).
    pub fn n_points(&self) -> usize {
        self.points.nrows()
    }

    /// Feature dimensionality (`a`).
    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    /// The `i`-th point.
    ///
    /// # Panics
    ///
    /// If `i >= n_points()`.
    pub fn point(&self, i: usize) -> ArrayView1<'_, f64> {
        self.points.row(i)
    }

    /// The whole `n × a` matrix.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    /// Unwrap into the underlying matrix.
    pub fn into_inner(self) -> Array2<f64> {
        self.points
    }

    /// Reject a point whose length is not `dim()`.
    pub(crate) fn check_dim(&self, found: usize) -> Result<()> {
        if found != self.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.dim(),
                found,
            });
        }
        Ok(())
    }
}

impl TryFrom<Array2<f64>> for Dataset {
    type Error = Error;

    fn try_from(points: Array2<f64>) -> Result<Self> {
        Self::new(points)
    }
}
