//! Distance and mean helpers shared by the clustering engines.

use ndarray::{Array1, ArrayView1, ArrayView2};

/// Squared Euclidean distance.
#[inline]
pub fn squared_euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Euclidean distance.
#[inline]
pub fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Index of the row of `centroids` closest to `point`.
///
/// Ties go to the lowest index. Returns 0 when `centroids` has no rows.
pub fn nearest_index(point: ArrayView1<'_, f64>, centroids: ArrayView2<'_, f64>) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (k, c) in centroids.rows().into_iter().enumerate() {
        let dist = squared_euclidean(point, c);
        if dist < best_dist {
            best_dist = dist;
            best = k;
        }
    }
    best
}

/// Arithmetic mean of the selected rows, `None` if `indices` is empty.
pub fn mean_of(data: ArrayView2<'_, f64>, indices: &[usize]) -> Option<Array1<f64>> {
    if indices.is_empty() {
        return None;
    }
    let mut sum = Array1::zeros(data.ncols());
    for &i in indices {
        sum += &data.row(i);
    }
    Some(sum / indices.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_distances() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_eq!(squared_euclidean(a.view(), b.view()), 25.0);
        assert_eq!(euclidean(a.view(), b.view()), 5.0);
    }

    #[test]
    fn test_nearest_breaks_ties_low() {
        let centroids = array![[-1.0, 0.0], [1.0, 0.0], [0.0, 5.0]];
        assert_eq!(nearest_index(array![0.0, 0.0].view(), centroids.view()), 0);
        assert_eq!(nearest_index(array![0.9, 0.0].view(), centroids.view()), 1);
        assert_eq!(nearest_index(array![0.0, 4.0].view(), centroids.view()), 2);
    }

    #[test]
    fn test_mean_of() {
        let data = array![[0.0, 0.0], [2.0, 4.0], [100.0, 100.0]];
        assert_eq!(mean_of(data.view(), &[0, 1]), Some(array![1.0, 2.0]));
        assert_eq!(mean_of(data.view(), &[]), None);
    }
}
