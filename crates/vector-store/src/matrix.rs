use crate::error::{Result, VectorStoreError};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// Row-per-record embedding matrix (N × D) with cached row norms.
#[derive(Debug, Clone)]
pub struct VectorMatrix {
    data: Array2<f32>,
    norms: Vec<f32>,
}

impl VectorMatrix {
    /// Every row must have exactly `dimension` entries.
    pub fn from_rows(rows: Vec<Vec<f32>>, dimension: usize) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|row| row.len() != dimension) {
            return Err(VectorStoreError::InvalidDimension {
                expected: dimension,
                actual: bad.len(),
            });
        }
        let count = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((count, dimension), flat)
            .map_err(|e| VectorStoreError::service(format!("Bad matrix shape: {e}")))?;
        let norms = data.outer_iter().map(|row| row.dot(&row).sqrt()).collect();
        Ok(Self { data, norms })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.ncols()
    }

    /// Panics if `index >= rows()`.
    #[must_use]
    pub fn row(&self, index: usize) -> ArrayView1<'_, f32> {
        self.data.row(index)
    }

    #[must_use]
    pub fn norm(&self, index: usize) -> f32 {
        self.norms.get(index).copied().unwrap_or(0.0)
    }

    pub(crate) fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_matrix_and_norms() {
        let m = VectorMatrix::from_rows(vec![vec![3.0, 4.0], vec![0.0, 0.0]], 2).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.dimension(), 2);
        assert!((m.norm(0) - 5.0).abs() < 1e-6);
        assert_eq!(m.norm(1), 0.0);
        assert_eq!(m.row(0).to_vec(), vec![3.0, 4.0]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = VectorMatrix::from_rows(vec![vec![1.0, 0.0], vec![1.0]], 2).unwrap_err();
        assert_eq!(
            err,
            VectorStoreError::InvalidDimension {
                expected: 2,
                actual: 1
            }
        );
    }
}
