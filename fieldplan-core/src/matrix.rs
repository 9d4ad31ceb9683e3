//! Dense square cost matrices.

use thiserror::Error;

/// Errors returned when building a [`DistanceMatrix`] from rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// A row's length differed from the number of rows.
    #[error("row {row} has {len} entries; expected {expected}")]
    NotSquare {
        /// Offending row.
        row: usize,
        /// Entries in that row.
        len: usize,
        /// Number of rows.
        expected: usize,
    },
}

/// A square matrix stored row-major.
///
/// # Examples
///
/// ```
/// use fieldplan_core::DistanceMatrix;
///
/// let matrix = DistanceMatrix::from_fn(3, |from, to| from.abs_diff(to) as u64);
/// assert_eq!(matrix.get(0, 2), Some(2));
/// assert_eq!(matrix.get(3, 0), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix<T> {
    size: usize,
    values: Vec<T>,
}

impl<T: Copy> DistanceMatrix<T> {
    /// Fill a `size × size` matrix from a cost function.
    pub fn from_fn(size: usize, mut cost: impl FnMut(usize, usize) -> T) -> Self {
        let values = (0..size)
            .flat_map(|from| (0..size).map(move |to| (from, to)))
            .map(|(from, to)| cost(from, to))
            .collect();
        Self { size, values }
    }

    /// Build from nested rows, checking that the result is square.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        if let Some((row, len)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|(_, len)| *len != size)
        {
            return Err(MatrixError::NotSquare {
                row,
                len,
                expected: size,
            });
        }
        Ok(Self {
            size,
            values: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows (and columns).
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Cost of travelling `from` → `to`.
    #[must_use]
    pub fn get(&self, from: usize, to: usize) -> Option<T> {
        if from >= self.size || to >= self.size {
            return None;
        }
        self.values.get(from * self.size + to).copied()
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.values.chunks(self.size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn ragged_rows_are_rejected() {
        let result = DistanceMatrix::from_rows(vec![vec![0_u64, 1], vec![1]]);
        assert_eq!(
            result,
            Err(MatrixError::NotSquare {
                row: 1,
                len: 1,
                expected: 2
            })
        );
    }

    #[rstest]
    fn rows_round_trip() {
        let rows = vec![vec![0_u64, 5], vec![7, 0]];
        let matrix = DistanceMatrix::from_rows(rows.clone()).expect("square");
        let collected: Vec<Vec<u64>> = matrix.rows().map(<[u64]>::to_vec).collect();
        assert_eq!(collected, rows);
        assert_eq!(matrix.get(1, 0), Some(7));
    }
}
