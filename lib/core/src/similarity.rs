use crate::{Error, Result};

/// Square N×N score matrix, row-major in a single buffer.
///
/// Cell `(i, j)` is the similarity of catalog row `i` to catalog row `j`.
/// Scores are opaque: the index neither assumes symmetry nor that the
/// diagonal holds the row maximum.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    dim: usize,
    scores: Vec<f32>,
}

impl SimilarityIndex {
    /// Build from nested rows. Fails with [`Error::DataFormat`] when the
    /// matrix is not square or contains NaN.
    pub fn load(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.len();

        // shape and values are checked before the dim*dim buffer is reserved
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(Error::DataFormat(format!(
                    "similarity matrix is not square: row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            if let Some(j) = row.iter().position(|s| s.is_nan()) {
                return Err(Error::DataFormat(format!(
                    "similarity matrix has NaN at ({}, {})",
                    i, j
                )));
            }
        }

        let len = dim.checked_mul(dim).ok_or_else(|| {
            Error::DataFormat(format!("similarity matrix of {} rows is too large", dim))
        })?;
        let mut scores = Vec::with_capacity(len);
        for row in rows {
            scores.extend_from_slice(&row);
        }

        Ok(Self { dim, scores })
    }

    /// Build from a flat row-major buffer of `dim * dim` scores
    pub fn from_flat(dim: usize, scores: Vec<f32>) -> Result<Self> {
        if dim.checked_mul(dim) != Some(scores.len()) {
            return Err(Error::DataFormat(format!(
                "expected {}x{} scores, got {}",
                dim,
                dim,
                scores.len()
            )));
        }
        if let Some(pos) = scores.iter().position(|s| s.is_nan()) {
            return Err(Error::DataFormat(format!(
                "similarity matrix has NaN at ({}, {})",
                pos / dim,
                pos % dim
            )));
        }
        Ok(Self { dim, scores })
    }

    #[inline]
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn row(&self, row: usize) -> Result<RowView<'_>> {
        if row >= self.dim {
            return Err(Error::IndexOutOfRange {
                index: row,
                len: self.dim,
            });
        }
        let start = row * self.dim;
        Ok(RowView {
            scores: &self.scores[start..start + self.dim],
        })
    }

    pub fn score(&self, row: usize, column: usize) -> Result<f32> {
        let view = self.row(row)?;
        view.scores
            .get(column)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: column,
                len: self.dim,
            })
    }

    /// The one check that ties the matrix to the catalog it was built for
    pub fn validate_alignment(&self, catalog_size: usize) -> Result<()> {
        if self.dim != catalog_size {
            return Err(Error::Integrity(format!(
                "similarity matrix dimension {} does not match catalog size {}",
                self.dim, catalog_size
            )));
        }
        Ok(())
    }
}

/// Borrowed view of one matrix row
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    scores: &'a [f32],
}

impl<'a> RowView<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [f32] {
        self.scores
    }

    /// `(column_index, score)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + 'a {
        self.scores.iter().copied().enumerate()
    }
}

impl<'a> From<&'a [f32]> for RowView<'a> {
    fn from(scores: &'a [f32]) -> Self {
        Self { scores }
    }
}
