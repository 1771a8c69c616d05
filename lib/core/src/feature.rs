use serde::{Deserialize, Serialize};

/// A numeric vector attached to a catalog entry (one-hot, TF-IDF, embedding...).
///
/// Carried for display and downstream re-ranking; the recommendation engine
/// never reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FeatureVector {
    data: Vec<f32>,
}

impl FeatureVector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Number of non-zero components; one-hot and TF-IDF columns are mostly zeros.
    #[must_use]
    pub fn nnz(&self) -> usize {
        self.data.iter().filter(|x| **x != 0.0).count()
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}
