//! Recommendation engine
//!
//! Turns one row of the similarity matrix into a bounded, ordered list of
//! recommendations: resolve the id, gather every other column of its row,
//! rank by score, apply the threshold, truncate, map back to catalog entries.

use crate::similarity::RowView;
use crate::{CatalogStore, Error, ItemId, Result, SimilarityIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.5;

/// A single recommended item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub name: String,
    pub score: f32,
}

/// Query parameters for [`RecommendationEngine::recommend_with`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendOptions {
    pub top_n: usize,
    pub min_similarity: f32,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

impl RecommendOptions {
    pub fn new(top_n: usize, min_similarity: f32) -> Self {
        Self {
            top_n,
            min_similarity,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::InvalidQuery("top_n must be at least 1".to_string()));
        }
        if !self.min_similarity.is_finite() {
            return Err(Error::InvalidQuery(format!(
                "min_similarity must be finite, got {}",
                self.min_similarity
            )));
        }
        Ok(())
    }
}

/// Rank one matrix row.
///
/// `self_row` is dropped by index, whatever its score. Candidates are sorted
/// by score descending with a stable sort, so equal scores stay in ascending
/// column order. The threshold is applied to the ranked list and the first
/// `top_n` survivors are returned as `(column, score)`.
pub fn rank_row(
    row: RowView<'_>,
    self_row: usize,
    top_n: usize,
    min_similarity: f32,
) -> Vec<(usize, f32)> {
    let mut candidates: Vec<(usize, f32)> =
        row.iter().filter(|(column, _)| *column != self_row).collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    candidates
        .into_iter()
        .filter(|(_, score)| *score >= min_similarity)
        .take(top_n)
        .collect()
}

/// Query engine over an aligned catalog and similarity matrix.
///
/// Holds only immutable state, so one instance can be shared across threads
/// behind an `Arc` and queried without locking.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    catalog: Arc<CatalogStore>,
    index: Arc<SimilarityIndex>,
}

impl RecommendationEngine {
    /// Fails with [`Error::Integrity`] if the matrix dimension differs from the catalog size.
    pub fn new(catalog: Arc<CatalogStore>, index: Arc<SimilarityIndex>) -> Result<Self> {
        index.validate_alignment(catalog.len())?;
        Ok(Self { catalog, index })
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    /// Top `top_n` items most similar to `item_id` with score `>= min_similarity`.
    ///
    /// Returns [`Error::UnknownItem`] for an id the catalog doesn't contain and
    /// [`Error::Integrity`] if the matrix row can't cover the catalog. An empty
    /// vector means the item exists but nothing passed the threshold.
    pub fn recommend(
        &self,
        item_id: ItemId,
        top_n: usize,
        min_similarity: f32,
    ) -> Result<Vec<Recommendation>> {
        RecommendOptions::new(top_n, min_similarity).validate()?;

        let row_index = self
            .catalog
            .resolve(item_id)
            .ok_or(Error::UnknownItem(item_id))?;

        if row_index >= self.index.dimension() {
            return Err(Error::Integrity(format!(
                "item {} resolves to row {} but the matrix has {} rows",
                item_id,
                row_index,
                self.index.dimension()
            )));
        }

        let row = self.index.row(row_index)?;
        if row.len() != self.catalog.len() {
            return Err(Error::Integrity(format!(
                "matrix row {} has {} scores, catalog has {} items",
                row_index,
                row.len(),
                self.catalog.len()
            )));
        }

        let ranked = rank_row(row, row_index, top_n, min_similarity);
        debug!(item_id, row_index, results = ranked.len(), "recommend");

        ranked
            .into_iter()
            .map(|(column, score)| {
                let entry = self.catalog.entry_at(column)?;
                Ok(Recommendation {
                    item_id: entry.item_id,
                    name: entry.name.clone(),
                    score,
                })
            })
            .collect()
    }

    pub fn recommend_with(
        &self,
        item_id: ItemId,
        options: &RecommendOptions,
    ) -> Result<Vec<Recommendation>> {
        self.recommend(item_id, options.top_n, options.min_similarity)
    }

    /// Run many queries in parallel; results line up with `item_ids`.
    pub fn recommend_batch(
        &self,
        item_ids: &[ItemId],
        options: &RecommendOptions,
    ) -> Vec<Result<Vec<Recommendation>>> {
        item_ids
            .par_iter()
            .map(|&item_id| self.recommend_with(item_id, options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogEntry;
    use rand::prelude::*;

    fn engine(entries: &[(ItemId, &str)], rows: Vec<Vec<f32>>) -> RecommendationEngine {
        let catalog = CatalogStore::from_entries(
            entries
                .iter()
                .map(|(id, name)| CatalogEntry::new(*id, *name))
                .collect(),
        )
        .unwrap();
        let index = SimilarityIndex::load(rows).unwrap();
        RecommendationEngine::new(Arc::new(catalog), Arc::new(index)).unwrap()
    }

    fn abc() -> RecommendationEngine {
        engine(
            &[(1, "A"), (2, "B"), (3, "C")],
            vec![
                vec![1.0, 0.9, 0.2],
                vec![0.9, 1.0, 0.6],
                vec![0.2, 0.6, 1.0],
            ],
        )
    }

    fn ids(results: &[Recommendation]) -> Vec<ItemId> {
        results.iter().map(|r| r.item_id).collect()
    }

    #[test]
    fn test_basic_scenario() {
        let results = abc().recommend(1, 10, 0.5).unwrap();
        assert_eq!(
            results,
            vec![Recommendation {
                item_id: 2,
                name: "B".to_string(),
                score: 0.9
            }]
        );
    }

    #[test]
    fn test_threshold_above_everything_is_empty() {
        let results = abc().recommend(1, 10, 0.95).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_unknown_item() {
        let err = abc().recommend(99, 10, 0.5).unwrap_err();
        assert!(matches!(err, Error::UnknownItem(99)));
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_top_n_one() {
        let results = abc().recommend(2, 1, 0.5).unwrap();
        assert_eq!(ids(&results), vec![1]);
    }

    #[test]
    fn test_top_n_larger_than_survivors() {
        let results = abc().recommend(2, 50, 0.0).unwrap();
        assert_eq!(ids(&results), vec![1, 3]);
    }

    #[test]
    fn test_self_excluded_even_when_not_maximum() {
        // Row 0 scores itself lowest and has another item above it.
        let e = engine(
            &[(1, "A"), (2, "B"), (3, "C")],
            vec![
                vec![0.1, 0.9, 0.95],
                vec![0.9, 1.0, 0.6],
                vec![0.95, 0.6, 1.0],
            ],
        );
        let results = e.recommend(1, 10, f32::MIN).unwrap();
        assert_eq!(ids(&results), vec![3, 2]);
    }

    #[test]
    fn test_self_excluded_when_other_item_ties_with_self() {
        let e = engine(
            &[(1, "A"), (2, "B")],
            vec![vec![1.0, 1.0], vec![1.0, 1.0]],
        );
        assert_eq!(ids(&e.recommend(2, 10, 0.5).unwrap()), vec![1]);
        assert_eq!(ids(&e.recommend(1, 10, 0.5).unwrap()), vec![2]);
    }

    #[test]
    fn test_ties_keep_row_order() {
        let e = engine(
            &[(10, "A"), (20, "B"), (30, "C"), (40, "D"), (50, "E")],
            vec![
                vec![1.0, 0.3, 0.8, 0.8, 0.3],
                vec![0.3, 1.0, 0.0, 0.0, 0.0],
                vec![0.8, 0.0, 1.0, 0.0, 0.0],
                vec![0.8, 0.0, 0.0, 1.0, 0.0],
                vec![0.3, 0.0, 0.0, 0.0, 1.0],
            ],
        );
        let results = e.recommend(10, 10, 0.0).unwrap();
        assert_eq!(ids(&results), vec![30, 40, 20, 50]);
    }

    #[test]
    fn test_filter_after_rank_keeps_global_best() {
        let e = engine(
            &[(1, "A"), (2, "B"), (3, "C"), (4, "D")],
            vec![
                vec![1.0, 0.55, 0.7, 0.9],
                vec![0.55, 1.0, 0.0, 0.0],
                vec![0.7, 0.0, 1.0, 0.0],
                vec![0.9, 0.0, 0.0, 1.0],
            ],
        );
        let results = e.recommend(1, 2, 0.5).unwrap();
        assert_eq!(ids(&results), vec![4, 3]);
    }

    #[test]
    fn test_negative_scores_and_threshold() {
        let e = engine(
            &[(1, "A"), (2, "B"), (3, "C")],
            vec![
                vec![1.0, -0.2, -0.8],
                vec![-0.2, 1.0, 0.0],
                vec![-0.8, 0.0, 1.0],
            ],
        );
        let results = e.recommend(1, 10, -0.5).unwrap();
        assert_eq!(ids(&results), vec![2]);
        assert_eq!(results[0].score, -0.2);
    }

    #[test]
    fn test_invalid_query_parameters() {
        let e = abc();
        assert!(matches!(
            e.recommend(1, 0, 0.5).unwrap_err(),
            Error::InvalidQuery(_)
        ));
        assert!(matches!(
            e.recommend(1, 10, f32::NAN).unwrap_err(),
            Error::InvalidQuery(_)
        ));
        assert!(matches!(
            e.recommend(1, 10, f32::INFINITY).unwrap_err(),
            Error::InvalidQuery(_)
        ));
    }

    #[test]
    fn test_single_item_catalog() {
        let e = engine(&[(7, "Only")], vec![vec![1.0]]);
        assert!(e.recommend(7, 10, -1.0).unwrap().is_empty());
    }

    #[test]
    fn test_new_rejects_misaligned() {
        let catalog =
            CatalogStore::from_entries(vec![CatalogEntry::new(1, "A"), CatalogEntry::new(2, "B")])
                .unwrap();
        let index = SimilarityIndex::load(vec![vec![1.0]]).unwrap();
        let err = RecommendationEngine::new(Arc::new(catalog), Arc::new(index)).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    fn misaligned() -> RecommendationEngine {
        // Bypasses `new` to simulate a matrix replaced underneath a live catalog.
        let catalog = CatalogStore::from_entries(vec![
            CatalogEntry::new(1, "A"),
            CatalogEntry::new(2, "B"),
            CatalogEntry::new(3, "C"),
        ])
        .unwrap();
        let index = SimilarityIndex::load(vec![vec![1.0, 0.9], vec![0.9, 1.0]]).unwrap();
        RecommendationEngine {
            catalog: Arc::new(catalog),
            index: Arc::new(index),
        }
    }

    #[test]
    fn test_query_time_integrity_checks() {
        let e = misaligned();
        // row index 2 is past the end of the matrix
        assert!(matches!(
            e.recommend(3, 10, 0.0).unwrap_err(),
            Error::Integrity(_)
        ));
        // row exists but is shorter than the catalog
        assert!(matches!(
            e.recommend(1, 10, 0.0).unwrap_err(),
            Error::Integrity(_)
        ));
    }

    #[test]
    fn test_batch_matches_single_queries() {
        let e = abc();
        let options = RecommendOptions::new(10, 0.5);
        let batch = e.recommend_batch(&[1, 99, 3], &options);
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch[0].as_ref().unwrap(),
            &e.recommend_with(1, &options).unwrap()
        );
        assert!(matches!(batch[1], Err(Error::UnknownItem(99))));
        assert_eq!(ids(batch[2].as_ref().unwrap()), vec![2]);
    }

    #[test]
    fn test_default_options() {
        let options = RecommendOptions::default();
        assert_eq!(options.top_n, 10);
        assert_eq!(options.min_similarity, 0.5);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_random_matrix_properties() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 60;
        // quantised scores so exact ties are common
        let rows: Vec<Vec<f32>> = (0..n)
            .map(|_| (0..n).map(|_| rng.random_range(0..10) as f32 / 10.0).collect())
            .collect();
        let entries: Vec<(ItemId, String)> =
            (0..n).map(|i| (1000 + i as ItemId, format!("item-{}", i))).collect();
        let refs: Vec<(ItemId, &str)> = entries.iter().map(|(id, s)| (*id, s.as_str())).collect();
        let e = engine(&refs, rows.clone());

        for (row, (item_id, _)) in refs.iter().enumerate() {
            for &(top_n, min) in &[(1usize, 0.0f32), (5, 0.5), (100, 0.3), (10, 0.95)] {
                let results = e.recommend(*item_id, top_n, min).unwrap();
                assert!(results.len() <= top_n);
                assert!(results.iter().all(|r| r.item_id != *item_id));
                assert!(results.iter().all(|r| r.score >= min));

                for pair in results.windows(2) {
                    assert!(pair[0].score >= pair[1].score);
                    if pair[0].score == pair[1].score {
                        let a = e.catalog().resolve(pair[0].item_id).unwrap();
                        let b = e.catalog().resolve(pair[1].item_id).unwrap();
                        assert!(a < b, "tie order broken in row {}", row);
                    }
                }

                let again = e.recommend(*item_id, top_n, min).unwrap();
                assert_eq!(results, again);
            }
        }
    }
}
