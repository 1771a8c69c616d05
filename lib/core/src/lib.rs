//! # SimRec Core
//!
//! Core library for the SimRec recommendation server.
//!
//! This crate provides the query-time data model and algorithm:
//!
//! - [`CatalogStore`] - Ordered item list with O(1) id resolution
//! - [`SimilarityIndex`] - Square similarity matrix aligned with the catalog
//! - [`RecommendationEngine`] - Ranking, filtering and truncation of one matrix row
//! - [`SharedEngine`] - Readiness gate that serves queries once loading is done
//!
//! ## Example
//!
//! ```rust
//! use simrec_core::{CatalogEntry, CatalogStore, SimilarityIndex, RecommendationEngine};
//! use std::sync::Arc;
//!
//! let catalog = CatalogStore::from_entries(vec![
//!     CatalogEntry::new(1, "A"),
//!     CatalogEntry::new(2, "B"),
//!     CatalogEntry::new(3, "C"),
//! ]).unwrap();
//! let index = SimilarityIndex::load(vec![
//!     vec![1.0, 0.9, 0.2],
//!     vec![0.9, 1.0, 0.4],
//!     vec![0.2, 0.4, 1.0],
//! ]).unwrap();
//!
//! let engine = RecommendationEngine::new(Arc::new(catalog), Arc::new(index)).unwrap();
//! let results = engine.recommend(1, 10, 0.5).unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].name, "B");
//! ```

pub mod catalog;
pub mod engine;
pub mod error;
pub mod feature;
pub mod serving;
pub mod similarity;
pub mod table;

pub use catalog::{CatalogColumns, CatalogEntry, CatalogStore, ItemId, DEFAULT_FEATURE_COLUMNS};
pub use engine::{
    rank_row, RecommendOptions, Recommendation, RecommendationEngine, DEFAULT_MIN_SIMILARITY,
    DEFAULT_TOP_N,
};
pub use error::{Error, Result};
pub use feature::FeatureVector;
pub use serving::SharedEngine;
pub use similarity::{RowView, SimilarityIndex};
pub use table::{Column, Table};
