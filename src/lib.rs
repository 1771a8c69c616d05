//! # SimRec
//!
//! An in-memory recommendation server: given an item id, return the most
//! similar other items from a precomputed pairwise similarity matrix.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! simrec serve --data ./data/games.json.gz --http-port 6380
//! curl 'localhost:6380/items/620/recommendations?top_n=5&min_similarity=0.4'
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use simrec::prelude::*;
//! use std::path::Path;
//!
//! let dataset = load_from_path(Path::new("data/games.json.gz"), &LoaderConfig::default()).unwrap();
//! let engine = dataset.engine().unwrap();
//!
//! match engine.recommend(620, 10, 0.5) {
//!     Ok(results) => {
//!         for r in results {
//!             println!("{} ({:.3})", r.name, r.score);
//!         }
//!     }
//!     Err(Error::UnknownItem(id)) => println!("{} not found", id),
//!     Err(e) => panic!("{}", e),
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`simrec-core`](https://docs.rs/simrec-core) - Catalog store, similarity index, recommendation engine
//! - [`simrec-storage`](https://docs.rs/simrec-storage) - Dataset files, URL download cache, loader
//! - [`simrec-api`](https://docs.rs/simrec-api) - REST API

// Re-export core types
pub use simrec_core::{
    CatalogColumns, CatalogEntry, CatalogStore, Column, FeatureVector, ItemId,
    RecommendOptions, Recommendation, RecommendationEngine, SharedEngine, SimilarityIndex, Table,
    Error, Result,
};

// Re-export storage
pub use simrec_storage::{
    load_catalog_and_similarity, load_from_path, save_snapshot, DataSource, Dataset,
    DatasetSnapshot, LoaderConfig,
};

// Re-export API
pub use simrec_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CatalogEntry, CatalogStore, SimilarityIndex, RecommendationEngine,
        RecommendOptions, Recommendation, SharedEngine, ItemId,
        Error, Result,
        load_catalog_and_similarity, load_from_path, DataSource, Dataset, LoaderConfig,
        RestApi,
    };
}
