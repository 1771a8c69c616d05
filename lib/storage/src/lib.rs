//! # SimRec Storage
//!
//! Loads the catalog and similarity matrix a SimRec server serves from.
//!
//! - [`snapshot`] - dataset file formats (gzip'd JSON, JSON, bincode)
//! - [`fetch`] - local paths and URLs with an on-disk download cache
//! - [`loader`] - builds an aligned [`Dataset`] from a source

pub mod fetch;
pub mod loader;
pub mod snapshot;

pub use fetch::{fetch_to_cache, DataSource};
pub use loader::{load_catalog_and_similarity, load_from_path, Dataset, LoaderConfig};
pub use snapshot::{
    read_snapshot, save_snapshot, DatasetFormat, DatasetSnapshot, SnapshotDescription,
    DEFAULT_MATRIX_KEY,
};
