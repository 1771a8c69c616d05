use crate::fetch::{fetch_to_cache, DataSource};
use crate::snapshot::{decode, DatasetFormat, DatasetSnapshot, DEFAULT_MATRIX_KEY};
use simrec_core::{
    CatalogColumns, CatalogStore, Column, Error, RecommendationEngine, Result, SimilarityIndex,
    Table,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Loader settings
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub columns: CatalogColumns,
    /// Snapshot column holding the similarity matrix
    pub matrix_key: String,
    /// Where URL sources are downloaded to
    pub cache_dir: PathBuf,
    pub expected_sha256: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            columns: CatalogColumns::default(),
            matrix_key: DEFAULT_MATRIX_KEY.to_string(),
            cache_dir: PathBuf::from("./data"),
            expected_sha256: None,
        }
    }
}

/// A catalog and similarity matrix that have passed the alignment check
#[derive(Debug, Clone)]
pub struct Dataset {
    pub catalog: Arc<CatalogStore>,
    pub index: Arc<SimilarityIndex>,
}

impl Dataset {
    /// Split the matrix column off `table`, build both structures and
    /// validate that they line up.
    pub fn from_table(mut table: Table, config: &LoaderConfig) -> Result<Self> {
        let matrix = match table.remove(&config.matrix_key) {
            Some(Column::Vectors(rows)) => rows,
            Some(other) => {
                return Err(Error::DataFormat(format!(
                    "'{}' must be a vectors column, got {}",
                    config.matrix_key,
                    other.type_name()
                )))
            }
            None => {
                return Err(Error::DataFormat(format!(
                    "missing similarity matrix '{}'",
                    config.matrix_key
                )))
            }
        };

        let index = SimilarityIndex::load(matrix)?;
        let catalog = CatalogStore::load(&table, &config.columns)?;
        index.validate_alignment(catalog.len())?;

        Ok(Self {
            catalog: Arc::new(catalog),
            index: Arc::new(index),
        })
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn engine(&self) -> Result<RecommendationEngine> {
        RecommendationEngine::new(self.catalog.clone(), self.index.clone())
    }
}

/// Decode a local dataset file. Blocking.
pub fn load_from_path(path: &Path, config: &LoaderConfig) -> Result<Dataset> {
    let format = DatasetFormat::from_path(path).map_err(|e| Error::DataFormat(e.to_string()))?;
    let bytes = fs::read(path)?;
    let snapshot: DatasetSnapshot =
        decode(&bytes, format).map_err(|e| Error::DataFormat(e.to_string()))?;

    let dataset = Dataset::from_table(snapshot.columns, config)?;
    info!(
        path = %path.display(),
        items = dataset.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Resolve `source` (downloading URLs into the cache) and load it.
///
/// The returned dataset is always aligned; any shape problem surfaces as
/// [`Error::DataFormat`] or [`Error::Integrity`] before anything is returned.
pub async fn load_catalog_and_similarity(
    source: &DataSource,
    config: &LoaderConfig,
) -> Result<Dataset> {
    let path = match source {
        DataSource::Path(p) => p.clone(),
        DataSource::Url(url) => {
            fetch_to_cache(url, &config.cache_dir, config.expected_sha256.as_deref())
                .await
                .map_err(|e| Error::Storage(e.to_string()))?
        }
    };

    let config = config.clone();
    tokio::task::spawn_blocking(move || load_from_path(&path, &config))
        .await
        .map_err(|e| Error::Storage(format!("loader task failed: {}", e)))?
}
