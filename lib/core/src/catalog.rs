use crate::{Column, Error, FeatureVector, Result, Table};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// External item identifier (e.g. a storefront application id)
pub type ItemId = i64;

/// Vector columns produced by the upstream feature pipeline
pub const DEFAULT_FEATURE_COLUMNS: [&str; 9] = [
    "developers_vector",
    "publishers_vector",
    "category_vector",
    "genre_vector",
    "tags_matrix",
    "tags_tfidf_matrix",
    "feature_matrix",
    "final_feature_vectors",
    "short_desc_matrix",
];

/// One catalog row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub item_id: ItemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub feature_vectors: BTreeMap<String, FeatureVector>,
}

impl CatalogEntry {
    pub fn new(item_id: ItemId, name: impl Into<String>) -> Self {
        Self {
            item_id,
            name: name.into(),
            feature_vectors: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>, vector: FeatureVector) -> Self {
        self.feature_vectors.insert(name.into(), vector);
        self
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureVector> {
        self.feature_vectors.get(name)
    }
}

/// Which source columns make up a catalog entry
#[derive(Debug, Clone)]
pub struct CatalogColumns {
    pub id_column: String,
    pub name_column: String,
    /// `None` attaches every vector column; `Some` restricts to the listed ones.
    pub feature_columns: Option<Vec<String>>,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            id_column: "app_id".to_string(),
            name_column: "name".to_string(),
            feature_columns: Some(
                DEFAULT_FEATURE_COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            ),
        }
    }
}

/// Ordered item list with O(1) id resolution
#[derive(Debug, Clone)]
pub struct CatalogStore {
    entries: Vec<CatalogEntry>,
    index: AHashMap<ItemId, usize>,
}

impl CatalogStore {
    /// Build the catalog from columnar input, keeping source row order.
    ///
    /// Fails with [`Error::DataFormat`] when the id or name column is missing
    /// or mistyped, or when columns disagree on length, and with
    /// [`Error::Integrity`] when an id repeats.
    pub fn load(table: &Table, columns: &CatalogColumns) -> Result<Self> {
        let ids = match table.column(&columns.id_column) {
            Some(Column::Int(ids)) => ids,
            Some(other) => {
                return Err(Error::DataFormat(format!(
                    "column '{}' must be int, got {}",
                    columns.id_column,
                    other.type_name()
                )))
            }
            None => {
                return Err(Error::DataFormat(format!(
                    "missing required column '{}'",
                    columns.id_column
                )))
            }
        };

        let names = match table.column(&columns.name_column) {
            Some(Column::Text(names)) => names,
            Some(other) => {
                return Err(Error::DataFormat(format!(
                    "column '{}' must be text, got {}",
                    columns.name_column,
                    other.type_name()
                )))
            }
            None => {
                return Err(Error::DataFormat(format!(
                    "missing required column '{}'",
                    columns.name_column
                )))
            }
        };

        let rows = ids.len();
        for (name, column) in table.columns() {
            if column.len() != rows {
                return Err(Error::DataFormat(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    column.len(),
                    rows
                )));
            }
        }

        let features = Self::feature_columns(table, columns)?;

        let entries = ids
            .iter()
            .zip(names.iter())
            .enumerate()
            .map(|(row, (&item_id, name))| {
                let mut entry = CatalogEntry::new(item_id, name.clone());
                for (column, vectors) in &features {
                    entry
                        .feature_vectors
                        .insert((*column).to_string(), FeatureVector::from_slice(&vectors[row]));
                }
                entry
            })
            .collect();

        Self::from_entries(entries)
    }

    fn feature_columns<'a>(
        table: &'a Table,
        columns: &CatalogColumns,
    ) -> Result<Vec<(&'a str, &'a Vec<Vec<f32>>)>> {
        let mut out = Vec::new();
        match &columns.feature_columns {
            None => {
                for (name, column) in table.columns() {
                    if let Column::Vectors(v) = column {
                        out.push((name, v));
                    }
                }
            }
            Some(wanted) => {
                for name in wanted {
                    match table.columns().find(|(n, _)| *n == name.as_str()) {
                        Some((n, Column::Vectors(v))) => out.push((n, v)),
                        Some((n, other)) => {
                            return Err(Error::DataFormat(format!(
                                "feature column '{}' must be vectors, got {}",
                                n,
                                other.type_name()
                            )))
                        }
                        None => debug!(column = %name, "feature column not present, skipping"),
                    }
                }
            }
        }
        Ok(out)
    }

    /// Build from already typed rows; fails with [`Error::Integrity`] on a repeated id.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut index = AHashMap::with_capacity(entries.len());
        for (row, entry) in entries.iter().enumerate() {
            if let Some(first) = index.insert(entry.item_id, row) {
                warn!(item_id = entry.item_id, first, row, "duplicate item id in catalog");
                return Err(Error::Integrity(format!(
                    "item id {} appears at rows {} and {}",
                    entry.item_id, first, row
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// Row index of an item, or `None` if the catalog doesn't know it
    #[inline]
    pub fn resolve(&self, item_id: ItemId) -> Option<usize> {
        self.index.get(&item_id).copied()
    }

    #[inline]
    pub fn entry_at(&self, row: usize) -> Result<&CatalogEntry> {
        self.entries.get(row).ok_or(Error::IndexOutOfRange {
            index: row,
            len: self.entries.len(),
        })
    }

    pub fn get(&self, item_id: ItemId) -> Option<&CatalogEntry> {
        self.resolve(item_id).and_then(|row| self.entries.get(row))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new()
            .with_column("app_id", Column::Int(vec![10, 20, 30]))
            .with_column(
                "name",
                Column::Text(vec!["Alpha".into(), "Beta".into(), "Gamma".into()]),
            )
            .with_column(
                "genre_vector",
                Column::Vectors(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]),
            )
            .with_column("price", Column::Float(vec![9.99, 0.0, 4.5]))
    }

    #[test]
    fn test_load_preserves_row_order() {
        let catalog = CatalogStore::load(&sample_table(), &CatalogColumns::default()).unwrap();
        assert_eq!(catalog.len(), 3);
        let ids: Vec<ItemId> = catalog.iter().map(|e| e.item_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(catalog.resolve(30), Some(2));
        assert_eq!(catalog.entry_at(1).unwrap().name, "Beta");
    }

    #[test]
    fn test_load_attaches_feature_vectors() {
        let catalog = CatalogStore::load(&sample_table(), &CatalogColumns::default()).unwrap();
        let gamma = catalog.get(30).unwrap();
        assert_eq!(gamma.feature("genre_vector").unwrap().as_slice(), &[1.0, 1.0]);
        assert!(gamma.feature("price").is_none());
    }

    #[test]
    fn test_feature_columns_none_takes_all_vectors() {
        let table = sample_table().with_column(
            "custom_embedding",
            Column::Vectors(vec![vec![0.1], vec![0.2], vec![0.3]]),
        );
        let columns = CatalogColumns {
            feature_columns: None,
            ..Default::default()
        };
        let catalog = CatalogStore::load(&table, &columns).unwrap();
        assert_eq!(catalog.entry_at(0).unwrap().feature_vectors.len(), 2);
    }

    #[test]
    fn test_missing_required_column() {
        let mut table = sample_table();
        table.remove("name");
        let err = CatalogStore::load(&table, &CatalogColumns::default()).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
    }

    #[test]
    fn test_wrong_id_type() {
        let mut table = sample_table();
        table.insert("app_id", Column::Text(vec!["1".into(), "2".into(), "3".into()]));
        let err = CatalogStore::load(&table, &CatalogColumns::default()).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
    }

    #[test]
    fn test_listed_feature_column_with_wrong_type() {
        let mut table = sample_table();
        table.insert("genre_vector", Column::Float(vec![1.0, 2.0, 3.0]));
        let err = CatalogStore::load(&table, &CatalogColumns::default()).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
    }

    #[test]
    fn test_ragged_columns() {
        let table = sample_table().with_column("extra", Column::Int(vec![1]));
        let err = CatalogStore::load(&table, &CatalogColumns::default()).unwrap_err();
        assert!(matches!(err, Error::DataFormat(_)));
    }

    #[test]
    fn test_duplicate_ids() {
        let entries = vec![
            CatalogEntry::new(1, "A"),
            CatalogEntry::new(2, "B"),
            CatalogEntry::new(1, "A again"),
        ];
        let err = CatalogStore::from_entries(entries).unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let catalog = CatalogStore::from_entries(vec![CatalogEntry::new(1, "A")]).unwrap();
        assert_eq!(catalog.resolve(99), None);
        assert!(catalog.get(99).is_none());
    }

    #[test]
    fn test_entry_at_out_of_range() {
        let catalog = CatalogStore::from_entries(vec![CatalogEntry::new(1, "A")]).unwrap();
        match catalog.entry_at(5) {
            Err(Error::IndexOutOfRange { index, len }) => {
                assert_eq!(index, 5);
                assert_eq!(len, 1);
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }
}
