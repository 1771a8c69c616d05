use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed column of the catalog source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
    /// One vector per row (feature vectors, one-hot encodings...)
    Vectors(Vec<Vec<f32>>),
}

impl Column {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Vectors(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Int(_) => "int",
            Column::Float(_) => "float",
            Column::Text(_) => "text",
            Column::Vectors(_) => "vectors",
        }
    }
}

/// Columnar catalog input, keyed by column name.
///
/// This is the only shape the catalog loader accepts; file formats live in
/// the storage crate and decode into it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Table {
    columns: BTreeMap<String, Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: BTreeMap<String, Column>) -> Self {
        Self { columns }
    }

    /// Builder-style insert, replacing any column with the same name
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, column: Column) -> Option<Column> {
        self.columns.insert(name.into(), column)
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        self.columns.remove(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_len_and_type() {
        let c = Column::Text(vec!["a".into(), "b".into()]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.type_name(), "text");
        assert!(Column::Int(vec![]).is_empty());
    }

    #[test]
    fn test_table_json_shape() {
        let table = Table::new()
            .with_column("app_id", Column::Int(vec![10, 20]))
            .with_column("name", Column::Text(vec!["A".into(), "B".into()]));

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["app_id"]["int"], serde_json::json!([10, 20]));
        assert_eq!(json["name"]["text"], serde_json::json!(["A", "B"]));
        assert_eq!(table.column_names(), vec!["app_id", "name"]);
    }
}
