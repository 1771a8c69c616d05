use crate::ItemId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The loaded source does not have the expected shape.
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// Catalog and similarity matrix disagree with each other.
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("Row index {index} out of range (size {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Dataset is not loaded yet")]
    NotReady,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors a caller can act on (bad input, not loaded yet), as opposed to data defects.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::UnknownItem(_) | Error::InvalidQuery(_) | Error::NotReady
        )
    }
}
