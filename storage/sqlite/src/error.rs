//! Error types for the SQLite backend

use nestql::StorageError;
use thiserror::Error;

use crate::sql_builder::SqlGenerationError;

#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("SQL generation error: {0}")]
    SqlGeneration(#[from] SqlGenerationError),

    #[error("model `{0}` is not part of the schema")]
    UnknownModel(String),
}

impl From<SqliteError> for StorageError {
    fn from(err: SqliteError) -> Self { StorageError::new(err) }
}
