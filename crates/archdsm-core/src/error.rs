//! Fact store errors

use std::path::PathBuf;

use thiserror::Error;

pub type FactResult<T> = std::result::Result<T, FactError>;

#[derive(Error, Debug)]
pub enum FactError {
    #[error("fact store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("fact store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("refusing to overwrite the input fact base {0}")]
    SameDatabase(PathBuf),

    #[error("output fact base already exists: {0}")]
    OutputExists(PathBuf),
}
