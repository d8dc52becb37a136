//! Error types for the catalog crate.
//!
//! Construction and ingestion problems surface here. Lookups that simply
//! find nothing return `Option` or an empty slice instead.

use thiserror::Error;

/// Errors that can occur while loading or assembling a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Two items were inserted with the same id
    #[error("Duplicate item id {id}")]
    DuplicateItem { id: u32 },

    /// Referenced entity doesn't exist (e.g., rating for a non-existent item)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
