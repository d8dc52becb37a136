//! Error types for the content crate.

use thiserror::Error;

/// Errors raised by content-similarity lookups
#[derive(Error, Debug)]
pub enum ContentError {
    /// No catalog title matched, exactly or as a substring
    #[error("No item matches title '{title}'")]
    NotFound { title: String },
}

pub type Result<T> = std::result::Result<T, ContentError>;
