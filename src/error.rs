//! Error types for the catalog core.
//!
//! `CatalogError` covers storage and configuration failures; `DomainError`
//! covers business rules the caller broke. Malformed lines never show up
//! here, the codec skips and reports them instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Unified catalog error type.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be opened, read or written
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV writer failed (reads never fail on content)
    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// SQLite backend failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Business rule violation
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl CatalogError {
    /// Create an I/O error bound to the file it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a CSV error bound to the file it happened on.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The domain error, if this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            CatalogError::Domain(err) => Some(err),
            _ => None,
        }
    }
}

/// Business-rule violations returned to the caller as typed failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("Book {isbn} is already on loan")]
    AlreadyLoaned { isbn: String },

    #[error("No active loan for book {isbn}")]
    NoActiveLoan { isbn: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{kind} already exists: {key}")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn duplicate(kind: &'static str, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            kind,
            key: key.into(),
        }
    }
}

/// Reject blank required text.
pub(crate) fn require(field: &'static str, value: &str) -> std::result::Result<(), DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::MissingField(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_is_distinct_from_io() {
        let domain: CatalogError = DomainError::AlreadyLoaned {
            isbn: "978-0".to_string(),
        }
        .into();
        let io = CatalogError::io(
            "books.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );

        assert_eq!(
            domain.as_domain(),
            Some(&DomainError::AlreadyLoaned {
                isbn: "978-0".to_string()
            })
        );
        assert!(io.as_domain().is_none());
        assert!(io.to_string().contains("books.csv"));
    }

    #[test]
    fn test_require_rejects_blank() {
        assert_eq!(require("title", "  "), Err(DomainError::MissingField("title")));
        assert!(require("title", "Dune").is_ok());
    }
}
