//! Catalog configuration.
//!
//! File locations are configuration, never user input. Everything has a
//! default so an absent config file still yields a working catalog rooted
//! at `./data`.
//!
//! ```toml
//! data_dir = "/var/lib/library"
//! backend = "csv"          # or "sqlite"
//! books_file = "books.csv"
//! database_file = "catalog.db"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::db::SqliteRepository;
use crate::error::{CatalogError, Result};
use crate::repository::{CsvPaths, CsvRepository, Repository};

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory the file names below are resolved against
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub books_file: String,
    pub members_file: String,
    pub loans_file: String,
    pub branches_file: String,
    /// Used only by the SQLite backend
    pub database_file: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backend: Backend::Csv,
            books_file: "books.csv".to_string(),
            members_file: "members.csv".to_string(),
            loans_file: "loans.csv".to_string(),
            branches_file: "branches.csv".to_string(),
            database_file: "catalog.db".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Defaults with every file placed in `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| CatalogError::config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration or fall back to defaults when the file is absent.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file {:?} not found. Using defaults.", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn csv_paths(&self) -> CsvPaths {
        CsvPaths {
            books: self.data_dir.join(&self.books_file),
            members: self.data_dir.join(&self.members_file),
            loans: self.data_dir.join(&self.loans_file),
            branches: self.data_dir.join(&self.branches_file),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Build the configured backend, creating empty storage if needed
    pub fn open_repository(&self) -> Result<Box<dyn Repository>> {
        match self.backend {
            Backend::Csv => {
                let repo = CsvRepository::new(self.csv_paths());
                repo.init()?;
                Ok(Box::new(repo))
            }
            Backend::Sqlite => {
                fs::create_dir_all(&self.data_dir)
                    .map_err(|e| CatalogError::io(&self.data_dir, e))?;
                Ok(Box::new(SqliteRepository::open(&self.database_path())?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CatalogConfig = toml::from_str(
            r#"
            data_dir = "/srv/library"
            backend = "sqlite"
            loans_file = "prestamos.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.books_file, "books.csv");
        assert_eq!(config.csv_paths().loans, PathBuf::from("/srv/library/prestamos.csv"));
        assert_eq!(config.database_path(), PathBuf::from("/srv/library/catalog.db"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let config = CatalogConfig::load_or_default(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        fs::write(&path, "backend = \"parquet\"\n").unwrap();

        let err = CatalogConfig::load_or_default(&path).unwrap_err();

        assert!(matches!(err, CatalogError::Config(_)));
    }

    #[test]
    fn test_open_repository_initialises_csv_files() {
        let dir = tempdir().unwrap();
        let config = CatalogConfig::in_dir(dir.path().join("data"));

        let repo = config.open_repository().unwrap();

        assert_eq!(repo.backend(), "csv");
        assert!(config.csv_paths().books.exists());
    }
}
