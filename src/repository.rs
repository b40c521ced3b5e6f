// 🗄️ Repository - full-collection load/save per entity
//
// Every save rewrites the whole collection (O(n) per mutation). That is fine
// at catalog scale (hundreds to low thousands of records) and nowhere else.
// Nothing is cached: callers reload before each change.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::codec::{self, CsvRecord, Loaded};
use crate::entities::{Book, Branch, Loan, Member};
use crate::error::{CatalogError, Result};

/// Load/save contract shared by every storage backend
pub trait Repository: Send {
    fn load_books(&self) -> Result<Loaded<Book>>;
    fn save_books(&self, books: &[Book]) -> Result<()>;

    fn load_members(&self) -> Result<Loaded<Member>>;
    fn save_members(&self, members: &[Member]) -> Result<()>;

    /// Loans are joined by natural key against the given collections;
    /// loans whose book or member is missing are skipped.
    fn load_loans(&self, books: &[Book], members: &[Member]) -> Result<Loaded<Loan>>;
    fn save_loans(&self, loans: &[Loan]) -> Result<()>;

    fn load_branches(&self) -> Result<Loaded<Branch>>;
    fn save_branches(&self, branches: &[Branch]) -> Result<()>;

    /// Backend name for diagnostics
    fn backend(&self) -> &'static str;
}

// ============================================================================
// CSV FILES
// ============================================================================

/// Paths of the four entity files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPaths {
    pub books: PathBuf,
    pub members: PathBuf,
    pub loans: PathBuf,
    pub branches: PathBuf,
}

impl CsvPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        CsvPaths {
            books: dir.join("books.csv"),
            members: dir.join("members.csv"),
            loans: dir.join("loans.csv"),
            branches: dir.join("branches.csv"),
        }
    }
}

/// Repository backed by four delimited text files
#[derive(Debug, Clone)]
pub struct CsvRepository {
    paths: CsvPaths,
}

impl CsvRepository {
    pub fn new(paths: CsvPaths) -> Self {
        CsvRepository { paths }
    }

    pub fn paths(&self) -> &CsvPaths {
        &self.paths
    }

    /// Create any missing file with just its header line.
    /// Existing files are left untouched.
    pub fn init(&self) -> Result<()> {
        for path in [
            &self.paths.books,
            &self.paths.members,
            &self.paths.loans,
            &self.paths.branches,
        ] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
            }
        }

        create_if_missing::<Book>(&self.paths.books)?;
        create_if_missing::<Member>(&self.paths.members)?;
        create_if_missing::<Loan>(&self.paths.loans)?;
        create_if_missing::<Branch>(&self.paths.branches)?;
        Ok(())
    }
}

fn create_if_missing<T: CsvRecord>(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    info!("Creating {}", path.display());
    codec::write_records::<T>(path, &[])
}

impl Repository for CsvRepository {
    fn load_books(&self) -> Result<Loaded<Book>> {
        codec::decode_books(&self.paths.books)
    }

    fn save_books(&self, books: &[Book]) -> Result<()> {
        codec::write_records(&self.paths.books, books)
    }

    fn load_members(&self) -> Result<Loaded<Member>> {
        codec::decode_members(&self.paths.members)
    }

    fn save_members(&self, members: &[Member]) -> Result<()> {
        codec::write_records(&self.paths.members, members)
    }

    fn load_loans(&self, books: &[Book], members: &[Member]) -> Result<Loaded<Loan>> {
        codec::decode_loans(&self.paths.loans, books, members)
    }

    fn save_loans(&self, loans: &[Loan]) -> Result<()> {
        codec::write_records(&self.paths.loans, loans)
    }

    fn load_branches(&self) -> Result<Loaded<Branch>> {
        codec::decode_branches(&self.paths.branches)
    }

    fn save_branches(&self, branches: &[Branch]) -> Result<()> {
        codec::write_records(&self.paths.branches, branches)
    }

    fn backend(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_header_only_files() {
        let dir = tempdir().unwrap();
        let repo = CsvRepository::new(CsvPaths::in_dir(dir.path().join("data")));

        repo.init().unwrap();

        assert!(repo.load_books().unwrap().records.is_empty());
        assert!(repo.load_members().unwrap().records.is_empty());
        assert!(repo.load_loans(&[], &[]).unwrap().records.is_empty());
        assert!(repo.load_branches().unwrap().records.is_empty());
        assert_eq!(
            fs::read_to_string(&repo.paths().loans).unwrap(),
            "ISBN,MemberID,LoanDate,ExpectedReturnDate,ActualReturnDate\n"
        );
    }

    #[test]
    fn test_init_keeps_existing_data() {
        let dir = tempdir().unwrap();
        let repo = CsvRepository::new(CsvPaths::in_dir(dir.path()));
        repo.init().unwrap();
        repo.save_members(&[Member::new("M1", "Ana", "ana@example.com", "555-0101")])
            .unwrap();

        repo.init().unwrap();

        assert_eq!(repo.load_members().unwrap().records.len(), 1);
    }

    #[test]
    fn test_save_rewrites_whole_collection() {
        let dir = tempdir().unwrap();
        let repo = CsvRepository::new(CsvPaths::in_dir(dir.path()));
        repo.init().unwrap();

        repo.save_books(&[
            Book::new("978-0", "Dune", "Herbert", 1965, "SciFi"),
            Book::new("978-1", "Emma", "Austen", 1815, "Classic"),
        ])
        .unwrap();
        repo.save_books(&[Book::new("978-1", "Emma", "Austen", 1815, "Classic")])
            .unwrap();

        let books = repo.load_books().unwrap().records;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].isbn, "978-1");
    }
}
