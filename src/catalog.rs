// 📇 Catalog - the operations presentation code is allowed to call
//
// Each operation reloads what it needs from the repository, applies at most
// one change and rewrites the affected collection. No state survives between
// calls; the storage is the source of truth.
//
// Single-process, single-user only: two overlapping reload-mutate-rewrite
// sequences lose one of the updates.

use chrono::NaiveDate;
use log::info;

use crate::clock::{Clock, SystemClock};
use crate::config::CatalogConfig;
use crate::entities::{Book, BookUpdate, Branch, Loan, Member, MemberUpdate};
use crate::error::{DomainError, Result};
use crate::lifecycle::reconcile_availability;
use crate::repository::Repository;

/// Books, members and loans as loaded together, availability reconciled
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    pub books: Vec<Book>,
    pub members: Vec<Member>,
    pub loans: Vec<Loan>,
}

pub struct Catalog {
    repository: Box<dyn Repository>,
    clock: Box<dyn Clock>,
}

impl Catalog {
    pub fn new(repository: Box<dyn Repository>) -> Self {
        Self::with_clock(repository, Box::new(SystemClock))
    }

    pub fn with_clock(repository: Box<dyn Repository>, clock: Box<dyn Clock>) -> Self {
        Catalog { repository, clock }
    }

    /// Open the backend described by `config`
    pub fn open(config: &CatalogConfig) -> Result<Self> {
        Ok(Self::new(config.open_repository()?))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    pub(crate) fn snapshot(&self) -> Result<Snapshot> {
        let mut books = self.repository.load_books()?.into_records();
        let members = self.repository.load_members()?.into_records();
        let loans = self.repository.load_loans(&books, &members)?.into_records();
        reconcile_availability(&mut books, &loans);

        Ok(Snapshot {
            books,
            members,
            loans,
        })
    }

    // ========================================================================
    // BOOKS
    // ========================================================================

    pub fn list_books(&self) -> Result<Vec<Book>> {
        Ok(self.snapshot()?.books)
    }

    pub fn add_book(&self, book: Book) -> Result<Book> {
        let book = book.trimmed();
        book.validate()?;
        let mut books = self.repository.load_books()?.into_records();

        if books.iter().any(|b| b.isbn == book.isbn) {
            return Err(DomainError::duplicate("Book", &book.isbn).into());
        }

        let added = Book {
            available: true,
            ..book
        };
        books.push(added.clone());
        self.repository.save_books(&books)?;

        info!("Added book {} ({})", added.isbn, added.title);
        Ok(added)
    }

    /// Edit the first book with this ISBN
    pub fn edit_book(&self, isbn: &str, update: BookUpdate) -> Result<Book> {
        let isbn = isbn.trim();
        update.validate()?;
        let mut books = self.snapshot()?.books;

        let book = books
            .iter_mut()
            .find(|b| b.isbn == isbn)
            .ok_or_else(|| DomainError::not_found("Book", isbn))?;
        book.apply(update);
        let edited = book.clone();

        self.repository.save_books(&books)?;
        info!("Edited book {}", isbn);
        Ok(edited)
    }

    /// Remove the first book with this ISBN. Loans referring to it stay in
    /// the loans file until the next loan rewrite drops them.
    pub fn remove_book(&self, isbn: &str) -> Result<Book> {
        let isbn = isbn.trim();
        let mut books = self.snapshot()?.books;

        let index = books
            .iter()
            .position(|b| b.isbn == isbn)
            .ok_or_else(|| DomainError::not_found("Book", isbn))?;
        let removed = books.remove(index);

        self.repository.save_books(&books)?;
        info!("Removed book {}", isbn);
        Ok(removed)
    }

    // ========================================================================
    // MEMBERS
    // ========================================================================

    pub fn list_members(&self) -> Result<Vec<Member>> {
        Ok(self.repository.load_members()?.into_records())
    }

    pub fn add_member(&self, member: Member) -> Result<Member> {
        let member = member.trimmed();
        member.validate()?;
        let mut members = self.repository.load_members()?.into_records();

        if members.iter().any(|m| m.id == member.id) {
            return Err(DomainError::duplicate("Member", &member.id).into());
        }

        members.push(member.clone());
        self.repository.save_members(&members)?;
        info!("Added member {} ({})", member.id, member.name);
        Ok(member)
    }

    /// Edit the first member with this id
    pub fn edit_member(&self, id: &str, update: MemberUpdate) -> Result<Member> {
        let id = id.trim();
        update.validate()?;
        let mut members = self.repository.load_members()?.into_records();

        let member = members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| DomainError::not_found("Member", id))?;
        member.apply(update);
        let edited = member.clone();

        self.repository.save_members(&members)?;
        info!("Edited member {}", id);
        Ok(edited)
    }

    pub fn remove_member(&self, id: &str) -> Result<Member> {
        let id = id.trim();
        let mut members = self.repository.load_members()?.into_records();

        let index = members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| DomainError::not_found("Member", id))?;
        let removed = members.remove(index);

        self.repository.save_members(&members)?;
        info!("Removed member {}", id);
        Ok(removed)
    }

    // ========================================================================
    // BRANCHES
    // ========================================================================

    pub fn list_branches(&self) -> Result<Vec<Branch>> {
        Ok(self.repository.load_branches()?.into_records())
    }

    pub fn add_branch(&self, branch: Branch) -> Result<Branch> {
        let branch = branch.trimmed();
        branch.validate()?;
        let mut branches = self.repository.load_branches()?.into_records();

        if branches.iter().any(|b| b.name == branch.name) {
            return Err(DomainError::duplicate("Branch", &branch.name).into());
        }

        branches.push(branch.clone());
        self.repository.save_branches(&branches)?;
        info!("Added branch {}", branch.name);
        Ok(branch)
    }

    pub fn remove_branch(&self, name: &str) -> Result<Branch> {
        let name = name.trim();
        let mut branches = self.repository.load_branches()?.into_records();

        let index = branches
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| DomainError::not_found("Branch", name))?;
        let removed = branches.remove(index);

        self.repository.save_branches(&branches)?;
        info!("Removed branch {}", name);
        Ok(removed)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::CatalogError;
    use crate::repository::{CsvPaths, CsvRepository};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Catalog over fresh CSV files in a temp dir, with Dune and member M1
    pub(crate) fn seeded_catalog(today: NaiveDate) -> (TempDir, Catalog) {
        let dir = tempdir().unwrap();
        let paths = CsvPaths::in_dir(dir.path());
        let repo = CsvRepository::new(paths.clone());
        repo.init().unwrap();
        fs::write(
            &paths.books,
            "ISBN,Title,Author,Year,Genre\n978-0,Dune,Herbert,1965,SciFi\n",
        )
        .unwrap();
        fs::write(&paths.members, "ID,Name,Email,Phone\nM1,Ana,ana@example.com,555-0101\n").unwrap();

        let catalog = Catalog::with_clock(Box::new(repo), Box::new(FixedClock(today)));
        (dir, catalog)
    }

    fn domain(err: CatalogError) -> DomainError {
        err.as_domain().cloned().expect("expected a domain error")
    }

    #[test]
    fn test_add_and_list_books() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        catalog
            .add_book(Book::new("978-1", "Emma", "Austen", 1815, "Classic"))
            .unwrap();
        let books = catalog.list_books().unwrap();

        assert_eq!(books.len(), 2);
        assert!(books.iter().all(|b| b.available));
    }

    #[test]
    fn test_add_book_rejects_duplicate_isbn() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        let err = catalog
            .add_book(Book::new("978-0", "Dune again", "Herbert", 1965, "SciFi"))
            .unwrap_err();

        assert_eq!(domain(err), DomainError::duplicate("Book", "978-0"));
        assert_eq!(catalog.list_books().unwrap().len(), 1);
    }

    #[test]
    fn test_add_book_requires_fields() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        let err = catalog
            .add_book(Book::new("978-9", "", "Nobody", 2000, "Misc"))
            .unwrap_err();

        assert_eq!(domain(err), DomainError::MissingField("title"));
    }

    #[test]
    fn test_padded_keys_are_still_duplicates() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        let book_err = catalog
            .add_book(Book::new("978-0 ", "Dune", "Herbert", 1965, "SciFi"))
            .unwrap_err();
        let member_err = catalog
            .add_member(Member::new(" M1", "Ana", "ana@example.com", "555-0101"))
            .unwrap_err();
        catalog.add_branch(Branch::new("Central", "Main St 1")).unwrap();
        let branch_err = catalog
            .add_branch(Branch::new(" Central ", "Elm Ave 7"))
            .unwrap_err();

        assert_eq!(domain(book_err), DomainError::duplicate("Book", "978-0"));
        assert_eq!(domain(member_err), DomainError::duplicate("Member", "M1"));
        assert_eq!(domain(branch_err), DomainError::duplicate("Branch", "Central"));
        assert_eq!(catalog.list_books().unwrap().len(), 1);
        assert_eq!(catalog.list_members().unwrap().len(), 1);
        assert_eq!(catalog.list_branches().unwrap().len(), 1);
    }

    #[test]
    fn test_added_book_matches_what_is_stored() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        let added = catalog
            .add_book(Book::new(" 978-1", "Emma ", "Austen", 1815, " Classic"))
            .unwrap();

        assert_eq!(added, Book::new("978-1", "Emma", "Austen", 1815, "Classic"));
        assert_eq!(catalog.list_books().unwrap()[1], added);
        assert_eq!(catalog.remove_book(" 978-1 ").unwrap().isbn, "978-1");
    }

    #[test]
    fn test_edit_book() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        catalog
            .edit_book(
                "978-0",
                BookUpdate {
                    title: "Dune".to_string(),
                    author: "Frank Herbert".to_string(),
                    year: 1965,
                    genre: "Science Fiction".to_string(),
                },
            )
            .unwrap();

        let books = catalog.list_books().unwrap();
        assert_eq!(books[0].author, "Frank Herbert");
        assert_eq!(books[0].genre, "Science Fiction");
    }

    #[test]
    fn test_edit_unknown_book_is_not_found() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        let err = catalog
            .edit_book(
                "000-0",
                BookUpdate {
                    title: "X".to_string(),
                    author: "Y".to_string(),
                    year: 2000,
                    genre: "Z".to_string(),
                },
            )
            .unwrap_err();

        assert_eq!(domain(err), DomainError::not_found("Book", "000-0"));
    }

    #[test]
    fn test_remove_book() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        let removed = catalog.remove_book("978-0").unwrap();

        assert_eq!(removed.title, "Dune");
        assert!(catalog.list_books().unwrap().is_empty());
        assert!(catalog.remove_book("978-0").is_err());
    }

    #[test]
    fn test_member_lifecycle() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        catalog
            .add_member(Member::new("M2", "Luis", "luis@example.com", "555-0102"))
            .unwrap();
        catalog
            .edit_member(
                "M2",
                MemberUpdate {
                    name: "Luis Gomez".to_string(),
                    email: "luis@example.com".to_string(),
                    phone: "555-0199".to_string(),
                },
            )
            .unwrap();
        let err = catalog
            .add_member(Member::new("M1", "Clash", "c@example.com", "1"))
            .unwrap_err();
        catalog.remove_member("M1").unwrap();

        let members = catalog.list_members().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Luis Gomez");
        assert_eq!(domain(err), DomainError::duplicate("Member", "M1"));
    }

    #[test]
    fn test_branch_lifecycle() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));

        catalog.add_branch(Branch::new("Central", "Main St 1")).unwrap();
        catalog.add_branch(Branch::new("North", "Elm Ave 7")).unwrap();
        catalog.remove_branch("Central").unwrap();

        let branches = catalog.list_branches().unwrap();
        assert_eq!(branches, vec![Branch::new("North", "Elm Ave 7")]);

        let err = catalog.remove_branch("Central").unwrap_err();
        assert_eq!(domain(err), DomainError::not_found("Branch", "Central"));
    }

    #[test]
    fn test_missing_file_surfaces_io_error() {
        let dir = tempdir().unwrap();
        let repo = CsvRepository::new(CsvPaths::in_dir(dir.path()));
        let catalog = Catalog::new(Box::new(repo));

        let err = catalog.list_members().unwrap_err();

        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
