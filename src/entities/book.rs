// 📚 Book Entity - keyed by ISBN
//
// Availability is not stored in the books file. It is derived from the
// loans collection every time the catalog loads books (see lifecycle.rs).

use serde::{Deserialize, Serialize};

use crate::error::{require, DomainError};

// ============================================================================
// BOOK ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Natural key, unique within the collection
    pub isbn: String,
    pub title: String,
    pub author: String,
    /// Publication year
    pub year: i32,
    pub genre: String,
    /// False iff the book has an active loan
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Book {
    /// Create a new book. New books are always available.
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        year: i32,
        genre: impl Into<String>,
    ) -> Self {
        Book {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            year,
            genre: genre.into(),
            available: true,
        }
    }

    /// Check that every required text field is filled in
    pub fn validate(&self) -> Result<(), DomainError> {
        require("isbn", &self.isbn)?;
        require("title", &self.title)?;
        require("author", &self.author)?;
        require("genre", &self.genre)?;
        Ok(())
    }

    /// The book as it reads back from storage: text fields trimmed.
    pub fn trimmed(self) -> Self {
        Book {
            isbn: self.isbn.trim().to_string(),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self.genre.trim().to_string(),
            ..self
        }
    }

    /// Apply an edit. The ISBN never changes.
    pub fn apply(&mut self, update: BookUpdate) {
        self.title = update.title.trim().to_string();
        self.author = update.author.trim().to_string();
        self.year = update.year;
        self.genre = update.genre.trim().to_string();
    }
}

/// Editable fields of a book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    pub year: i32,
    pub genre: String,
}

impl BookUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        require("title", &self.title)?;
        require("author", &self.author)?;
        require("genre", &self.genre)?;
        Ok(())
    }
}

/// Find the first book with this ISBN
pub fn find<'a>(books: &'a [Book], isbn: &str) -> Option<&'a Book> {
    books.iter().find(|b| b.isbn == isbn)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_creation() {
        let book = Book::new("978-0", "Dune", "Herbert", 1965, "SciFi");

        assert_eq!(book.isbn, "978-0");
        assert_eq!(book.year, 1965);
        assert!(book.available);
    }

    #[test]
    fn test_book_validate_missing_title() {
        let book = Book::new("978-0", "", "Herbert", 1965, "SciFi");

        assert_eq!(book.validate(), Err(DomainError::MissingField("title")));
    }

    #[test]
    fn test_book_apply_keeps_isbn() {
        let mut book = Book::new("978-0", "Dune", "Herbert", 1965, "SciFi");
        book.apply(BookUpdate {
            title: "Dune Messiah".to_string(),
            author: "Frank Herbert".to_string(),
            year: 1969,
            genre: "Science Fiction".to_string(),
        });

        assert_eq!(book.isbn, "978-0");
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.year, 1969);
    }

    #[test]
    fn test_find_returns_first_match() {
        let books = vec![
            Book::new("978-0", "Dune", "Herbert", 1965, "SciFi"),
            Book::new("978-0", "Dune (copy)", "Herbert", 1965, "SciFi"),
        ];

        assert_eq!(find(&books, "978-0").map(|b| b.title.as_str()), Some("Dune"));
        assert!(find(&books, "missing").is_none());
    }
}
