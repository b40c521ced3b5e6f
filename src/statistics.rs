// 📊 Statistics - read-only views, recomputed on every call
//
// Loan duration is always "today minus loan date", for returned loans too.
// That is the long-standing behaviour of the catalog's statistics screen;
// `returned_on` is carried along so callers can measure closed loans
// themselves.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::entities::{book, Book, Loan};
use crate::error::Result;

/// Days a loan has been running, as shown in the statistics table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanDuration {
    pub isbn: String,
    pub title: String,
    pub member_id: String,
    pub loan_date: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub elapsed_days: i64,
}

/// Headline counts for the whole catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub total_books: usize,
    pub available_books: usize,
    pub members: usize,
    pub total_loans: usize,
    pub active_loans: usize,
    pub overdue_loans: usize,
}

/// Number of books per genre, ordered by genre name
pub fn genre_distribution(books: &[Book]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for book in books {
        *counts.entry(book.genre.clone()).or_insert(0) += 1;
    }
    counts
}

/// Elapsed days for every loan, in file order
pub fn loan_durations(loans: &[Loan], books: &[Book], today: NaiveDate) -> Vec<LoanDuration> {
    loans
        .iter()
        .map(|loan| LoanDuration {
            isbn: loan.isbn.clone(),
            title: book::find(books, &loan.isbn)
                .map(|b| b.title.clone())
                .unwrap_or_default(),
            member_id: loan.member_id.clone(),
            loan_date: loan.loan_date,
            returned_on: loan.returned_on,
            elapsed_days: loan.elapsed_days(today),
        })
        .collect()
}

impl Catalog {
    pub fn genre_distribution(&self) -> Result<BTreeMap<String, usize>> {
        let books = self.repository().load_books()?.into_records();
        Ok(genre_distribution(&books))
    }

    pub fn loan_elapsed_days(&self) -> Result<Vec<LoanDuration>> {
        let snapshot = self.snapshot()?;
        Ok(loan_durations(&snapshot.loans, &snapshot.books, self.today()))
    }

    pub fn summary(&self) -> Result<CatalogSummary> {
        let today = self.today();
        let snapshot = self.snapshot()?;

        Ok(CatalogSummary {
            total_books: snapshot.books.len(),
            available_books: snapshot.books.iter().filter(|b| b.available).count(),
            members: snapshot.members.len(),
            total_loans: snapshot.loans.len(),
            active_loans: snapshot.loans.iter().filter(|l| l.is_active()).count(),
            overdue_loans: snapshot.loans.iter().filter(|l| l.is_overdue(today)).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{date, seeded_catalog};
    use std::fs;

    #[test]
    fn test_genre_distribution() {
        let books = vec![
            Book::new("1", "Dune", "Herbert", 1965, "SciFi"),
            Book::new("2", "Emma", "Austen", 1815, "Classic"),
            Book::new("3", "Neuromancer", "Gibson", 1984, "SciFi"),
        ];

        let counts = genre_distribution(&books);

        assert_eq!(counts.get("SciFi"), Some(&2));
        assert_eq!(counts.get("Classic"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_genre_distribution_empty() {
        assert!(genre_distribution(&[]).is_empty());
    }

    /// Returned loans are still measured up to today, not to the return date
    #[test]
    fn test_elapsed_days_uses_today_even_when_returned() {
        let (dir, catalog) = seeded_catalog(date(2024, 3, 1));
        fs::write(
            dir.path().join("loans.csv"),
            "ISBN,MemberID,LoanDate,ExpectedReturnDate,ActualReturnDate\n\
             978-0,M1,2024-01-01,2024-01-15,2024-01-10\n\
             978-0,M1,2024-02-20,2024-03-05,\n",
        )
        .unwrap();

        let durations = catalog.loan_elapsed_days().unwrap();

        assert_eq!(durations.len(), 2);
        assert_eq!(durations[0].title, "Dune");
        assert_eq!(durations[0].returned_on, Some(date(2024, 1, 10)));
        assert_eq!(durations[0].elapsed_days, 60);
        assert_eq!(durations[1].elapsed_days, 10);
    }

    #[test]
    fn test_summary_counts() {
        let (_dir, catalog) = seeded_catalog(date(2024, 1, 1));
        catalog
            .add_book(Book::new("978-1", "Emma", "Austen", 1815, "Classic"))
            .unwrap();
        catalog.register_loan("978-0", "M1", 14).unwrap();

        let summary = catalog.summary().unwrap();

        assert_eq!(
            summary,
            CatalogSummary {
                total_books: 2,
                available_books: 1,
                members: 1,
                total_loans: 1,
                active_loans: 1,
                overdue_loans: 0,
            }
        );
        assert_eq!(catalog.genre_distribution().unwrap().get("Classic"), Some(&1));
    }
}
