// 🔄 Loan Lifecycle - Available ⇄ OnLoan per book
//
// Availability is not persisted in the books file; it is recomputed from the
// loans collection on every load. That keeps "available == no active loan"
// true even when a write fails half way: the loans file decides.
//
// Mutations persist books first and loans second. A failed books write
// leaves nothing changed; a failed loans write leaves the old loans, which
// still agree with the (unchanged) availability they imply.

use log::info;

use crate::catalog::{Catalog, Snapshot};
use crate::entities::{book, loan, member, Book, Loan};
use crate::error::{require, DomainError, Result};

/// Set `available` on every book from the active loans
pub fn reconcile_availability(books: &mut [Book], loans: &[Loan]) {
    for book in books.iter_mut() {
        book.available = loan::active_for(loans, &book.isbn).is_none();
    }
}

impl Catalog {
    /// Lend a book for `days` days starting today.
    ///
    /// Fails with `NotFound` for an unknown book or member and with
    /// `AlreadyLoaned` if the book has an active loan. With duplicate keys on
    /// file the first matching book/member is used.
    pub fn register_loan(&self, isbn: &str, member_id: &str, days: u32) -> Result<Loan> {
        let isbn = isbn.trim();
        let member_id = member_id.trim();
        require("isbn", isbn)?;
        require("member id", member_id)?;
        if days == 0 {
            return Err(DomainError::InvalidInput("loan period must be at least one day".to_string()).into());
        }

        let Snapshot {
            mut books,
            members,
            mut loans,
        } = self.snapshot()?;

        if book::find(&books, isbn).is_none() {
            return Err(DomainError::not_found("Book", isbn).into());
        }
        if member::find(&members, member_id).is_none() {
            return Err(DomainError::not_found("Member", member_id).into());
        }
        if loan::active_for(&loans, isbn).is_some() {
            return Err(DomainError::AlreadyLoaned {
                isbn: isbn.to_string(),
            }
            .into());
        }

        let new_loan = Loan::open(isbn, member_id, self.today(), days)?;
        loans.push(new_loan.clone());
        reconcile_availability(&mut books, &loans);

        self.repository().save_books(&books)?;
        self.repository().save_loans(&loans)?;

        info!(
            "Loan registered: {} -> {} until {}",
            isbn, member_id, new_loan.due_date
        );
        Ok(new_loan)
    }

    /// Return the active loan of the book with this ISBN.
    ///
    /// Books are selected by ISBN only; the loan row is whichever loan of that
    /// book is still active (there is at most one).
    pub fn return_loan(&self, isbn: &str) -> Result<Loan> {
        let isbn = isbn.trim();
        require("isbn", isbn)?;

        let Snapshot {
            mut books,
            mut loans,
            ..
        } = self.snapshot()?;

        if book::find(&books, isbn).is_none() {
            return Err(DomainError::not_found("Book", isbn).into());
        }

        let returned_on = self.today();
        let active = loans
            .iter_mut()
            .find(|l| l.isbn == isbn && l.is_active())
            .ok_or_else(|| DomainError::NoActiveLoan {
                isbn: isbn.to_string(),
            })?;
        active.mark_returned(returned_on)?;
        let returned = active.clone();
        reconcile_availability(&mut books, &loans);

        self.repository().save_books(&books)?;
        self.repository().save_loans(&loans)?;

        info!("Loan returned: {} by {} on {}", isbn, returned.member_id, returned_on);
        Ok(returned)
    }

    pub fn list_loans(&self) -> Result<Vec<Loan>> {
        Ok(self.snapshot()?.loans)
    }

    pub fn active_loans(&self) -> Result<Vec<Loan>> {
        Ok(self
            .snapshot()?
            .loans
            .into_iter()
            .filter(Loan::is_active)
            .collect())
    }

    /// Active loans past their expected return date
    pub fn overdue_loans(&self) -> Result<Vec<Loan>> {
        let today = self.today();
        Ok(self
            .snapshot()?
            .loans
            .into_iter()
            .filter(|l| l.is_overdue(today))
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
