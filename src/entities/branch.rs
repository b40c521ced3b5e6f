// 🏛️ Branch - organizational aggregate
//
// Only name and address are persisted. The collections are filled by
// callers and are never derived from the books/members/loans files.

use serde::{Deserialize, Serialize};

use crate::entities::{Book, Loan, Member};
use crate::error::{require, DomainError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub address: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub books: Vec<Book>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loans: Vec<Loan>,
}

impl Branch {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Branch {
            name: name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    /// Name and address trimmed, as they read back from storage
    pub fn trimmed(self) -> Self {
        Branch {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require("name", &self.name)?;
        require("address", &self.address)?;
        Ok(())
    }

    pub fn add_book(&mut self, book: Book) {
        self.books.push(book);
    }

    pub fn add_member(&mut self, member: Member) {
        self.members.push(member);
    }

    /// Append a loan and mark the branch's copy of the book unavailable
    pub fn register_loan(&mut self, loan: Loan) {
        for book in self.books.iter_mut().filter(|b| b.isbn == loan.isbn) {
            book.available = false;
        }
        self.loans.push(loan);
    }

    pub fn available_books(&self) -> impl Iterator<Item = &Book> {
        self.books.iter().filter(|b| b.available)
    }
}
