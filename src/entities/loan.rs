// 🔖 Loan Entity - one book lent to one member
//
// Identity is (isbn, member_id, loan_date). Created only by loan
// registration; the only mutation afterwards is setting the return date,
// exactly once. Loans are never deleted.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Book reference (natural key)
    pub isbn: String,
    /// Member reference (natural key)
    pub member_id: String,
    pub loan_date: NaiveDate,
    /// Expected return date
    pub due_date: NaiveDate,
    /// Actual return date, None while the loan is outstanding
    pub returned_on: Option<NaiveDate>,
}

impl Loan {
    /// Open a loan on `loan_date` lasting `days` days.
    ///
    /// Fails with `InvalidInput` when the due date would overflow the calendar.
    pub fn open(
        isbn: impl Into<String>,
        member_id: impl Into<String>,
        loan_date: NaiveDate,
        days: u32,
    ) -> Result<Self, DomainError> {
        let due_date = loan_date
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(|| DomainError::InvalidInput(format!("loan period of {} days is out of range", days)))?;

        Ok(Loan {
            isbn: isbn.into(),
            member_id: member_id.into(),
            loan_date,
            due_date,
            returned_on: None,
        })
    }

    /// Active = not yet returned
    pub fn is_active(&self) -> bool {
        self.returned_on.is_none()
    }

    /// Record the return. A loan can only be returned once.
    pub fn mark_returned(&mut self, on: NaiveDate) -> Result<(), DomainError> {
        if !self.is_active() {
            return Err(DomainError::NoActiveLoan {
                isbn: self.isbn.clone(),
            });
        }
        self.returned_on = Some(on);
        Ok(())
    }

    /// Outstanding past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && today > self.due_date
    }

    /// Days between the loan date and `today`
    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (today - self.loan_date).num_days()
    }
}

/// Find the active loan for a book, if any
pub fn active_for<'a>(loans: &'a [Loan], isbn: &str) -> Option<&'a Loan> {
    loans.iter().find(|l| l.isbn == isbn && l.is_active())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_open_sets_due_date() {
        let loan = Loan::open("978-0", "M1", date(2024, 1, 1), 14).unwrap();

        assert_eq!(loan.due_date, date(2024, 1, 15));
        assert!(loan.is_active());
    }

    #[test]
    fn test_open_across_month_end() {
        let loan = Loan::open("978-0", "M1", date(2024, 2, 20), 10).unwrap();

        assert_eq!(loan.due_date, date(2024, 3, 1));
    }

    #[test]
    fn test_mark_returned_only_once() {
        let mut loan = Loan::open("978-0", "M1", date(2024, 1, 1), 14).unwrap();

        loan.mark_returned(date(2024, 1, 10)).unwrap();
        let second = loan.mark_returned(date(2024, 1, 11));

        assert_eq!(loan.returned_on, Some(date(2024, 1, 10)));
        assert_eq!(
            second,
            Err(DomainError::NoActiveLoan {
                isbn: "978-0".to_string()
            })
        );
    }

    #[test]
    fn test_overdue() {
        let mut loan = Loan::open("978-0", "M1", date(2024, 1, 1), 14).unwrap();

        assert!(!loan.is_overdue(date(2024, 1, 15)));
        assert!(loan.is_overdue(date(2024, 1, 16)));

        loan.mark_returned(date(2024, 1, 20)).unwrap();
        assert!(!loan.is_overdue(date(2024, 1, 21)));
    }

    #[test]
    fn test_active_for_ignores_returned() {
        let mut returned = Loan::open("978-0", "M1", date(2024, 1, 1), 7).unwrap();
        returned.mark_returned(date(2024, 1, 5)).unwrap();
        let loans = vec![returned];

        assert!(active_for(&loans, "978-0").is_none());
    }
}
