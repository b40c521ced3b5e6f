// 🗃️ SQLite backend - same load/save contract as the CSV files
//
// Each save deletes and reinserts the whole table inside one transaction, so
// behaviour matches the full-file rewrite but a failed save rolls back.
// Loans keep their natural-key columns and are joined on load exactly like
// the CSV loader does.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::codec::{self, Loaded, SkipReason};
use crate::entities::{Book, Branch, Loan, Member};
use crate::error::Result;
use crate::repository::Repository;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS books (
            isbn TEXT NOT NULL,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            year INTEGER NOT NULL,
            genre TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS members (
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS loans (
            isbn TEXT NOT NULL,
            member_id TEXT NOT NULL,
            loan_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            returned_on TEXT
        );
        CREATE TABLE IF NOT EXISTS branches (
            name TEXT NOT NULL,
            address TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_loans_isbn ON loans(isbn);",
    )?;

    Ok(())
}

/// Repository backed by a single SQLite database
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        Ok(SqliteRepository { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteRepository { conn })
    }
}

impl Repository for SqliteRepository {
    fn load_books(&self) -> Result<Loaded<Book>> {
        let mut stmt = self
            .conn
            .prepare("SELECT isbn, title, author, year, genre FROM books ORDER BY rowid")?;
        let books = stmt
            .query_map([], |row| {
                Ok(Book::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Loaded {
            records: books,
            skipped: Vec::new(),
        })
    }

    fn save_books(&self, books: &[Book]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM books", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO books (isbn, title, author, year, genre) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for book in books {
                stmt.execute(params![book.isbn, book.title, book.author, book.year, book.genre])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_members(&self) -> Result<Loaded<Member>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, email, phone FROM members ORDER BY rowid")?;
        let members = stmt
            .query_map([], |row| {
                Ok(Member::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Loaded {
            records: members,
            skipped: Vec::new(),
        })
    }

    fn save_members(&self, members: &[Member]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM members", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO members (id, name, email, phone) VALUES (?1, ?2, ?3, ?4)")?;
            for member in members {
                stmt.execute(params![member.id, member.name, member.email, member.phone])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_loans(&self, books: &[Book], members: &[Member]) -> Result<Loaded<Loan>> {
        let mut stmt = self.conn.prepare(
            "SELECT rowid, isbn, member_id, loan_date, due_date, returned_on
             FROM loans ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    [
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    ],
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut loaded = Loaded::default();
        for (rowid, columns) in rows {
            let fields: Vec<&str> = columns.iter().map(String::as_str).collect();
            let parsed: std::result::Result<Loan, SkipReason> = codec::parse_loan(&fields, books, members);
            loaded.push("sqlite:loans", u64::try_from(rowid).unwrap_or(0), fields.join(","), parsed);
        }
        Ok(loaded)
    }

    fn save_loans(&self, loans: &[Loan]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM loans", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO loans (isbn, member_id, loan_date, due_date, returned_on)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for loan in loans {
                stmt.execute(params![
                    loan.isbn,
                    loan.member_id,
                    codec::format_date(loan.loan_date),
                    codec::format_date(loan.due_date),
                    loan.returned_on.map(codec::format_date),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_branches(&self) -> Result<Loaded<Branch>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, address FROM branches ORDER BY rowid")?;
        let branches = stmt
            .query_map([], |row| {
                Ok(Branch::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Loaded {
            records: branches,
            skipped: Vec::new(),
        })
    }

    fn save_branches(&self, branches: &[Branch]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM branches", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO branches (name, address) VALUES (?1, ?2)")?;
            for branch in branches {
                stmt.execute(params![branch.name, branch.address])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_books_round_trip() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let books = vec![
            Book::new("978-0", "Dune", "Herbert", 1965, "SciFi"),
            Book::new("978-1", "Emma", "Austen", 1815, "Classic"),
        ];

        repo.save_books(&books).unwrap();

        assert_eq!(repo.load_books().unwrap().records, books);
    }

    #[test]
    fn test_save_replaces_previous_rows() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.save_branches(&[Branch::new("Central", "Main St 1")]).unwrap();
        repo.save_branches(&[Branch::new("North", "Elm Ave 7")]).unwrap();

        let branches = repo.load_branches().unwrap().records;
        assert_eq!(branches, vec![Branch::new("North", "Elm Ave 7")]);
    }

    #[test]
    fn test_loans_join_and_skip_dangling() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let books = vec![Book::new("978-0", "Dune", "Herbert", 1965, "SciFi")];
        let members = vec![Member::new("M1", "Ana", "ana@example.com", "555-0101")];

        let mut returned = Loan::open("978-0", "M1", date(2024, 1, 1), 14).unwrap();
        returned.mark_returned(date(2024, 1, 10)).unwrap();
        let dangling = Loan::open("999-9", "M1", date(2024, 2, 1), 7).unwrap();
        let active = Loan::open("978-0", "M1", date(2024, 3, 1), 7).unwrap();
        repo.save_loans(&[returned.clone(), dangling, active.clone()]).unwrap();

        let loaded = repo.load_loans(&books, &members).unwrap();

        assert_eq!(loaded.records, vec![returned, active]);
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].reason, SkipReason::UnknownBook("999-9".to_string()));
    }
}
