// 📄 CSV Codec - one delimited text file per entity type
//
// Format: one header line, then one record per line, fields joined by a bare
// comma. There is no quoting or escaping: a field containing a comma or a
// newline corrupts its line. That is a limitation of the format, not
// something the codec tries to repair.
//
// Loading is tolerant per line. A malformed line or a loan that points at an
// unknown book/member is skipped, logged and reported in `Loaded::skipped`.
// Only an unreadable file fails the whole load.

use std::fmt;
use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ByteRecord, QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::{debug, warn};
use serde::Serialize;

use crate::entities::{book, member, Book, Branch, Loan, Member};
use crate::error::{CatalogError, Result};

// ============================================================================
// HEADERS
// ============================================================================

pub const BOOK_HEADER: [&str; 5] = ["ISBN", "Title", "Author", "Year", "Genre"];
pub const MEMBER_HEADER: [&str; 4] = ["ID", "Name", "Email", "Phone"];
pub const LOAN_HEADER: [&str; 5] = [
    "ISBN",
    "MemberID",
    "LoanDate",
    "ExpectedReturnDate",
    "ActualReturnDate",
];
pub const BRANCH_HEADER: [&str; 2] = ["Name", "Address"];

/// Calendar date text form used in every file
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// DATES
// ============================================================================

/// Result of reading a date field.
///
/// "Empty" and "could not parse" are different things: only `Absent` may be
/// read as "not returned yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateField {
    Absent,
    Present(NaiveDate),
    Invalid(String),
}

pub fn parse_date(text: &str) -> DateField {
    let text = text.trim();
    if text.is_empty() {
        return DateField::Absent;
    }
    match NaiveDate::parse_from_str(text, DATE_FORMAT) {
        Ok(date) => DateField::Present(date),
        Err(_) => DateField::Invalid(text.to_string()),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// ============================================================================
// LOAD REPORT
// ============================================================================

/// Why a line was left out of a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Wrong number of fields
    FieldCount { expected: usize, found: usize },
    /// Year is not an integer
    InvalidYear(String),
    /// Mandatory date missing, or a date that does not parse
    InvalidDate { field: &'static str, value: String },
    /// Line could not be decoded at all (e.g. not UTF-8)
    Unreadable(String),
    /// Loan references a book that is not loaded
    UnknownBook(String),
    /// Loan references a member that is not loaded
    UnknownMember(String),
}

impl SkipReason {
    /// Broken cross-file reference, as opposed to a malformed line
    pub fn is_reference(&self) -> bool {
        matches!(self, SkipReason::UnknownBook(_) | SkipReason::UnknownMember(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}", expected, found)
            }
            SkipReason::InvalidYear(value) => write!(f, "invalid year '{}'", value),
            SkipReason::InvalidDate { field, value } => {
                write!(f, "invalid {} '{}'", field, value)
            }
            SkipReason::Unreadable(message) => write!(f, "unreadable line: {}", message),
            SkipReason::UnknownBook(isbn) => write!(f, "unknown book {}", isbn),
            SkipReason::UnknownMember(id) => write!(f, "unknown member {}", id),
        }
    }
}

/// A line that was skipped during a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number in the file (header is line 1)
    pub line: u64,
    pub reason: SkipReason,
    /// The line as it appears in the file, without its terminator
    pub raw: String,
}

/// Records that loaded plus the lines that did not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Loaded {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Loaded<T> {
    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// Collect one parse outcome, logging it if it was skipped
    pub(crate) fn push(&mut self, source: &str, line: u64, raw: String, parsed: std::result::Result<T, SkipReason>) {
        match parsed {
            Ok(record) => self.records.push(record),
            Err(reason) => {
                warn!("Skipping line {} of {}: {} [{}]", line, source, reason, raw);
                self.skipped.push(SkippedLine { line, reason, raw });
            }
        }
    }
}

// ============================================================================
// FIELD PARSERS (shared with the SQLite backend)
// ============================================================================

/// Fields of one record, in file order
pub trait CsvRecord {
    const HEADER: &'static [&'static str];

    fn to_fields(&self) -> Vec<String>;
}

impl CsvRecord for Book {
    const HEADER: &'static [&'static str] = &BOOK_HEADER;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.isbn.clone(),
            self.title.clone(),
            self.author.clone(),
            self.year.to_string(),
            self.genre.clone(),
        ]
    }
}

impl CsvRecord for Member {
    const HEADER: &'static [&'static str] = &MEMBER_HEADER;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
        ]
    }
}

impl CsvRecord for Loan {
    const HEADER: &'static [&'static str] = &LOAN_HEADER;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.isbn.clone(),
            self.member_id.clone(),
            format_date(self.loan_date),
            format_date(self.due_date),
            self.returned_on.map(format_date).unwrap_or_default(),
        ]
    }
}

impl CsvRecord for Branch {
    const HEADER: &'static [&'static str] = &BRANCH_HEADER;

    fn to_fields(&self) -> Vec<String> {
        vec![self.name.clone(), self.address.clone()]
    }
}

pub fn parse_book(fields: &[&str]) -> std::result::Result<Book, SkipReason> {
    let [isbn, title, author, year, genre] = fields else {
        return Err(SkipReason::FieldCount {
            expected: BOOK_HEADER.len(),
            found: fields.len(),
        });
    };
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| SkipReason::InvalidYear(year.to_string()))?;

    Ok(Book::new(*isbn, *title, *author, year, *genre))
}

pub fn parse_member(fields: &[&str]) -> std::result::Result<Member, SkipReason> {
    let [id, name, email, phone] = fields else {
        return Err(SkipReason::FieldCount {
            expected: MEMBER_HEADER.len(),
            found: fields.len(),
        });
    };

    Ok(Member::new(*id, *name, *email, *phone))
}

pub fn parse_branch(fields: &[&str]) -> std::result::Result<Branch, SkipReason> {
    let [name, address] = fields else {
        return Err(SkipReason::FieldCount {
            expected: BRANCH_HEADER.len(),
            found: fields.len(),
        });
    };

    Ok(Branch::new(*name, *address))
}

/// Parse a loan and resolve its book/member keys against loaded collections.
///
/// The trailing return-date field may be missing entirely (4 fields).
pub fn parse_loan(
    fields: &[&str],
    books: &[Book],
    members: &[Member],
) -> std::result::Result<Loan, SkipReason> {
    let (isbn, member_id, loan_date, due_date, returned_on) = match fields {
        [i, m, l, d] => (*i, *m, *l, *d, ""),
        [i, m, l, d, r] => (*i, *m, *l, *d, *r),
        _ => {
            return Err(SkipReason::FieldCount {
                expected: LOAN_HEADER.len(),
                found: fields.len(),
            })
        }
    };

    if book::find(books, isbn).is_none() {
        return Err(SkipReason::UnknownBook(isbn.to_string()));
    }
    if member::find(members, member_id).is_none() {
        return Err(SkipReason::UnknownMember(member_id.to_string()));
    }

    let loan_date = required_date("loan date", loan_date)?;
    let due_date = required_date("expected return date", due_date)?;
    let returned_on = match parse_date(returned_on) {
        DateField::Absent => None,
        DateField::Present(date) => Some(date),
        DateField::Invalid(value) => {
            return Err(SkipReason::InvalidDate {
                field: "actual return date",
                value,
            })
        }
    };

    Ok(Loan {
        isbn: isbn.to_string(),
        member_id: member_id.to_string(),
        loan_date,
        due_date,
        returned_on,
    })
}

fn required_date(field: &'static str, text: &str) -> std::result::Result<NaiveDate, SkipReason> {
    match parse_date(text) {
        DateField::Present(date) => Ok(date),
        DateField::Absent => Err(SkipReason::InvalidDate {
            field,
            value: String::new(),
        }),
        DateField::Invalid(value) => Err(SkipReason::InvalidDate { field, value }),
    }
}

// ============================================================================
// FILE I/O
// ============================================================================

/// Read every data line of `path`, handing the trimmed fields to `parse`.
///
/// The reader discards empty lines, so they are found by scanning the bytes
/// between one record and the next. Each is handed to `parse` with no fields,
/// which reports it as a field-count mismatch.
fn read_lines<T, F>(path: &Path, mut parse: F) -> Result<Loaded<T>>
where
    F: FnMut(&[&str]) -> std::result::Result<T, SkipReason>,
{
    let bytes = fs::read(path).map_err(|e| CatalogError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .terminator(Terminator::Any(b'\n'))
        .from_reader(bytes.as_slice());
    reader.byte_headers().map_err(|e| CatalogError::csv(path, e))?;

    let source = path.display().to_string();
    let mut loaded = Loaded::default();
    let mut record = ByteRecord::new();

    loop {
        let start = reader.position().clone();
        if !reader
            .read_byte_record(&mut record)
            .map_err(|e| CatalogError::csv(path, e))?
        {
            break;
        }

        let offset = usize::try_from(start.byte()).unwrap_or(usize::MAX);
        let rest = bytes.get(offset..).unwrap_or_default();
        let blank = rest.iter().take_while(|&&b| b == b'\n').count();
        for i in 0..blank {
            loaded.push(&source, start.line() + i as u64, String::new(), parse(&[]));
        }

        // No quoting: the fields joined by commas are exactly the line.
        let len = record.as_slice().len() + record.len().saturating_sub(1);
        let raw = rest
            .get(blank..blank + len)
            .map(String::from_utf8_lossy)
            .unwrap_or_default()
            .trim_end_matches('\r')
            .to_string();

        let parsed = match StringRecord::from_byte_record(record.clone()) {
            Ok(text) => {
                let mut fields: Vec<&str> = text.iter().map(str::trim).collect();
                if fields == [""] {
                    fields.clear();
                }
                parse(&fields)
            }
            Err(err) => Err(SkipReason::Unreadable(err.to_string())),
        };
        loaded.push(&source, start.line() + blank as u64, raw, parsed);
    }

    debug!(
        "Loaded {} records from {} ({} skipped)",
        loaded.records.len(),
        source,
        loaded.skipped.len()
    );
    Ok(loaded)
}

/// Rewrite `path` with a header and every record. Not atomic: a failure
/// part way leaves a partially written file.
pub fn write_records<T: CsvRecord>(path: &Path, records: &[T]) -> Result<()> {
    let file = File::create(path).map_err(|e| CatalogError::io(path, e))?;
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);

    writer
        .write_record(T::HEADER)
        .map_err(|e| CatalogError::csv(path, e))?;
    for record in records {
        writer
            .write_record(record.to_fields())
            .map_err(|e| CatalogError::csv(path, e))?;
    }
    writer.flush().map_err(|e| CatalogError::io(path, e))?;

    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn decode_books(path: &Path) -> Result<Loaded<Book>> {
    read_lines(path, parse_book)
}

pub fn decode_members(path: &Path) -> Result<Loaded<Member>> {
    read_lines(path, parse_member)
}

pub fn decode_loans(path: &Path, books: &[Book], members: &[Member]) -> Result<Loaded<Loan>> {
    read_lines(path, |fields| parse_loan(fields, books, members))
}

pub fn decode_branches(path: &Path) -> Result<Loaded<Branch>> {
    read_lines(path, parse_branch)
}

// ============================================================================
// TESTS
// ============================================================================
