// Library Catalog - Core Library
// Exposes the persistence and loan-lifecycle core for the CLI, the API
// server and tests. Presentation lives entirely in the binaries.

pub mod error;
pub mod entities;
pub mod codec;
pub mod repository;
pub mod db;
pub mod clock;
pub mod config;
pub mod catalog;
pub mod lifecycle;
pub mod statistics;

// Re-export commonly used types
pub use error::{CatalogError, DomainError, Result};
pub use entities::{Book, BookUpdate, Branch, Loan, Member, MemberUpdate};
pub use codec::{DateField, Loaded, SkipReason, SkippedLine};
pub use repository::{CsvPaths, CsvRepository, Repository};
pub use db::SqliteRepository;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Backend, CatalogConfig};
pub use catalog::Catalog;
pub use statistics::{CatalogSummary, LoanDuration};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
