// Entity Models
//
// Books and members are keyed by natural keys (ISBN, member id).
// Loans reference both by key; there is no surrogate id.
// Branches are an organizational aggregate populated by callers.

pub mod book;
pub mod member;
pub mod loan;
pub mod branch;

pub use book::{Book, BookUpdate};
pub use member::{Member, MemberUpdate};
pub use loan::Loan;
pub use branch::Branch;
