// Library Catalog - command line front end
// Thin adapter: parses arguments, calls one catalog operation, prints it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use library_catalog::{
    Book, BookUpdate, Branch, Catalog, CatalogConfig, Loan, Member, MemberUpdate, Repository,
    SkippedLine,
};

/// Library catalog: books, members, loans and branches
#[derive(Parser, Debug)]
#[command(name = "library-catalog", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "catalog.toml")]
    config: PathBuf,

    /// Override the data directory from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create any missing data file
    Init,
    /// Report lines that fail to load
    Check,
    #[command(subcommand)]
    Books(BookCommand),
    #[command(subcommand)]
    Members(MemberCommand),
    #[command(subcommand)]
    Loans(LoanCommand),
    #[command(subcommand)]
    Branches(BranchCommand),
    #[command(subcommand)]
    Stats(StatsCommand),
}

#[derive(Args, Debug)]
struct BookFields {
    title: String,
    author: String,
    year: i32,
    genre: String,
}

#[derive(Subcommand, Debug)]
enum BookCommand {
    List,
    Add {
        isbn: String,
        #[command(flatten)]
        fields: BookFields,
    },
    Edit {
        isbn: String,
        #[command(flatten)]
        fields: BookFields,
    },
    Remove {
        isbn: String,
    },
}

#[derive(Args, Debug)]
struct MemberFields {
    name: String,
    email: String,
    phone: String,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    List,
    Add {
        id: String,
        #[command(flatten)]
        fields: MemberFields,
    },
    Edit {
        id: String,
        #[command(flatten)]
        fields: MemberFields,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum LoanCommand {
    List {
        /// Only loans not yet returned
        #[arg(long, conflicts_with = "overdue")]
        active: bool,
        /// Only active loans past their due date
        #[arg(long)]
        overdue: bool,
    },
    /// Lend a book to a member for a number of days
    Register {
        isbn: String,
        member_id: String,
        days: u32,
    },
    /// Return the active loan of a book
    Return {
        isbn: String,
    },
}

#[derive(Subcommand, Debug)]
enum BranchCommand {
    List,
    Add { name: String, address: String },
    Remove { name: String },
}

#[derive(Subcommand, Debug)]
enum StatsCommand {
    /// Books per genre
    Genres,
    /// Days each loan has been running
    Durations,
    /// Headline counts
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = CatalogConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }

    let catalog = Catalog::open(&config).context("Failed to open catalog storage")?;
    run(&cli, &catalog)
}

fn run(cli: &Cli, catalog: &Catalog) -> Result<()> {
    let json = cli.json;

    match &cli.command {
        Command::Init => {
            println!("✓ Catalog ready ({} backend)", catalog.repository().backend());
        }
        Command::Check => check(catalog.repository(), json)?,

        Command::Books(cmd) => match cmd {
            BookCommand::List => print_books(&catalog.list_books()?, json)?,
            BookCommand::Add { isbn, fields } => {
                let book = catalog.add_book(Book::new(
                    isbn.as_str(),
                    fields.title.as_str(),
                    fields.author.as_str(),
                    fields.year,
                    fields.genre.as_str(),
                ))?;
                print_done(&book, json, || format!("✓ Added book {} ({})", book.isbn, book.title))?;
            }
            BookCommand::Edit { isbn, fields } => {
                let book = catalog.edit_book(
                    isbn,
                    BookUpdate {
                        title: fields.title.clone(),
                        author: fields.author.clone(),
                        year: fields.year,
                        genre: fields.genre.clone(),
                    },
                )?;
                print_done(&book, json, || format!("✓ Updated book {}", book.isbn))?;
            }
            BookCommand::Remove { isbn } => {
                let book = catalog.remove_book(isbn)?;
                print_done(&book, json, || format!("✓ Removed book {}", book.isbn))?;
            }
        },

        Command::Members(cmd) => match cmd {
            MemberCommand::List => {
                let members = catalog.list_members()?;
                if json {
                    print_json(&members)?;
                } else {
                    for m in &members {
                        println!("{:<10} {:<24} {:<28} {}", m.id, m.name, m.email, m.phone);
                    }
                    println!("\n{} members", members.len());
                }
            }
            MemberCommand::Add { id, fields } => {
                let member = catalog.add_member(Member::new(
                    id.as_str(),
                    fields.name.as_str(),
                    fields.email.as_str(),
                    fields.phone.as_str(),
                ))?;
                print_done(&member, json, || format!("✓ Added member {} ({})", member.id, member.name))?;
            }
            MemberCommand::Edit { id, fields } => {
                let member = catalog.edit_member(
                    id,
                    MemberUpdate {
                        name: fields.name.clone(),
                        email: fields.email.clone(),
                        phone: fields.phone.clone(),
                    },
                )?;
                print_done(&member, json, || format!("✓ Updated member {}", member.id))?;
            }
            MemberCommand::Remove { id } => {
                let member = catalog.remove_member(id)?;
                print_done(&member, json, || format!("✓ Removed member {}", member.id))?;
            }
        },

        Command::Loans(cmd) => match cmd {
            LoanCommand::List { active, overdue } => {
                let loans = if *overdue {
                    catalog.overdue_loans()?
                } else if *active {
                    catalog.active_loans()?
                } else {
                    catalog.list_loans()?
                };
                print_loans(&loans, json)?;
            }
            LoanCommand::Register {
                isbn,
                member_id,
                days,
            } => {
                let loan = catalog.register_loan(isbn, member_id, *days)?;
                print_done(&loan, json, || {
                    format!("✓ Lent {} to {} until {}", loan.isbn, loan.member_id, loan.due_date)
                })?;
            }
            LoanCommand::Return { isbn } => {
                let loan = catalog.return_loan(isbn)?;
                print_done(&loan, json, || format!("✓ Returned {} from {}", loan.isbn, loan.member_id))?;
            }
        },

        Command::Branches(cmd) => match cmd {
            BranchCommand::List => {
                let branches = catalog.list_branches()?;
                if json {
                    print_json(&branches)?;
                } else {
                    for b in &branches {
                        println!("{:<20} {}", b.name, b.address);
                    }
                }
            }
            BranchCommand::Add { name, address } => {
                let branch = catalog.add_branch(Branch::new(name.as_str(), address.as_str()))?;
                print_done(&branch, json, || format!("✓ Added branch {}", branch.name))?;
            }
            BranchCommand::Remove { name } => {
                let branch = catalog.remove_branch(name)?;
                print_done(&branch, json, || format!("✓ Removed branch {}", branch.name))?;
            }
        },

        Command::Stats(cmd) => match cmd {
            StatsCommand::Genres => {
                let genres = catalog.genre_distribution()?;
                if json {
                    print_json(&genres)?;
                } else {
                    for (genre, count) in &genres {
                        println!("{:<20} {}", genre, count);
                    }
                }
            }
            StatsCommand::Durations => {
                let durations = catalog.loan_elapsed_days()?;
                if json {
                    print_json(&durations)?;
                } else {
                    for d in &durations {
                        println!("{:<16} {:<30} {} days", d.isbn, d.title, d.elapsed_days);
                    }
                }
            }
            StatsCommand::Summary => {
                let s = catalog.summary()?;
                if json {
                    print_json(&s)?;
                } else {
                    println!("📊 Catalog summary");
                    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
                    println!("Books:     {} ({} available)", s.total_books, s.available_books);
                    println!("Members:   {}", s.members);
                    println!("Loans:     {} ({} active, {} overdue)", s.total_loans, s.active_loans, s.overdue_loans);
                }
            }
        },
    }

    Ok(())
}

/// Load every collection and list the lines that were skipped
fn check(repository: &dyn Repository, json: bool) -> Result<()> {
    let books = repository.load_books()?;
    let members = repository.load_members()?;
    let loans = repository.load_loans(&books.records, &members.records)?;
    let branches = repository.load_branches()?;

    let report: Vec<(&str, &SkippedLine)> = books
        .skipped
        .iter()
        .map(|s| ("books", s))
        .chain(members.skipped.iter().map(|s| ("members", s)))
        .chain(loans.skipped.iter().map(|s| ("loans", s)))
        .chain(branches.skipped.iter().map(|s| ("branches", s)))
        .collect();

    if json {
        return print_json(&report);
    }

    println!(
        "✓ {} books, {} members, {} loans, {} branches loaded",
        books.records.len(),
        members.records.len(),
        loans.records.len(),
        branches.records.len()
    );
    if report.is_empty() {
        println!("✓ No skipped lines");
    } else {
        println!("⚠️  {} skipped lines:", report.len());
        for (file, skipped) in &report {
            println!("   {}:{}  {}  [{}]", file, skipped.line, skipped.reason, skipped.raw);
        }
    }
    Ok(())
}

fn print_books(books: &[Book], json: bool) -> Result<()> {
    if json {
        return print_json(&books);
    }
    for b in books {
        let status = if b.available { "available" } else { "on loan" };
        println!(
            "{:<16} {:<30} {:<20} {:>5} {:<12} {}",
            b.isbn, b.title, b.author, b.year, b.genre, status
        );
    }
    println!("\n{} books", books.len());
    Ok(())
}

fn print_loans(loans: &[Loan], json: bool) -> Result<()> {
    if json {
        return print_json(&loans);
    }
    for l in loans {
        let returned = l
            .returned_on
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<10} {}  due {}  returned {}",
            l.isbn, l.member_id, l.loan_date, l.due_date, returned
        );
    }
    println!("\n{} loans", loans.len());
    Ok(())
}

fn print_done<T: Serialize>(value: &T, json: bool, message: impl FnOnce() -> String) -> Result<()> {
    if json {
        print_json(value)
    } else {
        println!("{}", message());
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
