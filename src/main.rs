mod db;
mod error;
mod format;
mod logging;
mod models;
mod store;
mod theme;
mod tui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use db::Database;
use format::{format_salary, or_dash, truncate};
use logging::LogDestination;
use models::{JobRecord, Status, StatusFilter};
use std::path::PathBuf;
use store::{JobStore, SaveOutcome};

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Track job applications - add, edit, search, and filter")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "JOBTRACK_DB")]
    db: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a job application
    Add {
        /// Company name
        company: String,

        /// Role or title
        role: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// List jobs
    List {
        /// Filter by status (all, applied, interview, offer, rejected)
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,

        /// Case-insensitive search over company, role, location and notes
        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Show job details
    Show {
        /// Job number as shown by `list`
        number: usize,
    },

    /// Edit a job; only the given fields change
    Edit {
        /// Job number as shown by `list`
        number: usize,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a job
    Delete {
        /// Job number as shown by `list`
        number: usize,
    },

    /// Show or toggle the color theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },

    /// Browse and edit jobs interactively
    Browse,
}

#[derive(Args)]
struct FieldArgs {
    #[arg(short, long)]
    location: Option<String>,

    /// Free text, e.g. 65000
    #[arg(long)]
    salary: Option<String>,

    /// Application date (YYYY-MM-DD, or "today")
    #[arg(short, long)]
    date: Option<String>,

    /// Applied, Interview, Offer or Rejected
    #[arg(short, long)]
    status: Option<Status>,

    #[arg(long)]
    link: Option<String>,

    #[arg(short, long)]
    notes: Option<String>,
}

impl FieldArgs {
    fn apply(self, job: &mut JobRecord) {
        if let Some(location) = self.location {
            job.location = location;
        }
        if let Some(salary) = self.salary {
            job.salary = salary;
        }
        if let Some(date) = self.date {
            job.date = expand_date(&date);
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(link) = self.link {
            job.link = link;
        }
        if let Some(notes) = self.notes {
            job.notes = notes;
        }
    }
}

fn expand_date(date: &str) -> String {
    if date.eq_ignore_ascii_case("today") {
        chrono::Local::now().format("%Y-%m-%d").to_string()
    } else {
        date.to_string()
    }
}

/// `list` numbers are 1-based positions.
fn position(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .context("Job numbers start at 1")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = logging::level_for(cli.verbose);

    let browsing = matches!(cli.command, Commands::Browse);
    if browsing {
        let dir = db::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        logging::initialize(LogDestination::File(&dir.join("jobtrack.log")), level);
    } else {
        logging::initialize(LogDestination::Terminal, level);
    }

    let db = Database::open(cli.db.as_deref())?;
    log::debug!("Using database at {}", db.path().display());
    let mut store = JobStore::load(&db, theme::system_prefers_dark())?;

    match cli.command {
        Commands::Add {
            company,
            role,
            fields,
        } => {
            let mut job = JobRecord::new(company, role);
            fields.apply(&mut job);
            if let SaveOutcome::Added(i) = store.save(job)? {
                println!("Added job #{}", i + 1);
            }
        }

        Commands::List { status, search } => {
            let jobs = store.query(status, search.as_deref().unwrap_or(""));
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<5} {:<10} {:<22} {:<22} {:<12} {:>12}",
                    "#", "STATUS", "COMPANY", "ROLE", "DATE", "SALARY"
                );
                println!("{}", "-".repeat(88));
                for listed in jobs {
                    let job = listed.job;
                    println!(
                        "{:<5} {:<10} {:<22} {:<22} {:<12} {:>12}",
                        listed.index + 1,
                        job.status,
                        truncate(or_dash(&job.company), 20),
                        truncate(or_dash(&job.role), 20),
                        job.date,
                        truncate(&format_salary(&job.salary), 12)
                    );
                }
            }
        }

        Commands::Show { number } => {
            let index = position(number)?;
            match store.get(index) {
                Some(job) => print_job(index, job),
                None => println!("Job #{} not found.", number),
            }
        }

        Commands::Edit {
            number,
            company,
            role,
            fields,
        } => {
            store.start_edit(position(number)?)?;
            let form = store.form_mut();
            if let Some(company) = company {
                form.company = company;
            }
            if let Some(role) = role {
                form.role = role;
            }
            fields.apply(form);
            if let SaveOutcome::Updated(i) = store.submit()? {
                println!("Saved changes to job #{}", i + 1);
            }
        }

        Commands::Delete { number } => {
            let removed = store.delete(position(number)?)?;
            println!(
                "Deleted job #{} ({} — {})",
                number,
                or_dash(&removed.company),
                or_dash(&removed.role)
            );
        }

        Commands::Theme { toggle } => {
            let theme = if toggle {
                store.toggle_theme()?
            } else {
                store.theme()
            };
            println!("{}", theme.as_token());
        }

        Commands::Browse => {
            tui::run_browse(&mut store)?;
        }
    }

    Ok(())
}

fn print_job(index: usize, job: &JobRecord) {
    println!("Job #{}", index + 1);
    println!("Company: {}", or_dash(&job.company));
    println!("Role: {}", or_dash(&job.role));
    println!("Status: {}", job.status);
    if !job.location.is_empty() {
        println!("Location: {}", job.location);
    }
    if !job.salary.is_empty() {
        println!("Salary: {}", format_salary(&job.salary));
    }
    if !job.date.is_empty() {
        println!("Date: {}", job.date);
    }
    if !job.link.is_empty() {
        println!("Link: {}", job.link);
    }
    if !job.notes.is_empty() {
        println!("\n--- Notes ---\n{}", textwrap::fill(&job.notes, 80));
    }
}
