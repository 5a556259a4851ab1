use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use eyre::{Result, WrapErr, eyre};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::errors::{StoreError, ValidationError};
use crate::history::HistoryGenerator;
use crate::store::StudentStore;
use crate::student::Student;

mod config;
mod display;
mod errors;
mod history;
mod scholarship;
mod stats;
mod store;
mod student;

#[derive(Parser)]
#[command(name = "bursar", version, about = "Manage student records and scholarship stipends")]
struct Cli {
    /// Use FILE instead of bursar.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the database file from the configuration
    #[arg(short, long, value_name = "FILE")]
    database: Option<PathBuf>,
    /// Do not write changes back to the database file
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Set verbosity level
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all students
    List,
    /// Show one student with full stipend history
    Show { name: String, surname: String },
    /// Add a new student
    Add {
        name: String,
        surname: String,
        #[arg(short, long)]
        semester: i32,
        #[arg(short, long)]
        grade: f64,
        /// Budget-funded (defaults to paid)
        #[arg(short, long)]
        budget: bool,
        #[arg(short, long, default_value_t = 0)]
        missed: u32,
        #[arg(long)]
        social: bool,
        /// Generate grades for past semesters without history
        #[arg(long)]
        backfill: bool,
    },
    /// Remove a student
    Remove {
        #[arg(required_unless_present = "index")]
        name: Option<String>,
        #[arg(required_unless_present = "index")]
        surname: Option<String>,
        /// Remove by roster position instead (1-based, as listed)
        #[arg(long, conflicts_with_all = ["name", "surname"])]
        index: Option<usize>,
    },
    /// Change a student's name
    Rename {
        name: String,
        surname: String,
        new_name: String,
        new_surname: String,
    },
    /// Edit academic fields of a student
    Edit {
        name: String,
        surname: String,
        #[arg(long)]
        grade: Option<f64>,
        #[arg(long)]
        missed: Option<u32>,
        #[arg(long)]
        social: Option<bool>,
    },
    /// Move a student to another semester
    Advance {
        name: String,
        surname: String,
        semester: i32,
    },
    /// Switch a student between budget and paid funding
    Funding {
        name: String,
        surname: String,
        #[arg(value_enum)]
        funding: Funding,
    },
    /// Drop a student's recorded grade history
    ClearHistory { name: String, surname: String },
    /// Generate missing history grades for every student
    Backfill,
    /// Recalculate stipends for every student
    Recalc,
    /// Search students
    Search {
        #[command(subcommand)]
        by: SearchBy,
    },
    /// Show roster statistics
    Stats,
    /// Export the roster as CSV
    Export { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum Funding {
    Budget,
    Paid,
}

#[derive(Subcommand)]
enum SearchBy {
    /// Case-insensitive substring match on the given or full name
    Name { text: String },
    /// Case-insensitive substring match on the family name
    Surname { text: String },
    /// Average grade within an inclusive range
    Grade { min: f64, max: f64 },
    /// Average grade at least the given value
    Min { min: f64 },
    /// Average grade equal to the given value, rounded to 2 decimals
    Exact { grade: f64 },
    /// Students enrolled in the given course
    Course { course: i32 },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("bursar={level}"))),
        )
        .init();

    let config = Config::load_or_default(cli.config.as_deref())?;
    let database = cli
        .database
        .unwrap_or_else(|| config.store.database.clone());

    let mut store = StudentStore::new();
    let report = store
        .load_from_file(&database)
        .wrap_err("cannot load database")?;
    for skipped in &report.skipped {
        warn!("skipped record: {skipped}");
    }
    if report.is_partial() {
        eprintln!(
            "{} of {} records were skipped due to invalid data",
            report.skipped.len(),
            report.loaded + report.skipped.len(),
        );
    }

    let changed = run_command(cli.command, &mut store, &config)?;
    if changed && !cli.dry_run {
        store
            .save_to_file(&database)
            .wrap_err("cannot save database")?;
    }
    Ok(())
}

fn run_command(command: Command, store: &mut StudentStore, config: &Config) -> Result<bool> {
    let changed = match command {
        Command::List => {
            display::display_roster(store);
            false
        }
        Command::Show { name, surname } => {
            display::display_student(find(store, &name, &surname)?);
            false
        }
        Command::Add {
            name,
            surname,
            semester,
            grade,
            budget,
            missed,
            social,
            backfill,
        } => {
            let mut student = Student::new(&name, &surname, semester, grade, budget)?;
            student.set_missed_hours(missed);
            student.set_social_aid(social);
            if backfill {
                let mut generator = HistoryGenerator::new(
                    rand::rng(),
                    config.history.min_grade,
                    config.history.max_grade,
                );
                generator.ensure_history(&mut student);
            }
            student.recalculate_stipend();
            store.add(student)?;
            true
        }
        Command::Remove {
            name,
            surname,
            index,
        } => {
            match (name, surname, index) {
                (_, _, Some(index)) => {
                    let i = index
                        .checked_sub(1)
                        .ok_or_else(|| eyre!("roster positions start at 1"))?;
                    let student = store
                        .get(i)
                        .ok_or_else(|| eyre!("no student at position {index}"))?;
                    println!("Removing {}", student.full_name());
                    store.remove_at(i);
                }
                (Some(name), Some(surname), None) => {
                    if !store.remove(&name, &surname) {
                        return Err(eyre!("student not found: {surname} {name}"));
                    }
                }
                _ => unreachable!("clap enforces name+surname or --index"),
            }
            true
        }
        Command::Rename {
            name,
            surname,
            new_name,
            new_surname,
        } => {
            if new_name.is_empty() || new_surname.is_empty() {
                return Err(ValidationError::EmptyName.into());
            }
            if !store
                .search(|s| s.name() == new_name && s.surname() == new_surname)
                .is_empty()
            {
                return Err(
                    StoreError::Duplicate(format!("{new_surname} {new_name}")).into()
                );
            }
            let student = find_mut(store, &name, &surname)?;
            student.set_name(&new_name);
            student.set_surname(&new_surname);
            true
        }
        Command::Edit {
            name,
            surname,
            grade,
            missed,
            social,
        } => {
            if let Some(grade) = grade {
                if !(0.0..=10.0).contains(&grade) {
                    return Err(eyre!(
                        "invalid grade value: {grade} (must be between 0.0 and 10.0)"
                    ));
                }
            }
            let student = find_mut(store, &name, &surname)?;
            if let Some(grade) = grade {
                student.set_average_grade(grade);
            }
            if let Some(missed) = missed {
                student.set_missed_hours(missed);
            }
            if let Some(social) = social {
                student.set_social_aid(social);
            }
            student.recalculate_stipend();
            true
        }
        Command::Advance {
            name,
            surname,
            semester,
        } => {
            if !(1..=8).contains(&semester) {
                return Err(eyre!("invalid semester: {semester} (must be between 1 and 8)"));
            }
            let mut generator = HistoryGenerator::new(
                rand::rng(),
                config.history.min_grade,
                config.history.max_grade,
            );
            let student = find_mut(store, &name, &surname)?;
            let old_semester = student.semester();
            let old_average = student.average_grade();
            student.set_semester(semester);
            generator.handle_semester_change(student, old_semester, old_average);
            student.recalculate_stipend();
            true
        }
        Command::Funding {
            name,
            surname,
            funding,
        } => {
            let student = find_mut(store, &name, &surname)?;
            student.set_budget(matches!(funding, Funding::Budget));
            student.recalculate_stipend();
            true
        }
        Command::ClearHistory { name, surname } => {
            let student = find_mut(store, &name, &surname)?;
            student.clear_previous_grades();
            student.recalculate_stipend();
            true
        }
        Command::Backfill => {
            let mut generator = HistoryGenerator::new(
                rand::rng(),
                config.history.min_grade,
                config.history.max_grade,
            );
            generator.fill_missing_for_all(store);
            store.recalculate_all();
            true
        }
        Command::Recalc => {
            store.recalculate_all();
            true
        }
        Command::Search { by } => {
            let results = match by {
                SearchBy::Name { text } => store.search_by_name(&text),
                SearchBy::Surname { text } => store.search_by_surname(&text),
                SearchBy::Grade { min, max } => store.search_by_grade_range(min, max),
                SearchBy::Min { min } => store.search_by_min_grade(min),
                SearchBy::Exact { grade } => store.search_by_grade_exact(grade),
                SearchBy::Course { course } => store.search_by_course(course),
            };
            display::display_search_results(&results);
            false
        }
        Command::Stats => {
            display::display_stats(&stats::statistics(store));
            false
        }
        Command::Export { path } => {
            store.export_csv(&path)?;
            println!("Exported {} students to {}", store.len(), path.display());
            false
        }
    };
    Ok(changed)
}

fn find<'a>(store: &'a StudentStore, name: &str, surname: &str) -> Result<&'a Student> {
    store
        .search(|s| s.name() == name && s.surname() == surname)
        .into_iter()
        .next()
        .ok_or_else(|| eyre!("student not found: {surname} {name}"))
}

fn find_mut<'a>(store: &'a mut StudentStore, name: &str, surname: &str) -> Result<&'a mut Student> {
    store
        .find_mut(name, surname)
        .ok_or_else(|| eyre!("student not found: {surname} {name}"))
}
