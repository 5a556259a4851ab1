use crate::errors::{ParseError, StoreError};
use crate::student::Student;
use chrono::Local;
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use tracing::{debug, warn};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Outcome of a load: how many records survived and why the others were
/// skipped. A non-empty `skipped` list is the partial-failure condition.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<String>,
}

impl LoadReport {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct StudentStore {
    students: Vec<Student>,
}

impl StudentStore {
    pub fn new() -> StudentStore {
        StudentStore::default()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Student> {
        self.students.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Student> {
        self.students.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Student> {
        self.students.get(index)
    }

    pub fn find_mut(&mut self, name: &str, surname: &str) -> Option<&mut Student> {
        self.students
            .iter_mut()
            .find(|s| s.name() == name && s.surname() == surname)
    }

    pub fn clear(&mut self) {
        self.students.clear();
    }

    pub fn add(&mut self, student: Student) -> Result<(), StoreError> {
        if self
            .students
            .iter()
            .any(|s| s.name() == student.name() && s.surname() == student.surname())
        {
            return Err(StoreError::Duplicate(student.full_name()));
        }
        self.students.push(student);
        Ok(())
    }

    pub fn remove(&mut self, name: &str, surname: &str) -> bool {
        let before = self.students.len();
        self.students
            .retain(|s| !(s.name() == name && s.surname() == surname));
        self.students.len() != before
    }

    pub fn remove_at(&mut self, index: usize) -> bool {
        if index < self.students.len() {
            self.students.remove(index);
            true
        } else {
            false
        }
    }

    pub fn search(&self, predicate: impl Fn(&Student) -> bool) -> Vec<&Student> {
        self.students.iter().filter(|s| predicate(s)).collect()
    }

    pub fn search_by_name(&self, text: &str) -> Vec<&Student> {
        let needle = text.to_lowercase();
        self.search(|s| {
            s.name().to_lowercase().contains(&needle)
                || s.full_name().to_lowercase().contains(&needle)
        })
    }

    pub fn search_by_surname(&self, text: &str) -> Vec<&Student> {
        let needle = text.to_lowercase();
        self.search(|s| s.surname().to_lowercase().contains(&needle))
    }

    pub fn search_by_grade_range(&self, min: f64, max: f64) -> Vec<&Student> {
        self.search(|s| s.average_grade() >= min && s.average_grade() <= max)
    }

    pub fn search_by_min_grade(&self, min: f64) -> Vec<&Student> {
        self.search(|s| s.average_grade() >= min)
    }

    pub fn search_by_grade_exact(&self, grade: f64) -> Vec<&Student> {
        let target = round2(grade);
        self.search(move |s| round2(s.average_grade()) == target)
    }

    pub fn search_by_course(&self, course: i32) -> Vec<&Student> {
        self.search(move |s| s.course() == course)
    }

    pub fn recalculate_all(&mut self) {
        for student in &mut self.students {
            student.recalculate_stipend();
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .wrap_err_with(|| format!("cannot write to file: {}", path.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "# Scholarship Management System - Student Database")?;
        writeln!(out, "# Generated: {}", Local::now().format("%Y-%m-%d"))?;
        writeln!(out, "# Total Students: {}", self.students.len())?;
        writeln!(out)?;
        for (i, s) in self.students.iter().enumerate() {
            writeln!(out, "[{}]", i + 1)?;
            writeln!(out, "Name:        {}", s.name())?;
            writeln!(out, "Surname:     {}", s.surname())?;
            writeln!(out, "Semester:    {}", s.semester())?;
            writeln!(out, "Avg Grade:   {:.2}", s.average_grade())?;
            writeln!(
                out,
                "Funding:     {}",
                if s.is_budget() { "Budget" } else { "Paid" }
            )?;
            writeln!(out, "Missed Hours: {}", s.missed_hours())?;
            writeln!(
                out,
                "Social:      {}",
                if s.has_social_aid() { "Yes" } else { "No" }
            )?;
            writeln!(out, "Previous:    {}", grade_history_line(s))?;
            if i + 1 < self.students.len() {
                writeln!(out, "\n---\n")?;
            }
        }
        writeln!(out, "\n# End of file")?;
        out.flush()?;
        debug!(path = %path.display(), students = self.students.len(), "database saved");
        Ok(())
    }

    /// Load the whole database, replacing the current contents. A missing
    /// file is not an error: the store starts empty. Record blocks that fail
    /// validation are skipped and summarized in the report; blocks without a
    /// name and surname are ignored outright so hand-edited files with stray
    /// headers still load.
    pub fn load_from_file(&mut self, path: &Path) -> Result<LoadReport> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "database file not found, starting empty");
                self.students.clear();
                return Ok(LoadReport::default());
            }
            Err(e) => {
                return Err(e)
                    .wrap_err_with(|| format!("cannot read file: {}", path.display()));
            }
        };
        self.clear();
        let mut report = LoadReport::default();
        let mut block: Option<RawRecord> = None;
        for line in text.lines() {
            if line.starts_with('[') && line.contains(']') {
                if let Some(raw) = block.take() {
                    self.flush_block(raw, &mut report);
                }
                block = Some(RawRecord::default());
                continue;
            }
            let Some(raw) = block.as_mut() else { continue };
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "Name" => raw.name = value.to_owned(),
                "Surname" => raw.surname = value.to_owned(),
                "Semester" => raw.semester = value.parse().unwrap_or(0),
                "Avg Grade" => raw.average_grade = value.parse().unwrap_or(0.0),
                "Funding" => raw.funding = value.to_owned(),
                "Missed Hours" => raw.missed_hours = value.parse().unwrap_or(0),
                "Social" => raw.social = value.to_owned(),
                "Previous" => raw.previous = value.to_owned(),
                _ => {}
            }
        }
        if let Some(raw) = block.take() {
            self.flush_block(raw, &mut report);
        }
        report.loaded = self.students.len();
        debug!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped.len(),
            "database loaded",
        );
        Ok(report)
    }

    fn flush_block(&mut self, raw: RawRecord, report: &mut LoadReport) {
        if raw.name.is_empty() || raw.surname.is_empty() {
            return;
        }
        let label = format!("{} {}", raw.surname, raw.name);
        match raw.into_student() {
            Ok(student) => self.students.push(student),
            Err(e) => report.skipped.push(format!("{label} - {e}")),
        }
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .wrap_err_with(|| format!("cannot write to file: {}", path.display()))?;
        for s in &self.students {
            writer.serialize(CsvRow {
                name: s.name(),
                surname: s.surname(),
                course: s.course(),
                semester: s.semester(),
                avg_grade: s.average_grade(),
                funding: if s.is_budget() { "Budget" } else { "Paid" },
                missed_hours: s.missed_hours(),
                social_aid: s.has_social_aid(),
                stipend: s.stipend(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    surname: &'a str,
    course: i32,
    semester: i32,
    avg_grade: f64,
    funding: &'a str,
    missed_hours: u32,
    social_aid: bool,
    stipend: f64,
}

#[derive(Debug, Default)]
struct RawRecord {
    name: String,
    surname: String,
    semester: i32,
    average_grade: f64,
    funding: String,
    missed_hours: u32,
    social: String,
    previous: String,
}

impl RawRecord {
    fn into_student(self) -> Result<Student, ParseError> {
        let mut student = Student::new(
            &self.name,
            &self.surname,
            self.semester,
            self.average_grade,
            self.funding == "Budget",
        )?;
        student.set_missed_hours(self.missed_hours);
        student.set_social_aid(self.social == "Yes");
        for token in self.previous.split(';').filter(|t| !t.is_empty()) {
            let Some((sem, grade)) = token.split_once(':') else {
                continue;
            };
            match (sem.trim().parse::<i32>(), grade.trim().parse::<f64>()) {
                (Ok(sem), Ok(grade)) => student.add_previous_grade(sem, grade),
                _ => return Err(ParseError::History(token.to_owned())),
            }
        }
        Ok(student)
    }
}

fn grade_history_line(student: &Student) -> String {
    student
        .previous_grades()
        .iter()
        .map(|(sem, grade)| format!("{sem}:{grade:.2}"))
        .collect::<Vec<_>>()
        .join(";")
}
