use crate::store::{StudentStore, round2};
use crate::student::Student;
use rand::Rng;
use tracing::debug;

/// Fills in plausible grades for past semesters that have no recorded
/// history. The random source is supplied by the caller; the record and
/// store logic itself stays deterministic.
pub struct HistoryGenerator<R: Rng> {
    rng: R,
    min_grade: f64,
    max_grade: f64,
}

impl<R: Rng> HistoryGenerator<R> {
    pub fn new(rng: R, min_grade: f64, max_grade: f64) -> HistoryGenerator<R> {
        HistoryGenerator {
            rng,
            min_grade,
            max_grade,
        }
    }

    fn random_grade(&mut self) -> f64 {
        round2(self.rng.random_range(self.min_grade..=self.max_grade))
    }

    /// Ensure every semester before the student's current one has a grade.
    pub fn ensure_history(&mut self, student: &mut Student) {
        let current = student.semester();
        for sem in 1..current {
            if !student.previous_grades().contains_key(&sem) {
                let grade = self.random_grade();
                debug!(student = %student, semester = sem, grade, "generated history grade");
                student.add_previous_grade(sem, grade);
            }
        }
    }

    /// After a semester move, record the outgoing semester's average as its
    /// history grade and fill any remaining gaps.
    pub fn handle_semester_change(
        &mut self,
        student: &mut Student,
        old_semester: i32,
        old_average: f64,
    ) {
        if old_semester != student.semester() && old_semester > 0 {
            student.add_previous_grade(old_semester, old_average);
        }
        self.ensure_history(student);
    }

    pub fn fill_missing_for_all(&mut self, store: &mut StudentStore) {
        for student in store.iter_mut() {
            self.ensure_history(student);
        }
    }
}
