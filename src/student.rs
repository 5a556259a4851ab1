use crate::errors::ValidationError;
use crate::scholarship::{self, MISSED_HOURS_LIMIT, SOCIAL_SUPPLEMENT};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct Student {
    name: String,
    surname: String,
    semester: i32,
    average_grade: f64,
    is_budget: bool,
    stipend: f64,
    missed_hours: u32,
    has_social_aid: bool,
    previous_grades: BTreeMap<i32, f64>,
    previous_stipends: BTreeMap<i32, f64>,
    budget_since: Option<i32>,
}

impl Student {
    pub fn new(
        name: &str,
        surname: &str,
        semester: i32,
        average_grade: f64,
        is_budget: bool,
    ) -> Result<Student, ValidationError> {
        if name.is_empty() || surname.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !(1..=8).contains(&semester) {
            return Err(ValidationError::InvalidSemester(semester));
        }
        if !(0.0..=10.0).contains(&average_grade) {
            return Err(ValidationError::InvalidGrade(average_grade));
        }
        Ok(Student {
            name: name.to_owned(),
            surname: surname.to_owned(),
            semester,
            average_grade,
            is_budget,
            stipend: 0.0,
            missed_hours: 0,
            has_social_aid: false,
            previous_grades: BTreeMap::new(),
            previous_stipends: BTreeMap::new(),
            // A student created as budget-funded counts as funded from semester 1.
            budget_since: is_budget.then_some(1),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn surname(&self) -> &str {
        &self.surname
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname, self.name)
    }

    pub fn semester(&self) -> i32 {
        self.semester
    }

    /// Course is derived from the semester and never stored.
    pub fn course(&self) -> i32 {
        (self.semester - 1) / 2 + 1
    }

    pub fn average_grade(&self) -> f64 {
        self.average_grade
    }

    pub fn is_budget(&self) -> bool {
        self.is_budget
    }

    pub fn stipend(&self) -> f64 {
        self.stipend
    }

    pub fn missed_hours(&self) -> u32 {
        self.missed_hours
    }

    pub fn has_social_aid(&self) -> bool {
        self.has_social_aid
    }

    pub fn budget_since(&self) -> Option<i32> {
        self.budget_since
    }

    pub fn previous_grades(&self) -> &BTreeMap<i32, f64> {
        &self.previous_grades
    }

    pub fn previous_stipends(&self) -> &BTreeMap<i32, f64> {
        &self.previous_stipends
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn set_surname(&mut self, surname: &str) {
        self.surname = surname.to_owned();
    }

    pub fn set_average_grade(&mut self, average_grade: f64) {
        self.average_grade = average_grade;
    }

    pub fn set_missed_hours(&mut self, missed_hours: u32) {
        self.missed_hours = missed_hours;
    }

    pub fn set_social_aid(&mut self, has_social_aid: bool) {
        self.has_social_aid = has_social_aid;
    }

    pub fn add_previous_grade(&mut self, semester: i32, grade: f64) {
        self.previous_grades.insert(semester, grade);
    }

    pub fn clear_previous_grades(&mut self) {
        self.previous_grades.clear();
    }

    /// Recompute the current stipend and bring the stipend history up to date.
    ///
    /// History is back-filled first, before any eligibility check, so that a
    /// later funding switch cannot lose amounts earned in past semesters that
    /// were never explicitly recalculated.
    pub fn recalculate_stipend(&mut self) {
        self.backfill_stipend_history();

        self.stipend = 0.0;
        if !self.is_budget {
            return;
        }
        if !self.eligible_this_semester() {
            return;
        }

        self.compute_current_stipend();
        self.record_current_stipend();
    }

    /// Fill stipend history from recorded grades for semesters inside the
    /// funding window that have no stored amount yet. The current semester is
    /// left to `recalculate_stipend`.
    fn backfill_stipend_history(&mut self) {
        if !self.is_budget {
            return;
        }
        let Some(since) = self.budget_since else {
            return;
        };
        for (&sem, &grade) in &self.previous_grades {
            if sem < since || sem == self.semester {
                continue;
            }
            if self.previous_stipends.contains_key(&sem) {
                continue;
            }
            let mut amount = scholarship::amount_for_grade(grade);
            if self.has_social_aid {
                amount += SOCIAL_SUPPLEMENT;
            }
            if amount > 0.0 {
                self.previous_stipends.insert(sem, amount);
            }
        }
    }

    fn eligible_this_semester(&self) -> bool {
        if !self.is_budget {
            return false;
        }
        // Guard against backdated semester edits: no stipend for semesters
        // before the student became budget-funded.
        match self.budget_since {
            Some(since) => self.semester >= since,
            None => true,
        }
    }

    fn compute_current_stipend(&mut self) {
        self.stipend = if self.missed_hours >= MISSED_HOURS_LIMIT {
            if self.has_social_aid { SOCIAL_SUPPLEMENT } else { 0.0 }
        } else {
            let base = scholarship::amount_for_grade(self.average_grade);
            if self.has_social_aid {
                base + SOCIAL_SUPPLEMENT
            } else {
                base
            }
        };
    }

    fn record_current_stipend(&mut self) {
        if self.stipend > 0.0 {
            self.previous_stipends.insert(self.semester, self.stipend);
        }
    }

    /// Move the student to another semester. The outgoing semester's stipend
    /// is snapshotted into history first, so the amount survives even if the
    /// caller never recalculates before moving on. Does not recalculate; that
    /// is the caller's responsibility after a batch of edits.
    pub fn set_semester(&mut self, new_semester: i32) {
        if self.is_budget && self.stipend > 0.0 && self.semester > 0 {
            if let Some(since) = self.budget_since {
                if self.semester >= since {
                    self.previous_stipends.insert(self.semester, self.stipend);
                }
            }
        }
        self.semester = new_semester;
    }

    /// Switch between budget and paid funding.
    ///
    /// The transition is deliberately asymmetric: leaving budget funding
    /// forfeits the current semester only and keeps earlier earned history,
    /// while entering budget funding restarts the funding window at the
    /// current semester and purges anything recorded before it.
    pub fn set_budget(&mut self, is_budget: bool) {
        if self.is_budget == is_budget {
            return;
        }
        let was_budget = self.is_budget;
        self.is_budget = is_budget;

        if was_budget {
            debug!(student = %self, semester = self.semester, "switching to paid funding");
            self.stipend = 0.0;
            self.previous_stipends.remove(&self.semester);
            // budget_since is kept: earlier funded semesters stay attributable.
        } else {
            debug!(student = %self, semester = self.semester, "switching to budget funding");
            self.budget_since = Some(self.semester);
            let since = self.semester;
            self.previous_stipends.retain(|&sem, _| sem >= since);
            if self.eligible_this_semester() {
                self.compute_current_stipend();
                self.record_current_stipend();
            } else {
                self.stipend = 0.0;
            }
        }
    }

    /// Stipend attributable to the given semester: the recorded amount if one
    /// exists, otherwise recomputed from the recorded grade when the semester
    /// falls inside the funding window.
    pub fn stipend_for_semester(&self, semester: i32) -> Option<f64> {
        if let Some(&paid) = self.previous_stipends.get(&semester) {
            return Some(paid);
        }
        let since = self.budget_since?;
        if semester < since {
            return None;
        }
        let &grade = self.previous_grades.get(&semester)?;
        let mut amount = scholarship::amount_for_grade(grade);
        if self.has_social_aid {
            amount += SOCIAL_SUPPLEMENT;
        }
        (amount > 0.0).then_some(amount)
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.surname, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scholarship::{TIER_6_0_7_9, TIER_8_0_8_9, TIER_9_0_10_0};

    fn budget_student(semester: i32, grade: f64) -> Student {
        Student::new("Ana", "Ivanova", semester, grade, true).unwrap()
    }

    #[test]
    fn construction_validates() {
        assert_eq!(
            Student::new("", "Ivanova", 1, 7.0, true),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            Student::new("Ana", "", 1, 7.0, true),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            Student::new("Ana", "Ivanova", 0, 7.0, true),
            Err(ValidationError::InvalidSemester(0))
        );
        assert_eq!(
            Student::new("Ana", "Ivanova", 9, 7.0, true),
            Err(ValidationError::InvalidSemester(9))
        );
        assert_eq!(
            Student::new("Ana", "Ivanova", 1, 10.5, true),
            Err(ValidationError::InvalidGrade(10.5))
        );
        assert_eq!(
            Student::new("Ana", "Ivanova", 1, -0.1, true),
            Err(ValidationError::InvalidGrade(-0.1))
        );
    }

    #[test]
    fn course_is_derived_from_semester() {
        for (semester, course) in [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (6, 3), (7, 4), (8, 4)]
        {
            let s = budget_student(semester, 7.0);
            assert_eq!(s.course(), course);
        }
    }

    #[test]
    fn new_student_state() {
        let s = budget_student(5, 9.5);
        assert_eq!(s.stipend(), 0.0);
        assert_eq!(s.budget_since(), Some(1));
        let paid = Student::new("Ana", "Ivanova", 5, 9.5, false).unwrap();
        assert_eq!(paid.budget_since(), None);
    }

    #[test]
    fn recalculate_then_switch_to_paid() {
        let mut s = budget_student(5, 9.5);
        s.recalculate_stipend();
        assert_eq!(s.stipend(), TIER_9_0_10_0);
        assert_eq!(s.previous_stipends().get(&5), Some(&TIER_9_0_10_0));

        s.set_budget(false);
        assert_eq!(s.stipend(), 0.0);
        assert!(!s.previous_stipends().contains_key(&5));
    }

    #[test]
    fn paid_student_never_draws_a_stipend() {
        let mut s = Student::new("Ana", "Ivanova", 3, 9.8, false).unwrap();
        s.recalculate_stipend();
        assert_eq!(s.stipend(), 0.0);
        assert!(s.previous_stipends().is_empty());
    }

    #[test]
    fn missed_hours_boundary() {
        let mut s = budget_student(2, 9.0);
        s.set_missed_hours(12);
        s.recalculate_stipend();
        assert_eq!(s.stipend(), 0.0);
        assert!(s.previous_stipends().is_empty());

        s.set_social_aid(true);
        s.recalculate_stipend();
        assert_eq!(s.stipend(), SOCIAL_SUPPLEMENT);
        assert_eq!(s.previous_stipends().get(&2), Some(&SOCIAL_SUPPLEMENT));

        s.set_missed_hours(11);
        s.recalculate_stipend();
        assert_eq!(s.stipend(), TIER_9_0_10_0 + SOCIAL_SUPPLEMENT);
    }

    #[test]
    fn recalculate_is_idempotent() {
        let mut s = budget_student(4, 8.3);
        s.add_previous_grade(1, 9.1);
        s.add_previous_grade(2, 6.4);
        s.recalculate_stipend();
        let stipend = s.stipend();
        let history = s.previous_stipends().clone();
        s.recalculate_stipend();
        assert_eq!(s.stipend(), stipend);
        assert_eq!(s.previous_stipends(), &history);
    }

    #[test]
    fn backfill_covers_funding_window_only() {
        let mut s = Student::new("Pavel", "Sidorov", 6, 7.5, false).unwrap();
        s.add_previous_grade(1, 9.2);
        s.add_previous_grade(2, 7.0);
        s.add_previous_grade(3, 4.0);
        s.set_semester(4);
        s.set_budget(true);
        // Window starts at semester 4: nothing before it may be attributed.
        assert_eq!(s.budget_since(), Some(4));
        s.add_previous_grade(5, 8.1);
        s.set_semester(6);
        s.recalculate_stipend();
        assert!(!s.previous_stipends().contains_key(&1));
        assert!(!s.previous_stipends().contains_key(&2));
        assert!(!s.previous_stipends().contains_key(&3));
        assert_eq!(s.previous_stipends().get(&5), Some(&TIER_8_0_8_9));
        assert_eq!(s.previous_stipends().get(&6), Some(&TIER_6_0_7_9));
    }

    #[test]
    fn backfill_skips_semesters_below_bracket() {
        let mut s = budget_student(3, 8.0);
        s.add_previous_grade(1, 4.0);
        s.add_previous_grade(2, 6.0);
        s.recalculate_stipend();
        // No entry is stored for a semester that earned nothing.
        assert!(!s.previous_stipends().contains_key(&1));
        assert_eq!(s.previous_stipends().get(&2), Some(&TIER_6_0_7_9));
    }

    #[test]
    fn funding_transition_asymmetry() {
        let mut s = Student::new("Ana", "Petrova", 3, 8.5, true).unwrap();
        s.recalculate_stipend();
        assert_eq!(s.previous_stipends().get(&3), Some(&TIER_8_0_8_9));

        s.set_semester(4);
        s.set_average_grade(6.5);
        s.recalculate_stipend();
        assert_eq!(s.previous_stipends().get(&4), Some(&TIER_6_0_7_9));

        // Budget -> paid removes the current semester only.
        s.set_budget(false);
        assert_eq!(s.stipend(), 0.0);
        assert_eq!(s.previous_stipends().get(&3), Some(&TIER_8_0_8_9));
        assert!(!s.previous_stipends().contains_key(&4));
        assert_eq!(s.budget_since(), Some(1));

        // Paid -> budget at semester 5 restarts the window and purges
        // everything before it.
        s.set_semester(5);
        s.set_budget(true);
        assert_eq!(s.budget_since(), Some(5));
        assert!(!s.previous_stipends().contains_key(&3));
        assert_eq!(s.stipend(), TIER_6_0_7_9);
        assert_eq!(s.previous_stipends().get(&5), Some(&TIER_6_0_7_9));
    }

    #[test]
    fn set_budget_same_value_is_a_noop() {
        let mut s = budget_student(4, 9.0);
        s.recalculate_stipend();
        let before = s.clone();
        s.set_budget(true);
        assert_eq!(s.stipend(), before.stipend());
        assert_eq!(s.previous_stipends(), before.previous_stipends());
        assert_eq!(s.budget_since(), before.budget_since());
    }

    #[test]
    fn set_semester_snapshots_outgoing_stipend() {
        let mut s = budget_student(3, 9.1);
        s.recalculate_stipend();
        // Move on without recalculating: the paid amount must survive.
        s.set_semester(4);
        assert_eq!(s.previous_stipends().get(&3), Some(&TIER_9_0_10_0));
        assert_eq!(s.semester(), 4);
        assert_eq!(s.course(), 2);
    }

    #[test]
    fn backdated_semester_edit_is_ineligible() {
        let mut s = Student::new("Ivan", "Petrov", 5, 9.0, false).unwrap();
        s.set_budget(true);
        assert_eq!(s.budget_since(), Some(5));
        s.set_semester(3);
        s.recalculate_stipend();
        assert_eq!(s.stipend(), 0.0);
        assert!(!s.previous_stipends().contains_key(&3));
    }

    #[test]
    fn stipend_for_semester_lookup() {
        let mut s = budget_student(4, 8.5);
        s.add_previous_grade(2, 9.3);
        s.recalculate_stipend();
        // Recorded amounts are preferred.
        assert_eq!(s.stipend_for_semester(4), Some(TIER_8_0_8_9));
        assert_eq!(s.stipend_for_semester(2), Some(TIER_9_0_10_0));
        // No grade on record, nothing to attribute.
        assert_eq!(s.stipend_for_semester(3), None);

        let mut paid = Student::new("Ivan", "Petrov", 4, 8.5, false).unwrap();
        paid.add_previous_grade(2, 9.3);
        assert_eq!(paid.stipend_for_semester(2), None);
    }

    #[test]
    fn end_to_end_example() {
        let mut s = Student::new("Ana", "Ivanova", 5, 9.5, true).unwrap();
        s.recalculate_stipend();
        assert_eq!(s.stipend(), 251.48);
        s.set_budget(false);
        assert_eq!(s.stipend(), 0.0);
        assert!(!s.previous_stipends().contains_key(&5));
    }
}
