use crate::scholarship;
use crate::stats::RosterStats;
use crate::store::StudentStore;
use crate::student::Student;
use std::collections::BTreeSet;

pub fn display_roster(store: &StudentStore) {
    if store.is_empty() {
        println!("No students on record");
        return;
    }
    for (i, s) in store.iter().enumerate() {
        println!(
            "[{}] {} - course {}, semester {}, avg {:.2}, {}, {} missed hours, stipend {:.2}",
            i + 1,
            s.full_name(),
            s.course(),
            s.semester(),
            s.average_grade(),
            if s.is_budget() { "budget" } else { "paid" },
            s.missed_hours(),
            s.stipend(),
        );
    }
}

pub fn display_student(s: &Student) {
    println!("Student: {}", s.full_name());
    println!("Course: {}, Semester: {}", s.course(), s.semester());
    println!(
        "Average Grade: {:.2} ({})",
        s.average_grade(),
        scholarship::bracket_label(s.average_grade()),
    );
    println!(
        "Funding: {}",
        if s.is_budget() { "Budget" } else { "Paid" }
    );
    if let Some(since) = s.budget_since() {
        println!("Budget since semester: {since}");
    }
    println!("Missed Hours: {}", s.missed_hours());
    println!(
        "Social Aid: {}",
        if s.has_social_aid() { "Yes" } else { "No" }
    );
    println!("Current Stipend: {:.2}", s.stipend());
    let semesters: BTreeSet<i32> = s
        .previous_grades()
        .keys()
        .chain(s.previous_stipends().keys())
        .copied()
        .collect();
    if !semesters.is_empty() {
        println!("History:");
        for sem in semesters {
            match (s.previous_grades().get(&sem), s.stipend_for_semester(sem)) {
                (Some(grade), Some(stipend)) => {
                    println!("  - semester {sem}: grade {grade:.2}, stipend {stipend:.2}");
                }
                (Some(grade), None) => println!("  - semester {sem}: grade {grade:.2}, no stipend"),
                (None, Some(stipend)) => println!("  - semester {sem}: stipend {stipend:.2}"),
                (None, None) => {}
            }
        }
    }
}

pub fn display_search_results(results: &[&Student]) {
    if results.is_empty() {
        println!("No matching students");
        return;
    }
    println!("{} matching students:", results.len());
    for s in results {
        println!(
            "  - {} (course {}, semester {}, avg {:.2})",
            s.full_name(),
            s.course(),
            s.semester(),
            s.average_grade(),
        );
    }
}

pub fn display_stats(stats: &RosterStats) {
    println!("Total Students: {}", stats.total);
    println!("Budget Students: {}", stats.budget);
    println!("Paid Students: {}", stats.paid);
    println!("Total Stipends: {:.2} BYN", stats.total_stipend);
}
