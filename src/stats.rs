use crate::store::StudentStore;

#[derive(Debug, Default, PartialEq)]
pub struct RosterStats {
    pub total: usize,
    pub budget: usize,
    pub paid: usize,
    pub total_stipend: f64,
}

pub fn statistics(store: &StudentStore) -> RosterStats {
    let mut stats = RosterStats::default();
    for student in store.iter() {
        stats.total += 1;
        if student.is_budget() {
            stats.budget += 1;
        } else {
            stats.paid += 1;
        }
        stats.total_stipend += student.stipend();
    }
    stats
}
